//! Tabular output for list-style commands
//!
//! Rows are built once and rendered as a bordered table, CSV or TSV.

use chrono::{DateTime, Utc};
use console::style;
use miette::{IntoDiagnostic, Result};
use tabled::{builder::Builder, settings::Style};

use crate::cli::OutputFormat;

/// A column: key used by rows, header shown to users
#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub key: &'static str,
    pub header: &'static str,
}

impl ColumnDef {
    pub const fn new(key: &'static str, header: &'static str) -> Self {
        Self { key, header }
    }
}

/// Typed cell content
#[derive(Debug, Clone)]
pub enum CellValue {
    Text(String),
    Int(Option<i64>),
    Decimal(Option<f64>),
    Percent(Option<f64>),
    Date(Option<DateTime<Utc>>),
    /// pass/fail, colored in tables
    Pass(Option<bool>),
}

impl CellValue {
    fn plain(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Int(Some(n)) => n.to_string(),
            CellValue::Decimal(Some(d)) => format!("{}", (d * 10_000.0).round() / 10_000.0),
            CellValue::Percent(Some(p)) => format!("{:.2}%", p),
            CellValue::Date(Some(d)) => d.format("%Y-%m-%d %H:%M").to_string(),
            CellValue::Pass(Some(true)) => "pass".to_string(),
            CellValue::Pass(Some(false)) => "fail".to_string(),
            CellValue::Int(None)
            | CellValue::Decimal(None)
            | CellValue::Percent(None)
            | CellValue::Date(None)
            | CellValue::Pass(None) => "-".to_string(),
        }
    }

    fn styled(&self) -> String {
        match self {
            CellValue::Pass(Some(true)) => style("pass").green().to_string(),
            CellValue::Pass(Some(false)) => style("fail").red().to_string(),
            other => other.plain(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

/// One output row keyed by column
#[derive(Debug, Clone, Default)]
pub struct TableRow {
    cells: Vec<(&'static str, CellValue)>,
}

impl TableRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cell(mut self, key: &'static str, value: impl Into<CellValue>) -> Self {
        self.cells.push((key, value.into()));
        self
    }

    fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Int(Some(n))
    }
}

impl From<usize> for CellValue {
    fn from(n: usize) -> Self {
        CellValue::Int(Some(n as i64))
    }
}

pub struct TableFormatter {
    columns: &'static [ColumnDef],
    noun: &'static str,
    show_summary: bool,
}

impl TableFormatter {
    pub fn new(columns: &'static [ColumnDef], noun: &'static str) -> Self {
        Self {
            columns,
            noun,
            show_summary: true,
        }
    }

    pub fn without_summary(mut self) -> Self {
        self.show_summary = false;
        self
    }

    fn cells(&self, row: &TableRow, styled: bool) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| match row.get(c.key) {
                Some(v) if styled => v.styled(),
                Some(v) => v.plain(),
                None => String::new(),
            })
            .collect()
    }

    /// Render rows to a string in the given format
    pub fn render(&self, rows: &[TableRow], format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Csv | OutputFormat::Tsv => {
                let delimiter = if format == OutputFormat::Csv { b',' } else { b'\t' };
                let mut writer = csv::WriterBuilder::new()
                    .delimiter(delimiter)
                    .from_writer(Vec::new());
                writer
                    .write_record(self.columns.iter().map(|c| c.key))
                    .into_diagnostic()?;
                for row in rows {
                    writer.write_record(self.cells(row, false)).into_diagnostic()?;
                }
                let bytes = writer.into_inner().into_diagnostic()?;
                String::from_utf8(bytes).into_diagnostic()
            }
            _ => {
                let mut builder = Builder::default();
                builder.push_record(self.columns.iter().map(|c| c.header.to_string()));
                for row in rows {
                    builder.push_record(self.cells(row, true));
                }
                let mut table = builder.build();
                table.with(Style::rounded());
                Ok(table.to_string())
            }
        }
    }

    /// Print rows; an empty list prints a notice instead
    pub fn output(&self, rows: Vec<TableRow>, format: OutputFormat) -> Result<()> {
        if rows.is_empty() {
            if matches!(format, OutputFormat::Table) {
                println!("No {}s found.", self.noun);
            }
            return Ok(());
        }
        let rendered = self.render(&rows, format)?;
        if format == OutputFormat::Table {
            println!("{}", rendered);
            if self.show_summary {
                println!();
                println!("{} {}(s)", style(rows.len()).cyan(), self.noun);
            }
        } else {
            print!("{}", rendered);
        }
        Ok(())
    }
}
