//! Configuration management
//!
//! Settings are layered, later sources overriding earlier ones:
//! the user config file (`<config dir>/washqc/config.yaml`), `.wqc.yaml` in
//! the working directory, then `WQC_*` environment variables.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::core::assets::DEFAULT_JPEG_SCAN_LIMIT;
use crate::core::fraction::DEFAULT_DENOMINATOR;
use crate::core::store::DEFAULT_LIST_LIMIT;
use crate::core::wash::DEFAULT_MATCH_WINDOW_SECS;
use crate::core::DisplayOptions;

/// Name of the per-directory config file
pub const LOCAL_CONFIG_FILE: &str = ".wqc.yaml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Base URL that relative image paths are joined to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fraction_denominator: Option<u32>,

    /// Seconds within which two records with equal quantity are the same record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_window_secs: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_change_threshold: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub jpeg_scan_limit: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_limit: Option<usize>,

    /// Output format used when `--format` is not given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_format: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl Config {
    /// Load the layered configuration; unreadable files are skipped with a warning
    pub fn load() -> Self {
        let mut config = Config::default();

        if let Some(path) = Self::user_config_path() {
            config.merge_file(&path);
        }
        config.merge_file(Path::new(LOCAL_CONFIG_FILE));
        config.merge_env(|key| std::env::var(key).ok());

        config
    }

    /// `<config dir>/washqc/config.yaml`
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "washqc").map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    fn merge_file(&mut self, path: &Path) {
        if !path.exists() {
            return;
        }
        match Self::load_file(path) {
            Ok(other) => {
                tracing::debug!(path = %path.display(), "loaded config");
                self.merge(other);
            }
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "ignoring invalid config file"),
        }
    }

    /// Parse a single config file
    pub fn load_file(path: &Path) -> Result<Self, crate::yaml::YamlError> {
        crate::yaml::parse_yaml_file(path)
    }

    /// Overlay every value set in `other`
    pub fn merge(&mut self, other: Config) {
        macro_rules! overlay {
            ($($field:ident),*) => {
                $(if other.$field.is_some() { self.$field = other.$field; })*
            };
        }
        overlay!(
            api_base_url,
            fraction_denominator,
            match_window_secs,
            no_change_threshold,
            jpeg_scan_limit,
            list_limit,
            default_format,
            log_level
        );
    }

    /// Overlay `WQC_*` variables; values that do not parse are ignored
    pub fn merge_env<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed<T: std::str::FromStr>(key: &str, raw: Option<String>) -> Option<T> {
            let raw = raw?;
            match raw.trim().parse() {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!(key, value = %raw, "ignoring unparseable environment value");
                    None
                }
            }
        }

        let env = Config {
            api_base_url: var("WQC_API_BASE_URL"),
            fraction_denominator: parsed("WQC_FRACTION_DENOMINATOR", var("WQC_FRACTION_DENOMINATOR")),
            match_window_secs: parsed("WQC_MATCH_WINDOW_SECS", var("WQC_MATCH_WINDOW_SECS")),
            no_change_threshold: parsed("WQC_NO_CHANGE_THRESHOLD", var("WQC_NO_CHANGE_THRESHOLD")),
            jpeg_scan_limit: parsed("WQC_JPEG_SCAN_LIMIT", var("WQC_JPEG_SCAN_LIMIT")),
            list_limit: parsed("WQC_LIST_LIMIT", var("WQC_LIST_LIMIT")),
            default_format: var("WQC_FORMAT"),
            log_level: None,
        };
        self.merge(env);
    }

    pub fn api_base_url(&self) -> String {
        self.api_base_url.clone().unwrap_or_default()
    }

    /// Display denominator; non-positive values fall back to sixteenths
    pub fn fraction_denominator(&self) -> u32 {
        self.fraction_denominator
            .filter(|d| *d > 0)
            .unwrap_or(DEFAULT_DENOMINATOR)
    }

    pub fn match_window_secs(&self) -> i64 {
        self.match_window_secs
            .filter(|s| *s >= 0)
            .unwrap_or(DEFAULT_MATCH_WINDOW_SECS)
    }

    pub fn no_change_threshold(&self) -> f64 {
        self.no_change_threshold
            .filter(|t| t.is_finite() && *t >= 0.0)
            .unwrap_or(DisplayOptions::default().no_change_threshold)
    }

    pub fn jpeg_scan_limit(&self) -> usize {
        self.jpeg_scan_limit.unwrap_or(DEFAULT_JPEG_SCAN_LIMIT)
    }

    pub fn list_limit(&self) -> usize {
        self.list_limit.unwrap_or(DEFAULT_LIST_LIMIT)
    }

    pub fn log_level(&self) -> String {
        self.log_level.clone().unwrap_or_else(|| "warn".to_string())
    }

    pub fn display_options(&self) -> DisplayOptions {
        DisplayOptions {
            denominator: self.fraction_denominator(),
            no_change_threshold: self.no_change_threshold(),
        }
    }

    /// Every setting with defaults filled in
    pub fn effective(&self) -> Config {
        Config {
            api_base_url: Some(self.api_base_url()),
            fraction_denominator: Some(self.fraction_denominator()),
            match_window_secs: Some(self.match_window_secs()),
            no_change_threshold: Some(self.no_change_threshold()),
            jpeg_scan_limit: Some(self.jpeg_scan_limit()),
            list_limit: Some(self.list_limit()),
            default_format: Some(self.default_format.clone().unwrap_or_else(|| "auto".to_string())),
            log_level: Some(self.log_level()),
        }
    }
}
