//! YAML loading for config files
//!
//! Syntax errors carry the offending file and a labelled span so miette can
//! point at the bad line.

pub mod diagnostics;
pub mod parser;

pub use diagnostics::{YamlError, YamlSyntaxError};
pub use parser::parse_yaml_file;
