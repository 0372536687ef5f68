//! Config file parsing

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::yaml::diagnostics::{YamlError, YamlSyntaxError};

/// True when the document holds nothing but blank lines and comments
fn is_blank(content: &str) -> bool {
    content
        .lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with('#') || line == "---")
}

/// Parse config YAML; an empty or comment-only document yields the default
pub fn parse_yaml<T: DeserializeOwned + Default + 'static>(
    content: &str,
    filename: &str,
) -> Result<T, YamlError> {
    if is_blank(content) {
        return Ok(T::default());
    }
    serde_yml::from_str(content)
        .map_err(|e| YamlError::Syntax(YamlSyntaxError::from_serde_error(&e, content, filename)))
}

/// Read and parse a config file, labelling errors with its path
pub fn parse_yaml_file<T: DeserializeOwned + Default + 'static>(path: &Path) -> Result<T, YamlError> {
    let content = std::fs::read_to_string(path)?;
    parse_yaml(&content, &path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Settings {
        api_base_url: Option<String>,
        fraction_denominator: Option<u32>,
    }

    #[test]
    fn test_parse_valid_yaml() {
        let yaml = "api_base_url: https://qc.example.com\nfraction_denominator: 8";
        let result: Settings = parse_yaml(yaml, "config.yaml").unwrap();
        assert_eq!(result.api_base_url.as_deref(), Some("https://qc.example.com"));
        assert_eq!(result.fraction_denominator, Some(8));
    }

    #[test]
    fn test_comment_only_file_is_default() {
        let yaml = "# wqc settings\n\n---\n   # nothing set yet\n";
        let result: Settings = parse_yaml(yaml, "config.yaml").unwrap();
        assert_eq!(result, Settings::default());
    }

    #[test]
    fn test_parse_invalid_yaml_returns_error() {
        let yaml = "api_base_url: x\nfraction_denominator: sixteen";
        let result: Result<Settings, _> = parse_yaml(yaml, "config.yaml");
        match result {
            Err(YamlError::Syntax(e)) => assert_eq!(e.filename, "config.yaml"),
            other => panic!("expected syntax error, got {:?}", other),
        }
    }
}
