//! CLI command implementations

pub mod checks;
pub mod config;
pub mod scan;

use anyhow::Context;
use cloudsweep_core::{Config, OutputFormat};
use std::path::Path;

/// Load the config file if one was given, else the defaults
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(Config::default()),
    }
}

/// The `--format` flag, falling back to the configured format
pub fn resolve_format(flag: Option<&str>, config: &Config) -> anyhow::Result<OutputFormat> {
    flag.unwrap_or(config.output_format.as_str())
        .parse()
        .map_err(anyhow::Error::msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_format_flag_overrides_config() {
        let config = Config {
            output_format: "json".to_string(),
            ..Config::default()
        };
        assert_eq!(resolve_format(None, &config).unwrap(), OutputFormat::Json);
        assert_eq!(resolve_format(Some("text"), &config).unwrap(), OutputFormat::Text);
        assert!(resolve_format(Some("csv"), &config).is_err());
    }

    #[test]
    fn test_load_config_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(file, r#"{{"anchor_region": "eu-west-1", "max_workers": 4}}"#).unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.anchor_region, "eu-west-1");
        assert_eq!(config.max_workers, 4);
        assert_eq!(load_config(None).unwrap(), Config::default());
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "max_workers: 0").unwrap();

        let err = load_config(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("failed to load config"));
    }
}
