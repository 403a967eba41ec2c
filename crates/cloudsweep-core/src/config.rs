//! Configuration structures for cloudsweep

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Region used for global-scope checks and for region discovery
pub const DEFAULT_ANCHOR_REGION: &str = "us-east-1";

/// Worker pool size used within a single account's scan
pub const DEFAULT_MAX_WORKERS: usize = 30;

/// Main configuration for cloudsweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Tab-separated credential file, one account per line
    #[serde(default = "default_credentials_file")]
    pub credentials_file: PathBuf,

    /// Region that anchors global checks
    #[serde(default = "default_anchor_region")]
    pub anchor_region: String,

    /// Maximum concurrent scan tasks per account
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Per-call operation timeout enforced by the provider client
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,

    /// Check names to leave out of the scan
    #[serde(default)]
    pub skip_checks: Vec<String>,

    /// Output format (text, json)
    #[serde(default = "default_output_format")]
    pub output_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            credentials_file: default_credentials_file(),
            anchor_region: default_anchor_region(),
            max_workers: default_max_workers(),
            call_timeout_secs: default_call_timeout_secs(),
            skip_checks: Vec::new(),
            output_format: default_output_format(),
        }
    }
}

fn default_credentials_file() -> PathBuf {
    PathBuf::from("accesskey.txt")
}

fn default_anchor_region() -> String {
    DEFAULT_ANCHOR_REGION.to_string()
}

fn default_max_workers() -> usize {
    DEFAULT_MAX_WORKERS
}

fn default_call_timeout_secs() -> u64 {
    60
}

fn default_output_format() -> String {
    "text".to_string()
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;

        let config: Self = if path.extension().map(|e| e == "json").unwrap_or(false) {
            serde_json::from_str(&content).map_err(|e| crate::error::CloudsweepError::Parse {
                context: path.display().to_string(),
                message: e.to_string(),
            })?
        } else {
            // Assume YAML for other extensions
            serde_yaml::from_str(&content).map_err(|e| crate::error::CloudsweepError::Parse {
                context: path.display().to_string(),
                message: e.to_string(),
            })?
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject values the scan cannot run with
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.max_workers == 0 {
            return Err(crate::error::CloudsweepError::Config(
                "max_workers must be at least 1".to_string(),
            ));
        }
        if self.anchor_region.trim().is_empty() {
            return Err(crate::error::CloudsweepError::Config(
                "anchor_region must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Render the configuration as YAML
    pub fn to_yaml(&self) -> crate::error::Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| crate::error::CloudsweepError::Serialization(e.to_string()))
    }
}
