//! Configuration file handling

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use super::de;
use super::paths::config_path;
use super::{Error, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Default variables merged into every test run
    ///
    /// Values declared by a test (or its `Import` file) take precedence.
    #[serde(default, deserialize_with = "de::string_map")]
    pub vars: BTreeMap<String, String>,

    /// Report output settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// HTTP client settings
#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    /// User-Agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Headers applied to every request before the stage's own headers
    #[serde(default, deserialize_with = "de::string_map")]
    pub headers: BTreeMap<String, String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            headers: BTreeMap::new(),
        }
    }
}

fn default_user_agent() -> String {
    format!("imperius/{}", env!("CARGO_PKG_VERSION"))
}

/// Report output settings
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// Colourise the report
    #[serde(default = "default_color")]
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            color: default_color(),
        }
    }
}

fn default_color() -> bool {
    true
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = config_path() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from an explicit path, which must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))
    }
}
