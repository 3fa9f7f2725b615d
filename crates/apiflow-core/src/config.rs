//! Project configuration for scenario generation

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Owner id stamped into the generated collection
    #[serde(default = "default_owner")]
    pub owner: u64,

    /// Environment variable holding the server origin
    #[serde(default = "default_host_variable")]
    pub host_variable: String,

    /// Environment variable holding the base path prefix
    #[serde(default = "default_path_variable")]
    pub path_variable: String,

    /// Server-assigned body properties: appended to required-field
    /// assertions and never chosen as the update target
    #[serde(default = "default_reserved_properties")]
    pub reserved_properties: Vec<String>,

    /// Query parameters that page or project rather than filter
    #[serde(default = "default_reserved_parameters")]
    pub reserved_parameters: Vec<String>,

    /// Literals substituted when a schema carries no example
    #[serde(default)]
    pub defaults: Defaults,
}

/// Fallback literals for synthesis and the update step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defaults {
    /// Plain string fallback
    #[serde(default = "default_string")]
    pub string: String,

    /// Number fallback
    #[serde(default = "default_number")]
    pub number: i64,

    /// Fixed `date-time` fallback (a constant keeps output reproducible)
    #[serde(default = "default_date_time")]
    pub date_time: String,

    /// Replacement value written by the PUT step
    #[serde(default = "default_update_string")]
    pub update_string: String,
}

fn default_owner() -> u64 {
    231_421
}

fn default_host_variable() -> String {
    "host".to_string()
}

fn default_path_variable() -> String {
    "path".to_string()
}

fn default_reserved_properties() -> Vec<String> {
    vec!["id".to_string(), "href".to_string()]
}

fn default_reserved_parameters() -> Vec<String> {
    vec![
        "fields".to_string(),
        "offset".to_string(),
        "limit".to_string(),
        "skip".to_string(),
    ]
}

fn default_string() -> String {
    "Hello World".to_string()
}

fn default_number() -> i64 {
    42
}

fn default_date_time() -> String {
    "1973-10-10T09:10:00Z".to_string()
}

fn default_update_string() -> String {
    "Hello".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            host_variable: default_host_variable(),
            path_variable: default_path_variable(),
            reserved_properties: default_reserved_properties(),
            reserved_parameters: default_reserved_parameters(),
            defaults: Defaults::default(),
        }
    }
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            string: default_string(),
            number: default_number(),
            date_time: default_date_time(),
            update_string: default_update_string(),
        }
    }
}

impl Config {
    /// Load config from file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))?;

        if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        }
    }

    /// Load from default location (.apiflow.toml)
    pub fn load_default() -> Result<Self, ConfigError> {
        let candidates = [".apiflow.toml", ".apiflow.json", "apiflow.toml"];

        for name in candidates {
            let path = Path::new(name);
            if path.exists() {
                return Self::load(path);
            }
        }

        // No config file, return default
        Ok(Self::default())
    }

    /// URL template prefix, e.g. `{{host}}{{path}}`.
    #[must_use]
    pub fn url_prefix(&self) -> String {
        format!("{{{{{}}}}}{{{{{}}}}}", self.host_variable, self.path_variable)
    }

    #[must_use]
    pub fn is_reserved_property(&self, name: &str) -> bool {
        self.reserved_properties.iter().any(|p| p == name)
    }

    #[must_use]
    pub fn is_reserved_parameter(&self, name: &str) -> bool {
        self.reserved_parameters.iter().any(|p| p == name)
    }

    /// Create example config file
    pub fn example() -> &'static str {
        r#"# apiflow configuration

# Owner id stamped into the generated collection
owner = 231421

# Environment variable names used in URL templates and location checks
host_variable = "host"
path_variable = "path"

# Server-assigned properties (appended to required-field assertions,
# never chosen as the PUT replacement target)
reserved_properties = ["id", "href"]

# Query parameters that page or project rather than filter
reserved_parameters = ["fields", "offset", "limit", "skip"]

# Fallback literals for schemas without examples
[defaults]
string = "Hello World"
number = 42
date_time = "1973-10-10T09:10:00Z"
update_string = "Hello"
"#
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {0}: {1}")]
    Io(PathBuf, String),
    #[error("Parse error: {0}")]
    Parse(String),
}
