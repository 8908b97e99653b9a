//! Engine configuration via `versionless.toml`
//!
//! A default file can be written next to the application with
//! [`EngineConfig::write_default_if_missing`]. Every field is optional; an
//! empty file yields the defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;
use versionless_core::{Error, Result};

use super::retry::RetryConfig;

/// Config file name.
pub const CONFIG_FILE_NAME: &str = "versionless.toml";

/// How registered schemas are enforced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaValidation {
    /// Rows and mutations of registered entities are validated before
    /// storage is touched
    Strict,
    /// Schemas are only used to fill defaults on persist
    Off,
}

/// Engine configuration loaded from `versionless.toml`.
///
/// # Example
///
/// ```toml
/// show_writes = true
/// schema_validation = "strict"
///
/// [retry]
/// max_retries = 5
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Log every applied write at info level.
    #[serde(default)]
    pub show_writes: bool,
    /// Schema validation mode: `"strict"` or `"off"`.
    #[serde(default = "default_schema_validation_str")]
    pub schema_validation: String,
    /// Defaults for `Database::transaction_with_retry`.
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_schema_validation_str() -> String {
    "strict".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            show_writes: false,
            schema_validation: default_schema_validation_str(),
            retry: RetryConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse the schema validation string.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the string is not `"strict"` or `"off"`.
    pub fn schema_validation_mode(&self) -> Result<SchemaValidation> {
        match self.schema_validation.as_str() {
            "strict" => Ok(SchemaValidation::Strict),
            "off" => Ok(SchemaValidation::Off),
            other => Err(Error::config(format!(
                "Invalid schema_validation '{}'. Expected \"strict\" or \"off\".",
                other
            ))),
        }
    }

    /// Check every value that is not enforced by the TOML types.
    pub fn validate(&self) -> Result<()> {
        self.schema_validation_mode()?;
        self.retry.validate()
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Versionless engine configuration
#
# Log every applied write at info level (default: false)
show_writes = false

# Schema validation: "strict" (default) or "off"
#   "strict" = rows and mutations of registered entities are checked before storage
#   "off"    = schemas only supply defaults when persisting
schema_validation = "strict"

# Defaults for the caller-side retry helper.
# The engine never retries on its own.
[retry]
max_retries = 3
base_delay_ms = 10
max_delay_ms = 100
"#
    }

    /// Parse and validate config from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content)
            .map_err(|e| Error::config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            Error::Config(message) => {
                Error::config(format!("{} (in '{}')", message, path.display()))
            }
            other => other,
        })
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::config(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
