//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality
//! - Produce a `DispatchConfig`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("dispatch.toml")).unwrap();
//! println!("Queue: {}", config.queue.name);
//! ```

mod parser;
mod validator;

pub use contracts::DispatchConfig;
pub use parser::ConfigFormat;

use contracts::StoreError;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<DispatchConfig, StoreError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<DispatchConfig, StoreError> {
        Self::parse_and_validate(content, format)
    }

    /// Re-check a configuration that was changed after loading
    ///
    /// Runs the same rules as `load_from_path`, e.g. after command-line
    /// overrides were applied.
    pub fn validate(config: &DispatchConfig) -> Result<(), StoreError> {
        validator::validate(config)
    }

    /// Serialize DispatchConfig to TOML string
    pub fn to_toml(config: &DispatchConfig) -> Result<String, StoreError> {
        toml::to_string_pretty(config)
            .map_err(|e| StoreError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize DispatchConfig to JSON string
    pub fn to_json(config: &DispatchConfig) -> Result<String, StoreError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| StoreError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, StoreError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            StoreError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext)
            .ok_or_else(|| StoreError::config_parse(format!("unsupported config format: .{ext}")))
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, StoreError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse and validate configuration content
    fn parse_and_validate(
        content: &str,
        format: ConfigFormat,
    ) -> Result<DispatchConfig, StoreError> {
        let config = parser::parse(content, format)?;
        validator::validate(&config)?;
        Ok(config)
    }
}
