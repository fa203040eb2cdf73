//! Configuration management for the schema engine
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (xforms.toml)
//! - Environment variables (XFORMS_*)
//!
//! ## Example config file (xforms.toml):
//! ```toml
//! [registry]
//! path = "./xform-registry"
//! default_author = "Eric Theiss"
//!
//! [validation]
//! require_meta = true
//! fail_on_warnings = false
//!
//! [output]
//! format = "pretty"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the schema engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct XformConfig {
    /// Registry settings
    #[serde(default)]
    pub registry: RegistrySettings,

    /// Validation settings
    #[serde(default)]
    pub validation: ValidationSettings,

    /// Output settings
    #[serde(default)]
    pub output: OutputSettings,
}

/// Registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrySettings {
    /// Path to the registry root
    #[serde(default = "default_registry_path")]
    pub path: PathBuf,

    /// Default author recorded on registrations
    #[serde(default)]
    pub default_author: Option<String>,
}

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationSettings {
    /// Audit the meta block during validation
    #[serde(default = "default_true")]
    pub require_meta: bool,

    /// Treat validation warnings as failures
    #[serde(default)]
    pub fail_on_warnings: bool,
}

/// Output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    /// JSON output format (pretty or compact)
    #[serde(default)]
    pub format: OutputFormat,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

fn default_registry_path() -> PathBuf {
    PathBuf::from("./xform-registry")
}

fn default_true() -> bool {
    true
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            path: default_registry_path(),
            default_author: None,
        }
    }
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            require_meta: true,
            fail_on_warnings: false,
        }
    }
}

impl XformConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from a specific file
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["xforms.toml", ".xforms.toml", "config/xforms.toml"];
        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "familiar", "xforms") {
            let xdg_config = config_dir.config_dir().join("xforms.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Environment variables (XFORMS_*)
        builder = builder.add_source(
            Environment::with_prefix("XFORMS")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Get the registry path (resolves relative paths)
    pub fn registry_path(&self) -> PathBuf {
        if self.registry.path.is_absolute() {
            self.registry.path.clone()
        } else {
            std::env::current_dir()
                .unwrap_or_default()
                .join(&self.registry.path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = XformConfig::default();
        assert!(config.validation.require_meta);
        assert!(!config.validation.fail_on_warnings);
        assert_eq!(config.output.format, OutputFormat::Pretty);
    }

    #[test]
    fn test_serialize_config() {
        let config = XformConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[registry]"));
        assert!(toml_str.contains("[validation]"));
        assert!(toml_str.contains("[output]"));
    }
}
