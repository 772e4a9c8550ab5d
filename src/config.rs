//! Configuration management for proto generation
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (protogen.toml)
//! - Environment variables (PROTOGEN__*)
//!
//! ## Example config file (protogen.toml):
//! ```toml
//! [generator]
//! compress_paths = true
//! base_package_name = "openconfig"
//! enum_package_name = "enums"
//! base_import_path = "github.com/example/protos"
//! tag_ledger = "proto/tags.json"
//!
//! [sources]
//! yang_files = ["openconfig-interfaces.yang"]
//! include_paths = ["third_party/yang"]
//!
//! [output]
//! dir = "proto"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::codegen::config::GeneratorConfig;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProtogenConfig {
    /// Settings consumed by the generator itself
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Provenance recorded in generated headers
    #[serde(default)]
    pub sources: SourceConfig,

    /// Where generated files are written
    #[serde(default)]
    pub output: OutputConfig,
}

/// Source provenance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Input YANG modules
    #[serde(default)]
    pub yang_files: Vec<String>,

    /// Directories searched for YANG imports
    #[serde(default)]
    pub include_paths: Vec<String>,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory generated files are written below
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

// Default value functions
fn default_output_dir() -> PathBuf {
    PathBuf::from("proto")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

impl ProtogenConfig {
    /// Load configuration, layering an explicit file over the defaults
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = [
            "protogen.toml",
            ".protogen.toml",
            "config/protogen.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "familiar", "yang-protogen") {
            let xdg_config = config_dir.config_dir().join("protogen.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // PROTOGEN__GENERATOR__COMPRESS_PATHS=true etc.
        builder = builder.add_source(
            Environment::with_prefix("PROTOGEN")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        std::fs::write(path, self.to_toml()?)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> std::io::Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}
