//! Configuration management for shapegen
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (shapegen.toml)
//! - Environment variables (SHAPEGEN__*)
//!
//! ## Example config file (shapegen.toml):
//! ```toml
//! [generator]
//! runtime_crate = "shapegen_runtime"
//! declaration_style = "class"
//! discriminator_property = "type"
//! identifier_strategy = "blank"
//! mint_namespace = "urn:example:"
//! features = ["equals", "hash", "json", "rdf", "sparql"]
//!
//! [output]
//! header = true
//! checksums = true
//!
//! [parallelism]
//! threads = 4
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::model::{DeclarationStyle, Feature, IdentityStrategy};

/// Main configuration for the generator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShapegenConfig {
    /// Code generation settings
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Rendered module settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Worker pool settings
    #[serde(default)]
    pub parallelism: ParallelismConfig,
}

/// Code generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Path generated code uses to reach the runtime crate
    #[serde(default = "default_runtime_crate")]
    pub runtime_crate: String,

    /// Declaration style for shapes that do not choose one
    #[serde(default)]
    pub declaration_style: DeclarationStyle,

    /// Discriminator property name for shapes that do not choose one
    #[serde(default = "default_discriminator_property")]
    pub discriminator_property: String,

    /// Identifier strategy for shapes that do not choose one
    #[serde(default)]
    pub identifier_strategy: IdentityStrategy,

    /// Namespace for minted IRIs
    #[serde(default)]
    pub mint_namespace: Option<String>,

    /// Generated routines, unless a shape narrows them
    #[serde(default = "default_features")]
    pub features: BTreeSet<Feature>,
}

/// Rendered module settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Emit the "generated, do not edit" header
    #[serde(default = "default_true")]
    pub header: bool,

    /// Emit a checksum comment per generated unit
    #[serde(default = "default_true")]
    pub checksums: bool,
}

/// Worker pool settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParallelismConfig {
    /// Worker threads for per-type generation (0 = one per core)
    #[serde(default)]
    pub threads: usize,
}

// Default value functions
fn default_runtime_crate() -> String {
    "shapegen_runtime".to_string()
}

fn default_discriminator_property() -> String {
    "type".to_string()
}

fn default_features() -> BTreeSet<Feature> {
    Feature::ALL.iter().copied().collect()
}

fn default_true() -> bool {
    true
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            runtime_crate: default_runtime_crate(),
            declaration_style: DeclarationStyle::default(),
            discriminator_property: default_discriminator_property(),
            identifier_strategy: IdentityStrategy::default(),
            mint_namespace: None,
            features: default_features(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            header: true,
            checksums: true,
        }
    }
}

impl ShapegenConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from a specific file
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // Load from default locations
        let config_locations = ["shapegen.toml", ".shapegen.toml", "config/shapegen.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "shapegen", "shapegen") {
            let xdg_config = config_dir.config_dir().join("shapegen.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        // Load from specified path
        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Load from environment variables (SHAPEGEN__*)
        builder = builder.add_source(
            Environment::with_prefix("SHAPEGEN")
                .prefix_separator("__")
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

    pub fn has_feature(&self, feature: Feature) -> bool {
        self.generator.features.contains(&feature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ShapegenConfig::default();
        assert_eq!(config.generator.discriminator_property, "type");
        assert_eq!(config.generator.identifier_strategy, IdentityStrategy::BlankDefault);
        assert!(config.has_feature(Feature::Sparql));
        assert!(config.output.checksums);
    }

    #[test]
    fn test_serialize_config() {
        let config = ShapegenConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[generator]"));
        assert!(toml_str.contains("[output]"));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[generator]\ndeclaration_style = \"record\"\nmint_namespace = \"urn:test:\"\nfeatures = [\"equals\", \"rdf\"]\n",
        )
        .unwrap();

        let config = ShapegenConfig::load_from(path.to_str()).unwrap();
        assert_eq!(config.generator.declaration_style, DeclarationStyle::Record);
        assert_eq!(config.generator.mint_namespace.as_deref(), Some("urn:test:"));
        assert!(config.has_feature(Feature::Rdf));
        assert!(!config.has_feature(Feature::Json));
    }
}
