// Run Configuration
//
// *La Configuration* (The Configuration) - model names and output locations

use anyhow::{Context, Result};
use legraphe::Model;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "lechamp.toml";

/// Reconciliation run configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Display names of the two client models
    pub models: ModelNames,

    /// Output directory and file names
    pub output: OutputConfig,
}

impl ReconcileConfig {
    /// Load configuration
    ///
    /// An explicit path must exist. Without one, `lechamp.toml` in the
    /// working directory is used when present, otherwise defaults.
    ///
    /// # Arguments
    ///
    /// * `explicit` - Path given with `--config`
    ///
    /// # Returns
    ///
    /// `Result<ReconcileConfig>` - Loaded or default configuration
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Read and parse one TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: ReconcileConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    /// Save configuration as TOML
    pub fn save(&self, path: &Path) -> Result<()> {
        let toml_string =
            toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, toml_string)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    /// Display name of a model
    pub fn model_name(&self, model: Model) -> &str {
        match model {
            Model::A => &self.models.a,
            Model::B => &self.models.b,
        }
    }
}

/// Display names of the two client models
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelNames {
    /// Model A
    pub a: String,

    /// Model B
    pub b: String,
}

impl Default for ModelNames {
    fn default() -> Self {
        Self {
            a: "zotero".to_string(),
            b: "jurism".to_string(),
        }
    }
}

/// Output locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving every output file
    pub directory: PathBuf,

    /// Mapping table JSON
    pub mapping: String,

    /// Graph in GML
    pub graph: String,

    /// Markdown documentation table
    pub docs: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            mapping: "extra-fields.json".to_string(),
            graph: "mapping.gml".to_string(),
            docs: "extra-fields.md".to_string(),
        }
    }
}

impl OutputConfig {
    /// Path of the mapping table
    pub fn mapping_path(&self) -> PathBuf {
        self.directory.join(&self.mapping)
    }

    /// Path of the GML graph
    pub fn graph_path(&self) -> PathBuf {
        self.directory.join(&self.graph)
    }

    /// Path of the markdown documentation
    pub fn docs_path(&self) -> PathBuf {
        self.directory.join(&self.docs)
    }
}
