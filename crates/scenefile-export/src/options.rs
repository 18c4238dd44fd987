//! Export options
//!
//! Options can be built in code, read from a YAML file, or both: every field
//! has a default, so a config file only needs the keys it changes.

use std::path::{Path, PathBuf};

use scenefile_core::{Error, Result, ResultExt};
use serde::{Deserialize, Serialize};

/// What to do when the output directory already exists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverwritePolicy {
    /// Refuse to export into any existing path
    #[default]
    Fail,
    /// Remove the existing directory, then export
    Replace,
}

/// IBL baking options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IblOptions {
    /// Run the baking tools after the sky is copied
    pub enabled: bool,

    /// Diffuse irradiance tool (name on PATH or a path)
    pub diffuse_tool: PathBuf,

    /// Specular prefilter tool (name on PATH or a path)
    pub specular_tool: PathBuf,

    /// Working directory for the duration of the export
    pub tool_dir: Option<PathBuf>,
}

impl Default for IblOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            diffuse_tool: PathBuf::from("IBL-Diffuse"),
            specular_tool: PathBuf::from("IBL-Specular"),
            tool_dir: None,
        }
    }
}

/// Scenefile export options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Collection whose objects are exported
    pub collection: String,

    /// World the sky is read from
    pub world: String,

    pub overwrite: OverwritePolicy,

    pub ibl: IblOptions,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            collection: "Scene".to_string(),
            world: "World".to_string(),
            overwrite: OverwritePolicy::Fail,
            ibl: IblOptions::default(),
        }
    }
}

impl ExportOptions {
    /// Parse options from YAML text
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| Error::InvalidConfig {
            message: e.to_string(),
        })
    }

    /// Load options from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(Error::from)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_yaml_str(&yaml).with_context(|| format!("config {}", path.display()))
    }
}
