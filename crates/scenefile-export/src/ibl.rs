//! Image-based lighting bake
//!
//! Each tool is invoked as `<tool> <sky.exr> <intensity> <output dir>` and
//! must exit successfully.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use scenefile_core::{Error, Result, ResultExt};
use tracing::{debug, info};

use crate::format::Num;
use crate::options::IblOptions;

pub const GLOBAL_IBL_DIR: &str = "GlobalIBL";

/// Precomputed lighting term
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IblKind {
    Diffuse,
    Specular,
}

impl IblKind {
    pub const ALL: [IblKind; 2] = [IblKind::Diffuse, IblKind::Specular];

    pub fn dir_name(&self) -> &'static str {
        match self {
            IblKind::Diffuse => "Diffuse",
            IblKind::Specular => "Specular",
        }
    }

    /// Output directory for this term under an export root
    pub fn output_dir(&self, export_dir: &Path) -> PathBuf {
        export_dir.join(GLOBAL_IBL_DIR).join(self.dir_name())
    }
}

impl fmt::Display for IblKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Runs the IBL tools configured in [`IblOptions`]
#[derive(Debug, Clone)]
pub struct IblBaker {
    options: IblOptions,
}

impl IblBaker {
    pub fn new(options: IblOptions) -> Self {
        Self { options }
    }

    /// Tool to run for a term.
    ///
    /// A bare tool name found in the tool directory runs from there;
    /// anything else is passed through and looked up on `PATH`.
    pub fn tool(&self, kind: IblKind) -> PathBuf {
        let tool = match kind {
            IblKind::Diffuse => &self.options.diffuse_tool,
            IblKind::Specular => &self.options.specular_tool,
        };
        if let Some(dir) = &self.options.tool_dir {
            if tool.components().count() == 1 && dir.join(tool).is_file() {
                return dir.join(tool);
            }
        }
        tool.clone()
    }

    /// Create the output directory for one term and run its tool
    pub fn bake(&self, kind: IblKind, sky_path: &Path, intensity: f64, export_dir: &Path) -> Result<PathBuf> {
        let output = kind.output_dir(export_dir);
        std::fs::create_dir_all(&output)
            .map_err(Error::from)
            .with_context(|| format!("creating {}", output.display()))?;

        if !self.options.enabled {
            debug!(kind = %kind, "IBL baking disabled");
            return Ok(output);
        }

        let tool = self.tool(kind);
        let intensity = Num(intensity).to_string();
        info!(kind = %kind, tool = %tool.display(), "Running IBL tool");

        let status = Command::new(&tool)
            .arg(sky_path)
            .arg(&intensity)
            .arg(&output)
            .status()
            .map_err(|source| Error::IblToolLaunch {
                tool: tool.display().to_string(),
                source,
            })?;

        if !status.success() {
            return Err(Error::IblToolFailed {
                tool: tool.display().to_string(),
                status: status.to_string(),
            });
        }
        debug!(kind = %kind, output = %output.display(), "IBL tool finished");
        Ok(output)
    }

    /// Bake both terms in order
    pub fn bake_all(&self, sky_path: &Path, intensity: f64, export_dir: &Path) -> Result<Vec<PathBuf>> {
        IblKind::ALL
            .iter()
            .map(|kind| self.bake(*kind, sky_path, intensity, export_dir))
            .collect()
    }
}
