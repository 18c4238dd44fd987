//! Scoped working directory change

use std::path::{Path, PathBuf};

use scenefile_core::{Error, Result, ResultExt};
use tracing::{debug, warn};

/// Switches the process working directory and restores it on drop
#[derive(Debug)]
pub struct WorkingDirGuard {
    previous: PathBuf,
}

impl WorkingDirGuard {
    pub fn enter(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let previous = std::env::current_dir()
            .map_err(Error::from)
            .context("reading current directory")?;
        std::env::set_current_dir(dir)
            .map_err(Error::from)
            .with_context(|| format!("entering {}", dir.display()))?;
        debug!(dir = %dir.display(), "Entered working directory");
        Ok(Self { previous })
    }
}

impl Drop for WorkingDirGuard {
    fn drop(&mut self) {
        if let Err(e) = std::env::set_current_dir(&self.previous) {
            warn!(dir = %self.previous.display(), error = %e, "Failed to restore working directory");
        }
    }
}
