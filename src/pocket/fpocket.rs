//! Pocket detection with the fpocket binary

use log::{debug, info};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::report::read_report;
use super::{PocketDetection, PocketDetector, PocketError};
use crate::process::{ProcessError, ToolCommand};

/// Configuration for running fpocket
#[derive(Debug, Clone)]
pub struct FpocketConfig {
    /// Path to the fpocket binary (searched on PATH when `None`)
    pub executable: Option<PathBuf>,

    /// Directory in which `<name>_out/` is expected
    pub work_dir: PathBuf,

    /// Kill fpocket if it runs longer than this
    pub timeout: Duration,

    /// Minimum alpha sphere radius passed as `-m`
    pub min_alpha_sphere: Option<f64>,

    /// Maximum alpha sphere radius passed as `-M`
    pub max_alpha_sphere: Option<f64>,
}

impl Default for FpocketConfig {
    fn default() -> Self {
        Self {
            executable: None,
            work_dir: PathBuf::from("."),
            timeout: Duration::from_secs(600),
            min_alpha_sphere: None,
            max_alpha_sphere: None,
        }
    }
}

/// Runs fpocket and reads its `<name>_info.txt` report
#[derive(Debug, Clone, Default)]
pub struct Fpocket {
    config: FpocketConfig,
}

impl Fpocket {
    pub fn new(config: FpocketConfig) -> Self {
        Self { config }
    }

    /// Resolve the fpocket executable, searching PATH for bare names
    pub fn executable(&self) -> Result<PathBuf, ProcessError> {
        let requested = self
            .config
            .executable
            .clone()
            .unwrap_or_else(|| PathBuf::from("fpocket"));

        which::which(&requested).map_err(|e| {
            debug!("fpocket lookup for {} failed: {}", requested.display(), e);
            ProcessError::ToolNotFound(requested.display().to_string())
        })
    }

    /// Where the report for `structure_path` is expected
    pub fn report_path(&self, structure_path: &Path) -> Result<PathBuf, PocketError> {
        let stem = structure_path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| PocketError::InvalidStructurePath(structure_path.to_path_buf()))?;

        Ok(self
            .config
            .work_dir
            .join(format!("{}_out", stem))
            .join(format!("{}_info.txt", stem)))
    }

    fn command(&self, executable: &Path, structure_path: &Path) -> ToolCommand {
        let mut command = ToolCommand::new(executable)
            .arg("-f")
            .arg(structure_path)
            .timeout(self.config.timeout);

        if let Some(min) = self.config.min_alpha_sphere {
            command = command.arg("-m").arg(min.to_string());
        }
        if let Some(max) = self.config.max_alpha_sphere {
            command = command.arg("-M").arg(max.to_string());
        }

        command
    }
}

impl PocketDetector for Fpocket {
    fn name(&self) -> &'static str {
        "fpocket"
    }

    fn detect(&self, structure_path: &Path) -> Result<PocketDetection, PocketError> {
        if !structure_path.exists() {
            return Err(PocketError::StructureNotFound(structure_path.to_path_buf()));
        }

        let executable = self.executable()?;
        let absolute = structure_path.canonicalize()?;
        info!("Running fpocket on: {}", absolute.display());
        debug!("fpocket executable: {}", executable.display());

        let tool_output = self.command(&executable, &absolute).run()?;
        tool_output.log_streams();

        let report_path = self.report_path(structure_path)?;
        info!("Looking for fpocket output in: {}", report_path.display());
        let pockets = read_report(&report_path)?;
        info!("Found {} pockets", pockets.len());

        Ok(PocketDetection {
            pockets,
            report_path,
            tool_output,
        })
    }
}
