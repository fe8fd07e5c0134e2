//! Runtime configuration: defaults, an optional `key = value` file, CLI overrides

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::flexibility::dssp::Dssp;
use crate::pocket::fpocket::FpocketConfig;

/// Default timeout for each external tool, in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Errors that can occur while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Settings for the external tools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// fpocket binary; searched on PATH when unset
    pub fpocket_path: Option<PathBuf>,

    /// DSSP binary
    pub dssp_path: PathBuf,

    /// Extra arguments for DSSP
    pub dssp_args: Vec<String>,

    /// Timeout applied to each external tool, in seconds
    pub timeout_secs: u64,

    /// Minimum alpha sphere radius for fpocket
    pub min_alpha_sphere: Option<f64>,

    /// Maximum alpha sphere radius for fpocket
    pub max_alpha_sphere: Option<f64>,

    /// Directory in which fpocket output is expected
    pub work_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fpocket_path: None,
            dssp_path: PathBuf::from("mkdssp"),
            dssp_args: Vec::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            min_alpha_sphere: None,
            max_alpha_sphere: None,
            work_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Load a config file on top of the defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = Config::default();
        config.apply_str(&content)?;
        Ok(config)
    }

    /// Apply `key = value` lines; blank lines, `#` comments and unknown keys
    /// are skipped
    pub fn apply_str(&mut self, content: &str) -> Result<(), ConfigError> {
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();

            match key {
                "fpocket_path" => self.fpocket_path = Some(PathBuf::from(value)),
                "dssp_path" => self.dssp_path = PathBuf::from(value),
                "dssp_args" => {
                    self.dssp_args = value.split_whitespace().map(String::from).collect()
                }
                "timeout_secs" => self.timeout_secs = parse_value(key, value)?,
                "min_alpha_sphere" => self.min_alpha_sphere = Some(parse_value(key, value)?),
                "max_alpha_sphere" => self.max_alpha_sphere = Some(parse_value(key, value)?),
                "work_dir" => self.work_dir = PathBuf::from(value),
                _ => {} // Ignore other keys
            }
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// fpocket settings derived from this configuration
    pub fn fpocket(&self) -> FpocketConfig {
        FpocketConfig {
            executable: self.fpocket_path.clone(),
            work_dir: self.work_dir.clone(),
            timeout: self.timeout(),
            min_alpha_sphere: self.min_alpha_sphere,
            max_alpha_sphere: self.max_alpha_sphere,
        }
    }

    /// DSSP annotator derived from this configuration
    pub fn dssp(&self) -> Dssp {
        Dssp {
            executable: self.dssp_path.clone(),
            args: self.dssp_args.clone(),
            timeout: self.timeout(),
        }
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse::<T>().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}
