//! Binding pockets reported by an external detection tool

pub mod fpocket;
pub mod report;

use crate::atom::Atom;
use crate::process::{ProcessError, ToolOutput};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while detecting or looking up pockets
#[derive(Error, Debug)]
pub enum PocketError {
    #[error("Invalid pocket ID: {0}")]
    InvalidPocketId(usize),

    #[error("Pocket report not found at: {}", .0.display())]
    ReportNotFound(PathBuf),

    #[error("Structure file not found: {}", .0.display())]
    StructureNotFound(PathBuf),

    #[error("Invalid structure file name: {}", .0.display())]
    InvalidStructurePath(PathBuf),

    #[error("IO error")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Process(#[from] ProcessError),
}

/// A numeric field read from a report line.
///
/// Keeps "the label never appeared" apart from "the label appeared but its
/// value could not be parsed".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "raw", rename_all = "snake_case")]
pub enum Measurement {
    #[default]
    Absent,
    Present(f64),
    Malformed(String),
}

impl Measurement {
    /// Parse a raw token
    pub fn parse(token: &str) -> Self {
        match token.parse::<f64>() {
            Ok(value) => Measurement::Present(value),
            Err(_) => Measurement::Malformed(token.to_string()),
        }
    }

    /// The value, if one was parsed
    pub fn value(&self) -> Option<f64> {
        match self {
            Measurement::Present(value) => Some(*value),
            _ => None,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Measurement::Malformed(_))
    }

    /// Fold a newer observation into this field.
    ///
    /// A parsed value always replaces the current one; a malformed token only
    /// replaces a field that holds no value yet.
    pub fn update(&mut self, observed: Measurement) {
        match observed {
            Measurement::Absent => {}
            Measurement::Present(_) => *self = observed,
            Measurement::Malformed(_) => {
                if self.value().is_none() {
                    *self = observed;
                }
            }
        }
    }
}

/// One pocket section of a detection report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pocket {
    /// Atoms lining the pocket (not populated by report parsing)
    pub atoms: Vec<Atom>,

    /// Pocket score
    pub score: Measurement,

    /// Pocket volume
    pub volume: Measurement,

    /// Every labelled detail line of the section, in report order
    pub attributes: Vec<(String, Measurement)>,
}

impl Pocket {
    /// Look up a detail line by its label (e.g. "Druggability Score")
    pub fn attribute(&self, label: &str) -> Option<&Measurement> {
        self.attributes
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, m)| m)
    }
}

/// Volume and score of a single pocket
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PocketSummary {
    pub volume: Option<f64>,
    pub score: Option<f64>,
}

/// The ordered pockets of one successfully parsed report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PocketSet {
    pockets: Vec<Pocket>,
}

impl PocketSet {
    pub fn new(pockets: Vec<Pocket>) -> Self {
        Self { pockets }
    }

    pub fn len(&self) -> usize {
        self.pockets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pockets.is_empty()
    }

    pub fn get(&self, pocket_id: usize) -> Option<&Pocket> {
        self.pockets.get(pocket_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pocket> {
        self.pockets.iter()
    }

    /// Volume and score of the pocket at the zero-based `pocket_id`
    pub fn analyze(&self, pocket_id: usize) -> Result<PocketSummary, PocketError> {
        let pocket = self
            .pockets
            .get(pocket_id)
            .ok_or(PocketError::InvalidPocketId(pocket_id))?;

        Ok(PocketSummary {
            volume: pocket.volume.value(),
            score: pocket.score.value(),
        })
    }
}

/// Result of running a pocket detector on a structure file
#[derive(Debug, Clone)]
pub struct PocketDetection {
    /// Parsed pockets
    pub pockets: PocketSet,

    /// Report file the pockets were read from
    pub report_path: PathBuf,

    /// Output of the detection tool
    pub tool_output: ToolOutput,
}

/// Trait for pocket detection backends
pub trait PocketDetector {
    /// Get the name of the detector
    fn name(&self) -> &'static str;

    /// Detect pockets in the structure file at `structure_path`
    fn detect(&self, structure_path: &Path) -> Result<PocketDetection, PocketError>;
}
