//! Flexibility analysis: B-factors and secondary structure

pub mod dssp;

use crate::process::ProcessError;
use crate::structure::Structure;
use log::{info, warn};
use serde::{Deserialize, Serialize, Serializer};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while annotating secondary structure
#[derive(Error, Debug)]
pub enum FlexibilityError {
    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("Unrecognised annotator output: {0}")]
    Parse(String),
}

/// Per-atom B-factors in model -> chain -> residue -> atom order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BFactorProfile {
    pub values: Vec<f64>,
}

impl BFactorProfile {
    /// Collect the B-factor of every atom of the structure
    pub fn from_structure(structure: &Structure) -> Self {
        Self {
            values: structure.atoms().map(|atom| atom.b_factor).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        Some(self.values.iter().sum::<f64>() / self.values.len() as f64)
    }

    /// Population standard deviation
    pub fn std_dev(&self) -> Option<f64> {
        let mean = self.mean()?;
        let variance = self
            .values
            .iter()
            .map(|v| (v - mean).powi(2))
            .sum::<f64>()
            / self.values.len() as f64;
        Some(variance.sqrt())
    }

    pub fn min(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::min)
    }

    pub fn max(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }

    /// Z-scores of the B-factors; a constant profile maps to zeros
    pub fn normalized(&self) -> Vec<f64> {
        let (Some(mean), Some(std_dev)) = (self.mean(), self.std_dev()) else {
            return Vec::new();
        };

        if std_dev <= f64::EPSILON {
            return vec![0.0; self.values.len()];
        }

        self.values.iter().map(|v| (v - mean) / std_dev).collect()
    }
}

/// One residue classified by a secondary-structure annotator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResidueAssignment {
    pub chain_id: String,
    pub seq_num: isize,
    /// Single-letter code (H, B, E, G, I, T, S, or '-' for coil)
    pub code: char,
}

/// Secondary-structure codes grouped by chain.
///
/// Chains keep the order in which they first appear; codes within a chain
/// keep residue order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SecondaryStructure {
    chains: Vec<(String, Vec<char>)>,
}

impl SecondaryStructure {
    /// Number of chains
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Codes assigned to one chain
    pub fn chain(&self, chain_id: &str) -> Option<&[char]> {
        self.chains
            .iter()
            .find(|(id, _)| id == chain_id)
            .map(|(_, codes)| codes.as_slice())
    }

    pub fn chain_ids(&self) -> impl Iterator<Item = &str> {
        self.chains.iter().map(|(id, _)| id.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[char])> {
        self.chains
            .iter()
            .map(|(id, codes)| (id.as_str(), codes.as_slice()))
    }

    fn push(&mut self, chain_id: &str, code: char) {
        match self.chains.iter_mut().find(|(id, _)| id == chain_id) {
            Some((_, codes)) => codes.push(code),
            None => self.chains.push((chain_id.to_string(), vec![code])),
        }
    }
}

// Serialized as a JSON object whose keys follow chain order
impl Serialize for SecondaryStructure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.chains.iter().map(|(id, codes)| (id, codes)))
    }
}

/// Group per-residue assignments by chain identifier
pub fn group_by_chain(assignments: &[ResidueAssignment]) -> SecondaryStructure {
    let mut grouped = SecondaryStructure::default();
    for assignment in assignments {
        grouped.push(&assignment.chain_id, assignment.code);
    }
    grouped
}

/// Trait for secondary-structure annotation backends
pub trait SecondaryStructureAnnotator {
    /// Get the name of the annotator
    fn name(&self) -> &'static str;

    /// Classify every residue of the structure stored at `structure_path`
    fn annotate(
        &self,
        structure: &Structure,
        structure_path: &Path,
    ) -> Result<Vec<ResidueAssignment>, FlexibilityError>;
}

/// B-factors and (when the annotator succeeded) secondary structure
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlexibilitySnapshot {
    pub b_factors: BFactorProfile,
    pub secondary_structure: Option<SecondaryStructure>,
}

/// Compute a flexibility snapshot.
///
/// Annotator failures are logged and leave `secondary_structure` unset.
pub fn analyze_flexibility(
    structure: &Structure,
    structure_path: &Path,
    annotator: &dyn SecondaryStructureAnnotator,
) -> FlexibilitySnapshot {
    let b_factors = BFactorProfile::from_structure(structure);
    info!("Collected {} B-factors", b_factors.len());

    let secondary_structure = match annotator.annotate(structure, structure_path) {
        Ok(assignments) => Some(group_by_chain(&assignments)),
        Err(e) => {
            warn!("{} analysis failed: {}", annotator.name(), e);
            if let FlexibilityError::Process(process_error) = &e {
                if let Some(output) = process_error.output() {
                    output.log_streams();
                }
            }
            None
        }
    };

    FlexibilitySnapshot {
        b_factors,
        secondary_structure,
    }
}
