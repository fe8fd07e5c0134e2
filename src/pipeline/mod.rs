//! End-to-end binding site analysis
//!
//! Each stage takes the output of the previous one and returns a new value:
//! structure -> pocket detection -> flexibility -> compatibility.

use log::{error, info};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::compatibility::{analyze_ligand_compatibility, CompatibilityError, CompatibilityReport};
use crate::flexibility::{analyze_flexibility, FlexibilitySnapshot, SecondaryStructureAnnotator};
use crate::io::{parse_pdb, IoError};
use crate::pocket::{PocketDetection, PocketDetector, PocketError};
use crate::structure::Structure;

/// Errors that abort an analysis
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("PDB file {} not found", .0.display())]
    StructureNotFound(PathBuf),

    #[error("Failed to parse PDB file")]
    Structure(#[from] IoError),

    #[error("Pocket detection failed")]
    Detection(#[from] PocketError),

    #[error(transparent)]
    Compatibility(#[from] CompatibilityError),
}

/// What to analyse
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub structure_path: PathBuf,
    pub ligand_path: PathBuf,
    pub pocket_id: usize,
}

/// A structure together with the file it was read from
#[derive(Debug, Clone)]
pub struct LoadedStructure {
    pub path: PathBuf,
    pub structure: Structure,
}

/// Everything produced by one analysis
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub structure_name: String,
    pub atom_count: usize,
    pub pockets_found: usize,
    pub flexibility: FlexibilitySnapshot,
    pub compatibility: CompatibilityReport,
}

/// Load and parse the structure file
pub fn load_structure(path: &Path) -> Result<LoadedStructure, PipelineError> {
    info!("Loading protein structure from {}...", path.display());
    if !path.exists() {
        return Err(PipelineError::StructureNotFound(path.to_path_buf()));
    }

    let structure = parse_pdb(path)?;
    info!(
        "Loaded {}: {} atoms in {} chains",
        structure.name,
        structure.atom_count(),
        structure.chain_ids().len()
    );

    Ok(LoadedStructure {
        path: path.to_path_buf(),
        structure,
    })
}

/// Run the pocket detector on the loaded structure's file
pub fn detect_pockets(
    loaded: &LoadedStructure,
    detector: &dyn PocketDetector,
) -> Result<PocketDetection, PipelineError> {
    info!("Running {} analysis...", detector.name());

    detector.detect(&loaded.path).map_err(|e| {
        if let PocketError::Process(process_error) = &e {
            error!("Error running {}: {}", detector.name(), process_error);
            if let Some(output) = process_error.output() {
                if !output.stdout.trim().is_empty() {
                    error!("{} output: {}", detector.name(), output.stdout.trim_end());
                }
                if !output.stderr.trim().is_empty() {
                    error!("{} error output: {}", detector.name(), output.stderr.trim_end());
                }
            }
        }
        PipelineError::Detection(e)
    })
}

/// Runs every stage with fixed backends
pub struct Pipeline<'a> {
    detector: &'a dyn PocketDetector,
    annotator: &'a dyn SecondaryStructureAnnotator,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        detector: &'a dyn PocketDetector,
        annotator: &'a dyn SecondaryStructureAnnotator,
    ) -> Self {
        Self {
            detector,
            annotator,
        }
    }

    /// Run the full analysis
    pub fn run(&self, request: &AnalysisRequest) -> Result<AnalysisReport, PipelineError> {
        let loaded = load_structure(&request.structure_path)?;
        let detection = detect_pockets(&loaded, self.detector)?;

        info!("Analyzing protein flexibility...");
        let flexibility = analyze_flexibility(&loaded.structure, &loaded.path, self.annotator);

        info!(
            "Analyzing compatibility with ligand {} at pocket {}...",
            request.ligand_path.display(),
            request.pocket_id
        );
        let compatibility = analyze_ligand_compatibility(
            &request.ligand_path,
            &detection.pockets,
            request.pocket_id,
        )?;

        Ok(AnalysisReport {
            structure_name: loaded.structure.name.clone(),
            atom_count: loaded.structure.atom_count(),
            pockets_found: detection.pockets.len(),
            flexibility,
            compatibility,
        })
    }
}
