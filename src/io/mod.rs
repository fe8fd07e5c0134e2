//! Input/output functionality for structure files

use log::debug;
use pdbtbx::{Format, PDBError, ReadOptions, StrictnessLevel, PDB};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::structure::Structure;

/// Errors that can occur during file I/O operations
#[derive(Error, Debug)]
pub enum IoError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Path is not valid UTF-8: {}", .0.display())]
    InvalidPath(PathBuf),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid file format: {0}")]
    InvalidFormat(String),
}

/// Parse a PDB file into a Structure
pub fn parse_pdb<P: AsRef<Path>>(path: P) -> Result<Structure, IoError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }
    let path_str = path
        .to_str()
        .ok_or_else(|| IoError::InvalidPath(path.to_path_buf()))?;

    // Files in the wild rarely pass the stricter levels
    let result = ReadOptions::default()
        .set_level(StrictnessLevel::Loose)
        .set_format(Format::Pdb)
        .read(path_str);

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown");

    into_structure(name, result)
}

/// Parse PDB text held in memory
pub fn parse_pdb_str(name: &str, content: &str) -> Result<Structure, IoError> {
    let result = ReadOptions::default()
        .set_level(StrictnessLevel::Loose)
        .set_format(Format::Pdb)
        .read_raw(BufReader::new(content.as_bytes()));

    into_structure(name, result)
}

fn into_structure(
    name: &str,
    result: Result<(PDB, Vec<PDBError>), Vec<PDBError>>,
) -> Result<Structure, IoError> {
    let (pdb, warnings) = result.map_err(|errors| IoError::Parse(join_errors(&errors)))?;
    for warning in &warnings {
        debug!("{}: {}", name, warning);
    }

    let structure = Structure::from_pdb(name, &pdb);
    if structure.atom_count() == 0 {
        return Err(IoError::InvalidFormat(format!(
            "no ATOM or HETATM records in {}",
            name
        )));
    }

    debug!(
        "Parsed structure {}: {} models, {} atoms",
        structure.name,
        structure.models.len(),
        structure.atom_count()
    );

    Ok(structure)
}

fn join_errors(errors: &[PDBError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
