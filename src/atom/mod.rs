//! Atom representation and related functionality

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Represents an atom record of a structure file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    /// Atom serial number from PDB
    pub serial: usize,

    /// Atom name from PDB format (e.g., "CA", "N", "O")
    pub name: String,

    /// Alternate location of the conformer this atom was taken from
    pub alt_loc: Option<String>,

    /// 3D coordinates (in Angstroms)
    pub coordinates: Vector3<f64>,

    /// Occupancy
    pub occupancy: f64,

    /// Temperature factor (B-factor)
    pub b_factor: f64,

    /// Was this read from a HETATM record?
    pub hetero: bool,
}

impl Atom {
    /// Convert a `pdbtbx` atom taken from the conformer with `alt_loc`
    pub fn from_pdb(atom: &pdbtbx::Atom, alt_loc: Option<&str>) -> Self {
        Self {
            serial: atom.serial_number(),
            name: atom.name().to_string(),
            alt_loc: alt_loc.map(String::from),
            coordinates: Vector3::new(atom.x(), atom.y(), atom.z()),
            occupancy: atom.occupancy(),
            b_factor: atom.b_factor(),
            hetero: atom.hetero(),
        }
    }
}
