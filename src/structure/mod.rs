//! Protein structure hierarchy (model -> chain -> residue -> atom)

use crate::atom::Atom;
use serde::{Deserialize, Serialize};

/// A residue and the atoms it owns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Residue {
    /// Residue name (e.g., "ALA", "HOH")
    pub name: String,

    /// Residue sequence number
    pub seq_num: isize,

    /// Insertion code, if any
    pub insertion_code: Option<String>,

    /// Was this residue read from HETATM records?
    pub hetero: bool,

    /// One atom per name, in file order
    pub atoms: Vec<Atom>,
}

impl Residue {
    /// Convert a `pdbtbx` residue, resolving alternate locations.
    ///
    /// When an atom name occurs in several conformers, the copy with the
    /// highest occupancy is kept (the earliest one on ties) at the position
    /// where the name first appeared.
    pub fn from_pdb(residue: &pdbtbx::Residue) -> Self {
        // (first serial seen for the name, selected atom, its conformer)
        let mut selected: Vec<(usize, &pdbtbx::Atom, Option<&str>)> = Vec::new();

        for conformer in residue.conformers() {
            let alt_loc = conformer.alternative_location();
            for atom in conformer.atoms() {
                match selected.iter_mut().find(|(_, a, _)| a.name() == atom.name()) {
                    Some((first, chosen, chosen_alt_loc)) => {
                        *first = (*first).min(atom.serial_number());
                        if atom.occupancy() > chosen.occupancy() {
                            *chosen = atom;
                            *chosen_alt_loc = alt_loc;
                        }
                    }
                    None => selected.push((atom.serial_number(), atom, alt_loc)),
                }
            }
        }
        selected.sort_by_key(|(first, _, _)| *first);

        let atoms: Vec<Atom> = selected
            .into_iter()
            .map(|(_, atom, alt_loc)| Atom::from_pdb(atom, alt_loc))
            .collect();

        Self {
            name: residue.name().unwrap_or_default().to_string(),
            seq_num: residue.serial_number(),
            insertion_code: residue.insertion_code().map(String::from),
            hetero: atoms.iter().any(|a| a.hetero),
            atoms,
        }
    }
}

/// A polymer chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chain {
    /// Chain identifier
    pub id: String,

    /// Residues in file order
    pub residues: Vec<Residue>,
}

impl Chain {
    pub fn from_pdb(chain: &pdbtbx::Chain) -> Self {
        Self {
            id: chain.id().to_string(),
            residues: chain.residues().map(Residue::from_pdb).collect(),
        }
    }

    /// Iterate over all atoms of this chain
    pub fn atoms(&self) -> impl Iterator<Item = &Atom> {
        self.residues.iter().flat_map(|r| r.atoms.iter())
    }
}

/// One model (conformer set) of a structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    /// Model serial number
    pub serial: usize,

    /// Chains in order of first appearance
    pub chains: Vec<Chain>,
}

impl Model {
    pub fn from_pdb(model: &pdbtbx::Model) -> Self {
        Self {
            serial: model.serial_number(),
            chains: model.chains().map(Chain::from_pdb).collect(),
        }
    }

    /// Find a chain by identifier
    pub fn chain(&self, id: &str) -> Option<&Chain> {
        self.chains.iter().find(|c| c.id == id)
    }

    /// Iterate over all atoms of this model
    pub fn atoms(&self) -> impl Iterator<Item = &Atom> {
        self.chains.iter().flat_map(|c| c.atoms())
    }
}

/// A parsed structure file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Structure {
    /// Name of the structure (usually the file stem)
    pub name: String,

    /// Models in file order
    pub models: Vec<Model>,
}

impl Structure {
    /// Build the hierarchy from a `pdbtbx` structure
    pub fn from_pdb(name: &str, pdb: &pdbtbx::PDB) -> Self {
        Self {
            name: name.to_string(),
            models: pdb.models().map(Model::from_pdb).collect(),
        }
    }

    /// Iterate over every atom in model -> chain -> residue -> atom order
    pub fn atoms(&self) -> impl Iterator<Item = &Atom> {
        self.models.iter().flat_map(|m| m.atoms())
    }

    /// Total number of atoms across all models
    pub fn atom_count(&self) -> usize {
        self.atoms().count()
    }

    /// Number of residues in the first model
    pub fn residue_count(&self) -> usize {
        self.models
            .first()
            .map(|m| m.chains.iter().map(|c| c.residues.len()).sum())
            .unwrap_or(0)
    }

    /// Chain identifiers of the first model
    pub fn chain_ids(&self) -> Vec<&str> {
        self.models
            .first()
            .map(|m| m.chains.iter().map(|c| c.id.as_str()).collect())
            .unwrap_or_default()
    }
}
