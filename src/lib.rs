//! BindSite: binding pocket and ligand compatibility reports
//!
//! This library wraps an external pocket detector (fpocket) and a
//! secondary-structure annotator (DSSP) around an in-crate PDB reader, and
//! turns their output into a small per-pocket compatibility summary.

pub mod atom;
pub mod compatibility;
pub mod config;
pub mod flexibility;
pub mod io;
pub mod pipeline;
pub mod pocket;
pub mod process;
pub mod structure;

// Re-export commonly used types and functions
pub use atom::Atom;
pub use compatibility::{analyze_ligand_compatibility, CompatibilityReport};
pub use config::Config;
pub use pipeline::{AnalysisReport, AnalysisRequest, Pipeline};
pub use pocket::{Measurement, Pocket, PocketSet};
pub use structure::Structure;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
