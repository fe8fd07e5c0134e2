//! Coarse ligand/pocket compatibility summary

use crate::pocket::{PocketError, PocketSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during compatibility analysis
#[derive(Error, Debug)]
pub enum CompatibilityError {
    #[error("Ligand file not found: {}", .0.display())]
    LigandNotFound(PathBuf),

    #[error(transparent)]
    Pocket(#[from] PocketError),
}

/// Pocket properties reported alongside a ligand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityReport {
    pub pocket_volume: Option<f64>,
    pub pocket_score: Option<f64>,
    /// 1-based rank of the pocket in the detector's ordering
    pub binding_site_rank: usize,
    pub total_pockets_found: usize,
}

impl fmt::Display for CompatibilityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Debug keeps the decimal point on whole numbers ("150.0")
        let show = |value: Option<f64>| match value {
            Some(v) => format!("{:?}", v),
            None => "None".to_string(),
        };

        writeln!(f, "pocket_volume: {}", show(self.pocket_volume))?;
        writeln!(f, "pocket_score: {}", show(self.pocket_score))?;
        writeln!(f, "binding_site_rank: {}", self.binding_site_rank)?;
        write!(f, "total_pockets_found: {}", self.total_pockets_found)
    }
}

/// Summarise the pocket at `pocket_id` for the ligand at `ligand_path`.
///
/// The ligand file is only checked for existence; nothing is read from it.
pub fn analyze_ligand_compatibility<P: AsRef<Path>>(
    ligand_path: P,
    pockets: &PocketSet,
    pocket_id: usize,
) -> Result<CompatibilityReport, CompatibilityError> {
    let ligand_path = ligand_path.as_ref();
    if !ligand_path.exists() {
        return Err(CompatibilityError::LigandNotFound(
            ligand_path.to_path_buf(),
        ));
    }

    let summary = pockets.analyze(pocket_id)?;

    Ok(CompatibilityReport {
        pocket_volume: summary.volume,
        pocket_score: summary.score,
        binding_site_rank: pocket_id + 1,
        total_pockets_found: pockets.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pocket::report::parse_report;
    use std::fs;

    const TWO_POCKETS: &str = "\
Pocket 1 :
\tScore : \t0.8
\tVolume : \t150.0

Pocket 2 :
\tScore : \t0.3
\tVolume : \t80.0
";

    #[test]
    fn test_compatibility_for_first_pocket() {
        let dir = tempfile::tempdir().expect("temp dir");
        let ligand = dir.path().join("ligand.mol2");
        fs::write(&ligand, "@<TRIPOS>MOLECULE\nligand\n").expect("write ligand");

        let report =
            analyze_ligand_compatibility(&ligand, &parse_report(TWO_POCKETS), 0).expect("report");

        assert_eq!(
            report,
            CompatibilityReport {
                pocket_volume: Some(150.0),
                pocket_score: Some(0.8),
                binding_site_rank: 1,
                total_pockets_found: 2,
            }
        );
    }

    #[test]
    fn test_missing_ligand_fails_before_lookup() {
        // Index 99 is out of range; the ligand check must win
        let err = analyze_ligand_compatibility(
            "/no/such/ligand.mol2",
            &parse_report(TWO_POCKETS),
            99,
        )
        .unwrap_err();

        assert!(matches!(err, CompatibilityError::LigandNotFound(_)));
    }

    #[test]
    fn test_invalid_pocket_id() {
        let dir = tempfile::tempdir().expect("temp dir");
        let ligand = dir.path().join("ligand.mol2");
        fs::write(&ligand, "").expect("write ligand");

        let err = analyze_ligand_compatibility(&ligand, &PocketSet::default(), 0).unwrap_err();
        assert!(matches!(
            err,
            CompatibilityError::Pocket(PocketError::InvalidPocketId(0))
        ));
    }

    #[test]
    fn test_display() {
        let report = CompatibilityReport {
            pocket_volume: Some(150.5),
            pocket_score: None,
            binding_site_rank: 2,
            total_pockets_found: 3,
        };

        assert_eq!(
            report.to_string(),
            "pocket_volume: 150.5\npocket_score: None\nbinding_site_rank: 2\ntotal_pockets_found: 3"
        );
    }

    #[test]
    fn test_display_keeps_decimal_point() {
        let report = CompatibilityReport {
            pocket_volume: Some(150.0),
            pocket_score: Some(1.0),
            binding_site_rank: 1,
            total_pockets_found: 1,
        };

        let rendered = report.to_string();
        assert!(rendered.contains("pocket_volume: 150.0\n"));
        assert!(rendered.contains("pocket_score: 1.0\n"));
        assert!(rendered.ends_with("total_pockets_found: 1"));
    }

    #[test]
    fn test_json_field_names() {
        let report = CompatibilityReport {
            pocket_volume: Some(150.0),
            pocket_score: Some(0.8),
            binding_site_rank: 1,
            total_pockets_found: 2,
        };

        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["pocket_volume"], 150.0);
        assert_eq!(json["pocket_score"], 0.8);
        assert_eq!(json["binding_site_rank"], 1);
        assert_eq!(json["total_pockets_found"], 2);
    }
}
