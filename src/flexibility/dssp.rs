//! Secondary-structure annotation with the DSSP binary (`mkdssp`)

use log::{debug, info};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{FlexibilityError, ResidueAssignment, SecondaryStructureAnnotator};
use crate::process::ToolCommand;
use crate::structure::Structure;

/// Header that precedes the per-residue block of classic DSSP output
const RESIDUE_HEADER: &str = "  #  RESIDUE";

/// Runs DSSP and reads its classic text output from stdout
#[derive(Debug, Clone)]
pub struct Dssp {
    /// Path or name of the DSSP binary
    pub executable: PathBuf,

    /// Extra arguments placed before the structure path
    pub args: Vec<String>,

    /// Kill DSSP if it runs longer than this
    pub timeout: Duration,
}

impl Default for Dssp {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("mkdssp"),
            args: Vec::new(),
            timeout: Duration::from_secs(600),
        }
    }
}

impl SecondaryStructureAnnotator for Dssp {
    fn name(&self) -> &'static str {
        "DSSP"
    }

    fn annotate(
        &self,
        structure: &Structure,
        structure_path: &Path,
    ) -> Result<Vec<ResidueAssignment>, FlexibilityError> {
        info!("Running DSSP on {}", structure_path.display());

        let output = ToolCommand::new(&self.executable)
            .args(&self.args)
            .arg(structure_path)
            .timeout(self.timeout)
            .run()?;

        let assignments = parse_dssp(&output.stdout)?;
        debug!("DSSP assigned {} residues", assignments.len());

        Ok(restrict_to_first_model(structure, assignments))
    }
}

/// Parse classic DSSP output into per-residue assignments
pub fn parse_dssp(content: &str) -> Result<Vec<ResidueAssignment>, FlexibilityError> {
    let mut lines = content.lines();
    if !lines.by_ref().any(|line| line.starts_with(RESIDUE_HEADER)) {
        return Err(FlexibilityError::Parse(
            "missing residue section header".to_string(),
        ));
    }

    let mut assignments = Vec::new();
    for line in lines {
        // Chain breaks are marked with '!' in the amino acid column
        if line.len() < 17 || line.get(13..14) == Some("!") {
            continue;
        }

        let seq_num = line
            .get(5..10)
            .and_then(|s| s.trim().parse::<isize>().ok())
            .ok_or_else(|| FlexibilityError::Parse(format!("bad residue number: {}", line)))?;

        let chain_id = line.get(11..12).unwrap_or(" ").trim().to_string();
        let code = match line.get(16..).and_then(|s| s.chars().next()) {
            Some(' ') | None => '-',
            Some(c) => c,
        };

        assignments.push(ResidueAssignment {
            chain_id,
            seq_num,
            code,
        });
    }

    Ok(assignments)
}

/// Drop assignments for residues that are not in the first model
fn restrict_to_first_model(
    structure: &Structure,
    assignments: Vec<ResidueAssignment>,
) -> Vec<ResidueAssignment> {
    let Some(model) = structure.models.first() else {
        return Vec::new();
    };

    let known: HashSet<(&str, isize)> = model
        .chains
        .iter()
        .flat_map(|chain| {
            chain
                .residues
                .iter()
                .map(move |r| (chain.id.as_str(), r.seq_num))
        })
        .collect();

    assignments
        .into_iter()
        .filter(|a| known.contains(&(a.chain_id.as_str(), a.seq_num)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::parse_pdb_str;

    const DSSP_OUTPUT: &str = "\
==== Secondary Structure Definition by the program DSSP ==== DATE=2024-01-01
    3  1  0  0  0 TOTAL NUMBER OF RESIDUES, NUMBER OF CHAINS
  #  RESIDUE AA STRUCTURE BP1 BP2  ACC     N-H-->O    O-->H-N    N-H-->O    O-->H-N    TCO  KAPPA ALPHA  PHI   PSI    X-CA   Y-CA   Z-CA
    1    1 A M              0   0  180      0, 0.0     2,-0.3     0, 0.0     0, 0.0   0.000 360.0 360.0 360.0 120.0   10.1   11.2   12.3
    2    2 A K  H  >       0   0  120      0, 0.0     2,-0.3     0, 0.0     0, 0.0   0.000 360.0 360.0 360.0 120.0   10.1   11.2   12.3
    3        !              0   0    0      0, 0.0     0, 0.0     0, 0.0     0, 0.0   0.000 360.0 360.0 360.0 360.0    0.0    0.0    0.0
    4    1 B V  E           0   0   10      0, 0.0     0, 0.0     0, 0.0     0, 0.0   0.000 360.0 360.0 360.0 360.0    1.0    2.0    3.0
";

    #[test]
    fn test_parse_dssp() {
        let assignments = parse_dssp(DSSP_OUTPUT).expect("should parse");

        assert_eq!(assignments.len(), 3);
        assert_eq!(
            assignments[0],
            ResidueAssignment {
                chain_id: "A".to_string(),
                seq_num: 1,
                code: '-'
            }
        );
        assert_eq!(assignments[1].code, 'H');
        assert_eq!(assignments[2].chain_id, "B");
        assert_eq!(assignments[2].code, 'E');
    }

    #[test]
    fn test_parse_dssp_without_header() {
        let err = parse_dssp("data_1ABC\n_struct.title x\n").unwrap_err();
        assert!(matches!(err, FlexibilityError::Parse(_)));
    }

    #[test]
    fn test_restrict_to_first_model() {
        let structure = parse_pdb_str(
            "test",
            "ATOM      1  CA  MET A   1       0.000   0.000   0.000  1.00 10.00           C\n",
        )
        .expect("should parse");

        let assignments = parse_dssp(DSSP_OUTPUT).expect("should parse");
        let kept = restrict_to_first_model(&structure, assignments);

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].chain_id, "A");
        assert_eq!(kept[0].seq_num, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_missing_binary_is_process_error() {
        let structure = parse_pdb_str(
            "test",
            "ATOM      1  CA  MET A   1       0.000   0.000   0.000  1.00 10.00           C\n",
        )
        .expect("should parse");
        let dssp = Dssp {
            executable: PathBuf::from("/no/such/mkdssp"),
            ..Dssp::default()
        };

        let err = dssp
            .annotate(&structure, Path::new("test.pdb"))
            .unwrap_err();
        assert!(matches!(err, FlexibilityError::Process(_)));
    }
}
