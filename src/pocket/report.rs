//! Parser for the plain-text pocket report (`<name>_info.txt`)
//!
//! The report is a sequence of sections:
//!
//! ```text
//! Pocket 1 :
//!     Score :                 0.512
//!     Druggability Score :    0.021
//!     Volume :                476.274
//! ```
//!
//! A line beginning with `Pocket` opens a section. Within a section, a line
//! containing `Score` sets the score and otherwise a line containing `Volume`
//! sets the volume, in both cases from the last whitespace-separated token.
//! `Score` is tested first, so a line mentioning both only sets the score.
//! Later lines overwrite earlier ones, which means fpocket's
//! `Druggability Score` line replaces the plain `Score`; the exact per-label
//! values stay available through [`Pocket::attribute`].

use log::debug;
use std::fs;
use std::path::Path;

use super::{Measurement, Pocket, PocketError, PocketSet};

/// Read and parse a report file
pub fn read_report<P: AsRef<Path>>(path: P) -> Result<PocketSet, PocketError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(PocketError::ReportNotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)?;
    let pockets = parse_report(&content);
    debug!(
        "Parsed {} pockets from {}",
        pockets.len(),
        path.display()
    );

    Ok(pockets)
}

/// Parse report text into pockets, in report order
pub fn parse_report(content: &str) -> PocketSet {
    let mut pockets = Vec::new();
    let mut current: Option<Pocket> = None;

    for line in content.lines() {
        if line.starts_with("Pocket") {
            if let Some(pocket) = current.take() {
                pockets.push(pocket);
            }
            current = Some(Pocket::default());
            continue;
        }

        let Some(pocket) = current.as_mut() else {
            continue;
        };

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 2 {
            continue;
        }

        let value = Measurement::parse(parts[parts.len() - 1]);
        if line.contains("Score") {
            pocket.score.update(value.clone());
        } else if line.contains("Volume") {
            pocket.volume.update(value.clone());
        }

        pocket.attributes.push((label(line, &parts), value));
    }

    if let Some(pocket) = current.take() {
        pockets.push(pocket);
    }

    PocketSet::new(pockets)
}

/// Label of a detail line: the text before the first colon, or every token
/// but the value when there is no colon
fn label(line: &str, parts: &[&str]) -> String {
    match line.split_once(':') {
        Some((label, _)) => label.trim().to_string(),
        None => parts[..parts.len() - 1].join(" "),
    }
}
