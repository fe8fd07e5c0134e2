//! Main executable for bindsite

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;

use bindsite::config::Config;
use bindsite::pipeline::{AnalysisRequest, Pipeline, PipelineError};
use bindsite::pocket::fpocket::Fpocket;

/// Command-line arguments for the application
#[derive(Parser, Debug)]
#[clap(
    name = "bindsite",
    version = bindsite::VERSION,
    about = "Analyze protein-ligand binding compatibility"
)]
struct Cli {
    /// PDB file for protein structure
    #[clap(long, value_parser, default_value = "protein.pdb")]
    pdb: PathBuf,

    /// MOL2 file for ligand structure
    #[clap(long, value_parser, default_value = "ligand.mol2")]
    ligand: PathBuf,

    /// Pocket ID to analyze
    #[clap(long, default_value_t = 0)]
    pocket: usize,

    /// Configuration file with tool settings
    #[clap(long, short, value_parser)]
    config: Option<PathBuf>,

    /// Path to the fpocket executable
    #[clap(long, value_parser)]
    fpocket: Option<PathBuf>,

    /// Path to the DSSP executable
    #[clap(long, value_parser)]
    dssp: Option<PathBuf>,

    /// Timeout for each external tool, in seconds
    #[clap(long)]
    timeout: Option<u64>,

    /// Directory in which fpocket output is expected
    #[clap(long, value_parser)]
    work_dir: Option<PathBuf>,

    /// Print the full report as JSON
    #[clap(long)]
    json: bool,
}

fn main() {
    // Initialize logger; progress goes to stdout with the results
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stdout)
        .init();

    // Parse command-line arguments
    let cli = Cli::parse();

    // Errors are reported, never turned into a failing exit status
    println!("{}", execute(&cli));
}

/// Run the analysis and return the text to print
fn execute(cli: &Cli) -> String {
    match run(cli) {
        Ok(text) => text,
        Err(e) => format!("Error in analysis: {:#}", e),
    }
}

fn run(cli: &Cli) -> Result<String> {
    let config = load_config(cli)?;

    let detector = Fpocket::new(config.fpocket());
    let annotator = config.dssp();
    let request = AnalysisRequest {
        structure_path: cli.pdb.clone(),
        ligand_path: cli.ligand.clone(),
        pocket_id: cli.pocket,
    };

    let report = match Pipeline::new(&detector, &annotator).run(&request) {
        Ok(report) => report,
        Err(PipelineError::StructureNotFound(path)) => {
            return Ok(format!("Error: PDB file {} not found", path.display()));
        }
        Err(e) => return Err(e.into()),
    };

    if cli.json {
        return serde_json::to_string_pretty(&report).context("Failed to serialize report");
    }

    if let Some(ss) = &report.flexibility.secondary_structure {
        info!("Secondary structure assigned for {} chains", ss.len());
    }
    if let (Some(mean), Some(min), Some(max)) = (
        report.flexibility.b_factors.mean(),
        report.flexibility.b_factors.min(),
        report.flexibility.b_factors.max(),
    ) {
        info!("B-factors: mean {:.2}, min {:.2}, max {:.2}", mean, min, max);
    }

    Ok(format!(
        "\nCompatibility analysis results:\n{}",
        report.compatibility
    ))
}

/// Build the configuration from defaults, the config file and CLI overrides
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config file: {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(fpocket) = &cli.fpocket {
        config.fpocket_path = Some(fpocket.clone());
    }
    if let Some(dssp) = &cli.dssp {
        config.dssp_path = dssp.clone();
    }
    if let Some(timeout) = cli.timeout {
        config.timeout_secs = timeout;
    }
    if let Some(work_dir) = &cli.work_dir {
        config.work_dir = work_dir.clone();
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_data_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("test_data")
    }

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("bindsite").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let cli = cli(&[]);
        assert_eq!(cli.pdb, PathBuf::from("protein.pdb"));
        assert_eq!(cli.ligand, PathBuf::from("ligand.mol2"));
        assert_eq!(cli.pocket, 0);
        assert!(!cli.json);
    }

    #[test]
    fn test_missing_pdb_message() {
        let output = execute(&cli(&["--pdb", "/no/such/protein.pdb"]));
        assert_eq!(output, "Error: PDB file /no/such/protein.pdb not found");
    }

    #[test]
    fn test_detection_failure_message() {
        let pdb = test_data_dir().join("protein.pdb");
        let output = execute(&cli(&[
            "--pdb",
            pdb.to_str().expect("utf-8 path"),
            "--fpocket",
            "/no/such/fpocket",
        ]));

        assert_eq!(
            output,
            "Error in analysis: Pocket detection failed: /no/such/fpocket is not installed or not on PATH"
        );
    }

    #[test]
    fn test_bad_config_message() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = dir.path().join("bindsite.conf");
        std::fs::write(&config, "timeout_secs = soon\n").expect("write config");

        let output = execute(&cli(&["--config", config.to_str().expect("utf-8 path")]));
        assert!(output.starts_with("Error in analysis: Failed to load config file"));
        assert!(output.ends_with("Invalid value for timeout_secs: soon"));
    }

    #[cfg(unix)]
    mod with_stub_tools {
        use super::*;
        use std::fs;
        use std::os::unix::fs::PermissionsExt;
        use std::path::Path;

        /// Working directory holding the structure, the ligand and an fpocket
        /// stand-in that writes the fixture report
        fn workspace() -> tempfile::TempDir {
            let dir = tempfile::tempdir().expect("temp dir");
            fs::copy(
                test_data_dir().join("protein.pdb"),
                dir.path().join("protein.pdb"),
            )
            .expect("copy structure");
            fs::copy(
                test_data_dir().join("ligand.mol2"),
                dir.path().join("ligand.mol2"),
            )
            .expect("copy ligand");

            let script = dir.path().join("fpocket");
            fs::write(
                &script,
                format!(
                    "#!/bin/sh\nmkdir -p \"{dir}/protein_out\"\ncp \"{report}\" \"{dir}/protein_out/protein_info.txt\"\n",
                    dir = dir.path().display(),
                    report = test_data_dir().join("protein_info.txt").display()
                ),
            )
            .expect("write script");
            let mut permissions = fs::metadata(&script).expect("metadata").permissions();
            permissions.set_mode(0o755);
            fs::set_permissions(&script, permissions).expect("chmod");

            dir
        }

        fn args(dir: &Path) -> Vec<String> {
            let path = |name: &str| dir.join(name).display().to_string();
            vec![
                "--pdb".to_string(),
                path("protein.pdb"),
                "--ligand".to_string(),
                path("ligand.mol2"),
                "--fpocket".to_string(),
                path("fpocket"),
                "--dssp".to_string(),
                "/no/such/mkdssp".to_string(),
                "--work-dir".to_string(),
                dir.display().to_string(),
            ]
        }

        #[test]
        fn test_results_block() {
            let dir = workspace();
            let args = args(dir.path());
            let args: Vec<&str> = args.iter().map(String::as_str).collect();

            let output = execute(&cli(&args));

            assert_eq!(
                output,
                "\nCompatibility analysis results:\n\
                 pocket_volume: 4.222\n\
                 pocket_score: 0.021\n\
                 binding_site_rank: 1\n\
                 total_pockets_found: 3"
            );
        }

        #[test]
        fn test_out_of_range_pocket() {
            let dir = workspace();
            let mut args = args(dir.path());
            args.extend(["--pocket".to_string(), "3".to_string()]);
            let args: Vec<&str> = args.iter().map(String::as_str).collect();

            let output = execute(&cli(&args));
            assert_eq!(output, "Error in analysis: Invalid pocket ID: 3");
        }

        #[test]
        fn test_json_output() {
            let dir = workspace();
            let mut args = args(dir.path());
            args.push("--json".to_string());
            let args: Vec<&str> = args.iter().map(String::as_str).collect();

            let output = execute(&cli(&args));
            let json: serde_json::Value = serde_json::from_str(&output).expect("valid JSON");

            assert_eq!(json["pockets_found"], 3);
            assert_eq!(json["compatibility"]["binding_site_rank"], 1);
            assert!(json["flexibility"]["secondary_structure"].is_null());
        }
    }
}
