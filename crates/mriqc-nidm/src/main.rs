//! MRIQC to NIDM converter BIDS app.
//!
//! Takes an MRIQC output directory and converts each subject's image quality
//! metrics into NIDM documents using `csv2nidm`.

mod logging;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use mriqc_nidm_core::config::ConverterConfig;
use mriqc_nidm_core::{run, Csv2Nidm, ReferenceDictionaries, RunOptions};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

/// BIDS app analysis level. Only participant-level runs are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum AnalysisLevel {
    Participant,
}

#[derive(Parser, Debug)]
#[command(name = "mriqc-nidm", version)]
#[command(about = "MRIQC to NIDM converter BIDS App")]
struct Args {
    /// The directory containing MRIQC output
    mriqc_dir: PathBuf,

    /// The directory where NIDM files should be stored
    output_dir: PathBuf,

    /// Processing level
    #[arg(value_enum)]
    analysis_level: AnalysisLevel,

    /// The label(s) of the participant(s) to analyze, space separated
    #[arg(long)]
    participant_label: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// csv2nidm executable
    #[arg(long, default_value = ConverterConfig::DEFAULT_PROGRAM)]
    converter: PathBuf,

    /// Dictionary mapping MRIQC metrics to NIDM terms
    #[arg(long, default_value = ConverterConfig::DEFAULT_FIELD_MAP)]
    field_map: PathBuf,

    /// Software metadata describing the MRIQC derivative
    #[arg(long, default_value = ConverterConfig::DEFAULT_SOFTWARE_METADATA)]
    software_metadata: PathBuf,
}

impl Args {
    fn run_options(&self) -> RunOptions {
        let mut options = RunOptions::new(&self.mriqc_dir, &self.output_dir).with_dictionaries(
            ReferenceDictionaries::new(&self.field_map, &self.software_metadata),
        );
        if let Some(labels) = &self.participant_label {
            options = options.with_participant_label(labels.clone());
        }
        options
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    match execute(&args) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("mriqc-nidm: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Set up logging and run the conversion, returning the process exit status.
fn execute(args: &Args) -> Result<u8> {
    let options = args.run_options();
    let log = logging::init(&options.logs_dir(), args.verbose)?;

    info!("Starting MRIQC to NIDM conversion");
    info!("Run log: {}", log.path().display());
    info!("Analysis level: {:?}", args.analysis_level);

    let converter = Csv2Nidm::new(&args.converter);
    match run(&options, &converter) {
        Ok(summary) => Ok(summary.exit_code()),
        Err(e) => {
            error!("{}", e);
            Ok(1)
        }
    }
}
