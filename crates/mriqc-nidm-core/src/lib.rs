//! MRIQC NIDM Core - converts MRIQC quality metrics into NIDM-ready tables.
//!
//! This crate implements the per-subject batch job behind the `mriqc-nidm`
//! BIDS app. It can be used programmatically without the CLI.
//!
//! - [`discovery`] resolves subject labels from the MRIQC result tree.
//! - [`record`] normalizes one metric JSON into a single-row CSV.
//! - [`converter`] hands the CSV to `csv2nidm` (or any [`SemanticConverter`]).
//! - [`subject`] and [`run`] orchestrate the above per subject and per run.
//!
//! # Example
//!
//! ```rust,no_run
//! use mriqc_nidm_core::{run, Csv2Nidm, RunOptions};
//!
//! let options = RunOptions::new("/data/mriqc", "/data/nidm").with_participant_label("01 02");
//! let summary = run(&options, &Csv2Nidm::default())?;
//! println!("{} files converted", summary.files_converted());
//! # Ok::<(), mriqc_nidm_core::NidmError>(())
//! ```

pub mod config;
pub mod converter;
pub mod discovery;
pub mod error;
pub mod record;
pub mod run;
pub mod subject;

// Re-export commonly used types
pub use config::{ReferenceDictionaries, RunOptions};
pub use converter::{Csv2Nidm, SemanticConverter};
pub use error::{NidmError, Result};
pub use record::{convert_record_file, MetricRecord, NormalizedRow};
pub use run::{run, RunSummary};
pub use subject::{FileOutcome, FileReport, SubjectProcessor, SubjectReport, SubjectStatus};
