//! Run controller.
//!
//! Resolves the subjects of a run and processes them one after another. A
//! failing subject degrades the final status but never stops the run.

use tracing::{error, info};

use crate::config::RunOptions;
use crate::converter::SemanticConverter;
use crate::discovery::resolve_subjects;
use crate::subject::{SubjectProcessor, SubjectReport};
use crate::{NidmError, Result};

/// Aggregate outcome of a run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub subjects: Vec<SubjectReport>,
}

impl RunSummary {
    /// True when every subject succeeded.
    pub fn succeeded(&self) -> bool {
        self.subjects.iter().all(SubjectReport::succeeded)
    }

    pub fn failed_subjects(&self) -> Vec<&str> {
        self.subjects
            .iter()
            .filter(|s| !s.succeeded())
            .map(|s| s.subject.as_str())
            .collect()
    }

    pub fn files_converted(&self) -> usize {
        self.subjects.iter().map(SubjectReport::converted).sum()
    }

    pub fn files_skipped(&self) -> usize {
        self.subjects.iter().map(SubjectReport::skipped).sum()
    }

    /// Process exit status: 0 on full success, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.succeeded() {
            0
        } else {
            1
        }
    }
}

/// Convert every resolved subject of `options` with `converter`.
///
/// Fails only when no subjects can be resolved; per-subject problems are
/// reported through the returned summary.
pub fn run(options: &RunOptions, converter: &dyn SemanticConverter) -> Result<RunSummary> {
    let subjects = resolve_subjects(&options.input_root, options.participant_label.as_deref())?;
    if subjects.is_empty() {
        error!("No subjects found to process");
        return Err(NidmError::NoSubjects);
    }
    info!("Resolved {} subject(s)", subjects.len());

    let processor = SubjectProcessor::new(
        &options.input_root,
        &options.output_root,
        converter,
        &options.dictionaries,
    );

    let mut summary = RunSummary::default();
    for subject in &subjects {
        info!("Processing subject: {}", subject);
        summary.subjects.push(processor.process(subject));
    }

    info!(
        "Processed {} subject(s): {} file(s) converted, {} skipped",
        summary.subjects.len(),
        summary.files_converted(),
        summary.files_skipped()
    );
    if summary.succeeded() {
        info!("MRIQC to NIDM conversion completed successfully");
    } else {
        error!(
            "Some subjects failed to process: {}",
            summary.failed_subjects().join(", ")
        );
    }

    Ok(summary)
}
