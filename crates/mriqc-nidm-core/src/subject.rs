//! Per-subject orchestration.
//!
//! For one subject, every metric JSON under `<input>/sub-<id>/anat/` is
//! normalized into `<output>/sub-<id>/semantic/<stem>.csv` and then handed to
//! the semantic converter to produce `<stem>.ttl`. A failing file is logged
//! and skipped; only a missing input directory fails the subject.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::config::{PathsConfig, ReferenceDictionaries};
use crate::converter::SemanticConverter;
use crate::discovery::subject_dir;
use crate::error::IoResultExt;
use crate::record::transform_logged;
use crate::{NidmError, Result};

/// What happened to one metric file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Both the table and the graph were written.
    Converted { table: PathBuf, graph: PathBuf },
    /// The record could not be read, normalized or written.
    TransformFailed { reason: String },
    /// The table was written but the converter failed.
    ConversionFailed { table: PathBuf, reason: String },
}

/// Outcome for one metric file of a subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub source: PathBuf,
    pub outcome: FileOutcome,
}

impl FileReport {
    pub fn is_converted(&self) -> bool {
        matches!(self.outcome, FileOutcome::Converted { .. })
    }
}

/// Subject-level status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectStatus {
    /// The anatomical directory was found and its files were attempted.
    Processed,
    /// The subject or its anatomical directory does not exist.
    NotFound(PathBuf),
    /// The input could not be listed or the output could not be prepared.
    Failed(String),
}

/// Result of processing one subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectReport {
    pub subject: String,
    pub status: SubjectStatus,
    pub files: Vec<FileReport>,
}

impl SubjectReport {
    fn new(subject: &str, status: SubjectStatus) -> Self {
        Self {
            subject: subject.to_string(),
            status,
            files: Vec::new(),
        }
    }

    /// A processed subject counts as succeeded even when some of its files
    /// were skipped; see [`SubjectReport::skipped`].
    pub fn succeeded(&self) -> bool {
        self.status == SubjectStatus::Processed
    }

    pub fn converted(&self) -> usize {
        self.files.iter().filter(|f| f.is_converted()).count()
    }

    pub fn skipped(&self) -> usize {
        self.files.len() - self.converted()
    }
}

/// Processes subjects of one MRIQC result tree into one output tree.
pub struct SubjectProcessor<'a> {
    input_root: &'a Path,
    output_root: &'a Path,
    converter: &'a dyn SemanticConverter,
    dictionaries: &'a ReferenceDictionaries,
}

impl<'a> SubjectProcessor<'a> {
    pub fn new(
        input_root: &'a Path,
        output_root: &'a Path,
        converter: &'a dyn SemanticConverter,
        dictionaries: &'a ReferenceDictionaries,
    ) -> Self {
        Self {
            input_root,
            output_root,
            converter,
            dictionaries,
        }
    }

    /// `<input>/sub-<id>/anat`
    pub fn anat_dir(&self, subject: &str) -> PathBuf {
        subject_dir(self.input_root, subject).join(PathsConfig::ANAT_DIR_NAME)
    }

    /// `<output>/sub-<id>/semantic`
    pub fn semantic_dir(&self, subject: &str) -> PathBuf {
        subject_dir(self.output_root, subject).join(PathsConfig::SEMANTIC_DIR_NAME)
    }

    /// Process every anatomical metric file of `subject`.
    pub fn process(&self, subject: &str) -> SubjectReport {
        let anat_dir = self.anat_dir(subject);
        for required in [subject_dir(self.input_root, subject), anat_dir.clone()] {
            if !required.is_dir() {
                error!("{}", NidmError::SubjectNotFound(required.clone()));
                return SubjectReport::new(subject, SubjectStatus::NotFound(required));
            }
        }

        let metric_files = match find_metric_files(&anat_dir) {
            Ok(files) => files,
            Err(e) => {
                error!("Error processing subject {}: {}", subject, e);
                return SubjectReport::new(subject, SubjectStatus::Failed(e.to_string()));
            }
        };

        let mut report = SubjectReport::new(subject, SubjectStatus::Processed);
        if metric_files.is_empty() {
            warn!("No metric files in {}", anat_dir.display());
            return report;
        }

        let out_dir = self.semantic_dir(subject);
        if let Err(e) = fs::create_dir_all(&out_dir).with_path(&out_dir) {
            error!("Error processing subject {}: {}", subject, e);
            report.status = SubjectStatus::Failed(e.to_string());
            return report;
        }

        for json_path in metric_files {
            let outcome = self.process_file(&json_path, &out_dir);
            report.files.push(FileReport {
                source: json_path,
                outcome,
            });
        }

        info!(
            "Subject {}: {} converted, {} skipped",
            subject,
            report.converted(),
            report.skipped()
        );
        report
    }

    fn process_file(&self, json_path: &Path, out_dir: &Path) -> FileOutcome {
        let stem = json_path.file_stem().unwrap_or_default().to_string_lossy();
        let table = out_dir.join(format!("{}.{}", stem, PathsConfig::TABLE_EXTENSION));
        let graph = out_dir.join(format!("{}.{}", stem, PathsConfig::GRAPH_EXTENSION));

        if let Err(e) = transform_logged(json_path, &table) {
            return FileOutcome::TransformFailed {
                reason: e.to_string(),
            };
        }

        match self.converter.convert(&table, self.dictionaries, &graph) {
            Ok(()) => {
                info!("Created NIDM file: {}", graph.display());
                FileOutcome::Converted { table, graph }
            }
            Err(e) => {
                error!(
                    "Failed to convert {} to NIDM with {}: {}",
                    table.display(),
                    self.converter.name(),
                    e
                );
                FileOutcome::ConversionFailed {
                    table,
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// List the metric JSON files directly inside `anat_dir`, sorted by name.
pub fn find_metric_files(anat_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(anat_dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| NidmError::Discovery {
            path: anat_dir.to_path_buf(),
            message: e.to_string(),
        })?;

        let is_metric = entry.file_type().is_file()
            && entry
                .path()
                .extension()
                .is_some_and(|ext| ext == PathsConfig::METRIC_EXTENSION);
        if is_metric {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}
