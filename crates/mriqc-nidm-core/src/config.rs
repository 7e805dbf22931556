//! Centralized configuration for the MRIQC to NIDM converter.
//!
//! This module provides the naming conventions of the MRIQC result tree, the
//! metric-record schema, and the defaults for the external `csv2nidm` tool.

use std::path::{Path, PathBuf};

/// Application-level configuration.
pub struct AppConfig;

impl AppConfig {
    pub const LOG_FILE_PREFIX: &'static str = "mriqc-nidm";
    pub const LOG_TIMESTAMP_FORMAT: &'static str = "%Y%m%d-%H%M%S";
}

/// Directory and file naming conventions for input and output trees.
pub struct PathsConfig;

impl PathsConfig {
    pub const SUBJECT_PREFIX: &'static str = "sub-";
    pub const ANAT_DIR_NAME: &'static str = "anat";
    pub const SEMANTIC_DIR_NAME: &'static str = "semantic";
    pub const LOGS_DIR_NAME: &'static str = "logs";
    pub const METRIC_EXTENSION: &'static str = "json";
    pub const TABLE_EXTENSION: &'static str = "csv";
    pub const GRAPH_EXTENSION: &'static str = "ttl";
}

/// Schema of the normalized metric row.
pub struct RecordConfig;

impl RecordConfig {
    /// Nested block carrying BIDS acquisition metadata.
    pub const METADATA_KEY: &'static str = "bids_meta";

    /// Keys removed from every record before tabulation.
    pub const DROPPED_KEYS: &'static [&'static str] = &[
        "bids_meta",
        "provenance",
        "qi_1",
        "qi_2",
        "size_x",
        "size_y",
        "size_z",
        "spacing_x",
        "spacing_y",
        "spacing_z",
    ];

    /// Leading identifying columns, in output order.
    pub const IDENTIFYING_COLUMNS: [&'static str; 4] = ["subject_id", "session", "task", "run"];

    /// Trailing derived column.
    pub const SOURCE_URL_COLUMN: &'static str = "source_url";

    /// Extension of the per-acquisition HTML report the source URL points at.
    pub const REPORT_EXTENSION: &'static str = "html";

    pub const DELIMITER: u8 = b',';
}

/// Defaults for the external semantic converter.
pub struct ConverterConfig;

impl ConverterConfig {
    pub const DEFAULT_PROGRAM: &'static str = "csv2nidm";
    pub const DEFAULT_FIELD_MAP: &'static str = "/opt/mriqc-nidm/mriqc_dictionary_v1.csv";
    pub const DEFAULT_SOFTWARE_METADATA: &'static str =
        "/opt/mriqc-nidm/mriqc_software_metadata.csv";

    pub const CSV_FLAG: &'static str = "-csv";
    pub const FIELD_MAP_FLAG: &'static str = "-csv_map";
    pub const NO_CONCEPTS_FLAG: &'static str = "-no_concepts";
    pub const DERIVATIVE_FLAG: &'static str = "-derivative";
    pub const OUTPUT_FLAG: &'static str = "-out";
}

/// The two static reference dictionaries handed to the converter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceDictionaries {
    /// Maps metric columns onto NIDM terms.
    pub field_map: PathBuf,
    /// Describes the software that produced the metrics.
    pub software_metadata: PathBuf,
}

impl ReferenceDictionaries {
    pub fn new(field_map: impl Into<PathBuf>, software_metadata: impl Into<PathBuf>) -> Self {
        Self {
            field_map: field_map.into(),
            software_metadata: software_metadata.into(),
        }
    }

    pub fn field_map(&self) -> &Path {
        &self.field_map
    }

    pub fn software_metadata(&self) -> &Path {
        &self.software_metadata
    }
}

impl Default for ReferenceDictionaries {
    fn default() -> Self {
        Self::new(
            ConverterConfig::DEFAULT_FIELD_MAP,
            ConverterConfig::DEFAULT_SOFTWARE_METADATA,
        )
    }
}

/// Inputs for one conversion run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Root of the MRIQC result tree.
    pub input_root: PathBuf,
    /// Root of the output tree.
    pub output_root: PathBuf,
    /// Whitespace-delimited subject labels; scan the input root when `None`.
    pub participant_label: Option<String>,
    pub dictionaries: ReferenceDictionaries,
}

impl RunOptions {
    pub fn new(input_root: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            input_root: input_root.into(),
            output_root: output_root.into(),
            participant_label: None,
            dictionaries: ReferenceDictionaries::default(),
        }
    }

    pub fn with_participant_label(mut self, label: impl Into<String>) -> Self {
        self.participant_label = Some(label.into());
        self
    }

    pub fn with_dictionaries(mut self, dictionaries: ReferenceDictionaries) -> Self {
        self.dictionaries = dictionaries;
        self
    }

    /// `<output_root>/logs`
    pub fn logs_dir(&self) -> PathBuf {
        self.output_root.join(PathsConfig::LOGS_DIR_NAME)
    }
}
