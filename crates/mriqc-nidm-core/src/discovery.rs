//! Subject discovery.
//!
//! Subjects come either from an explicit `--participant-label` list or from
//! the `sub-<label>` directories at the top of the MRIQC result tree.

use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;
use walkdir::WalkDir;

use crate::config::PathsConfig;
use crate::{NidmError, Result};

/// Subject directory names: `sub-` followed by an alphanumeric BIDS label.
static SUBJECT_DIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^sub-([A-Za-z0-9]+)$").unwrap());

/// Split a whitespace-delimited label list.
///
/// A leading `sub-` is stripped and duplicates are dropped, keeping the first
/// occurrence. Labels that would escape the input root are rejected.
pub fn parse_participant_labels(labels: &str) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut subjects = Vec::new();

    for raw in labels.split_whitespace() {
        let label = raw.strip_prefix(PathsConfig::SUBJECT_PREFIX).unwrap_or(raw);
        if label.is_empty() || label == "." || label == ".." || label.contains(['/', '\\']) {
            return Err(NidmError::Config {
                message: format!("invalid participant label: {raw:?}"),
            });
        }
        if seen.insert(label.to_string()) {
            subjects.push(label.to_string());
        }
    }

    Ok(subjects)
}

/// List subject labels from the `sub-*` directories directly under `input_root`.
pub fn scan_subjects(input_root: &Path) -> Result<Vec<String>> {
    let mut subjects = Vec::new();

    for entry in WalkDir::new(input_root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| NidmError::Discovery {
            path: input_root.to_path_buf(),
            message: e.to_string(),
        })?;

        if !entry.file_type().is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        match SUBJECT_DIR.captures(&name) {
            Some(caps) => subjects.push(caps[1].to_string()),
            None => debug!("Skipping non-subject directory {}", entry.path().display()),
        }
    }

    Ok(subjects)
}

/// Resolve the subjects for a run.
///
/// An explicit label list takes precedence over scanning the input root.
pub fn resolve_subjects(
    input_root: &Path,
    participant_label: Option<&str>,
) -> Result<Vec<String>> {
    match participant_label {
        Some(labels) => parse_participant_labels(labels),
        None => scan_subjects(input_root),
    }
}

/// `<root>/sub-<label>`
pub fn subject_dir(root: &Path, subject: &str) -> PathBuf {
    root.join(format!("{}{}", PathsConfig::SUBJECT_PREFIX, subject))
}
