//! Source-document URL derivation.
//!
//! MRIQC writes one HTML report per acquisition next to the subject
//! directory: `<root>/sub-X/anat/<stem>.json` has its report at
//! `<root>/sub-X/sub-X_<stem>.html`. The URL is computed from the path alone.

use std::path::{Component, Path, PathBuf};

use crate::config::RecordConfig;
use crate::{NidmError, Result};

/// Number of trailing components the layout needs: subject, datatype, file.
const MIN_COMPONENTS: usize = 3;

/// Derive the report URL for a metric file.
///
/// The report lives in the grandparent directory and is named after the
/// subject segment (third-from-last component) and the file stem.
pub fn derive_source_url(path: &Path) -> Result<PathBuf> {
    let components: Vec<Component<'_>> = path.components().collect();
    if components.len() < MIN_COMPONENTS {
        return Err(shallow(
            path,
            format!(
                "expected at least {MIN_COMPONENTS} path components, found {}",
                components.len()
            ),
        ));
    }

    let subject_segment = match components[components.len() - MIN_COMPONENTS] {
        Component::Normal(segment) => segment.to_string_lossy(),
        _ => {
            return Err(shallow(
                path,
                "third-from-last component is not a directory name".to_string(),
            ))
        }
    };

    let stem = path
        .file_stem()
        .ok_or_else(|| shallow(path, "path has no file name".to_string()))?
        .to_string_lossy();

    let report_dir = path
        .parent()
        .and_then(Path::parent)
        .ok_or_else(|| shallow(path, "path has no grandparent directory".to_string()))?;

    Ok(report_dir.join(format!(
        "{}_{}.{}",
        subject_segment,
        stem,
        RecordConfig::REPORT_EXTENSION
    )))
}

fn shallow(path: &Path, reason: String) -> NidmError {
    NidmError::SourceUrl {
        path: path.to_path_buf(),
        reason,
    }
}
