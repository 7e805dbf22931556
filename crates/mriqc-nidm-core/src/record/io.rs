//! Reading metric records and writing normalized rows.
//!
//! Rows are written to a temp file next to the target and renamed into place,
//! so a failed write never leaves a partial table behind.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use super::transform::normalize_record;
use super::types::{MetricRecord, NormalizedRow};
use crate::error::IoResultExt;
use crate::{NidmError, Result};

/// Read and parse one metric record.
pub fn read_record(path: &Path) -> Result<MetricRecord> {
    let text = fs::read_to_string(path).with_path(path)?;
    MetricRecord::from_json_str(&text).map_err(|e| NidmError::MalformedRecord {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Write a normalized row to `path`.
pub fn write_row(row: &NormalizedRow, path: &Path) -> Result<()> {
    let temp_path = temp_path_for(path);

    let written = File::create(&temp_path)
        .with_path(&temp_path)
        .and_then(|file| row.write_csv(BufWriter::new(file)));

    if let Err(e) = written {
        if let Err(cleanup) = fs::remove_file(&temp_path) {
            warn!("Failed to remove {}: {}", temp_path.display(), cleanup);
        }
        return Err(e);
    }

    fs::rename(&temp_path, path).with_path(path)
}

/// Read, normalize and write one metric file.
pub fn transform_record_file(json_path: &Path, csv_path: &Path) -> Result<NormalizedRow> {
    let record = read_record(json_path)?;
    let row = normalize_record(record, json_path)?;
    write_row(&row, csv_path)?;
    Ok(row)
}

/// Convert one MRIQC JSON file into a single-row CSV.
///
/// Errors are logged with the offending path and reported as `false`; they
/// never propagate to the caller.
pub fn convert_record_file(json_path: &Path, csv_path: &Path) -> bool {
    transform_logged(json_path, csv_path).is_ok()
}

/// Run [`transform_record_file`] and log its outcome.
pub(crate) fn transform_logged(json_path: &Path, csv_path: &Path) -> Result<NormalizedRow> {
    match transform_record_file(json_path, csv_path) {
        Ok(row) => {
            info!(
                "Successfully converted {} to {}",
                json_path.display(),
                csv_path.display()
            );
            Ok(row)
        }
        Err(e) => {
            error!("Error converting {} to CSV: {}", json_path.display(), e);
            Err(e)
        }
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{}.tmp", std::process::id()));
    path.with_file_name(name)
}
