//! Metric record normalization.
//!
//! Turns a raw MRIQC record into a [`NormalizedRow`]: pull the acquisition
//! metadata, drop provenance and geometry fields, inject the identifying
//! columns and derive the report URL.

use serde::Deserialize;
use std::path::Path;
use tracing::debug;

use super::source_url::derive_source_url;
use super::types::{AcquisitionMetadata, IdentifyingFields, MetricRecord, NormalizedRow};
use crate::config::RecordConfig;
use crate::Result;

/// Pull acquisition metadata out of the nested `bids_meta` block.
///
/// Returns `None` when the block is absent or is not an object.
pub fn extract_metadata(record: &MetricRecord) -> Option<AcquisitionMetadata> {
    let block = record.get(RecordConfig::METADATA_KEY)?;
    if !block.is_object() {
        return None;
    }
    AcquisitionMetadata::deserialize(block).ok()
}

/// Remove the metadata block, provenance, quality indices and geometry.
///
/// Returns the number of keys actually removed; absent keys are ignored.
pub fn strip_fields(record: &mut MetricRecord) -> usize {
    RecordConfig::DROPPED_KEYS
        .iter()
        .filter(|key| record.remove(key).is_some())
        .count()
}

/// Normalize a record read from `source`.
///
/// `source` is only used to derive the report URL; it is never opened.
pub fn normalize_record(mut record: MetricRecord, source: &Path) -> Result<NormalizedRow> {
    let source_url = derive_source_url(source)?;

    let metadata = extract_metadata(&record);
    match &metadata {
        Some(meta) => debug!(
            "{}: subject={:?} modality={:?} datatype={:?} suffix={:?}",
            source.display(),
            meta.subject_id,
            meta.modality,
            meta.datatype,
            meta.suffix
        ),
        None => debug!("{}: no {} block", source.display(), RecordConfig::METADATA_KEY),
    }

    let removed = strip_fields(&mut record);
    debug!("{}: dropped {} fields", source.display(), removed);

    let ids = IdentifyingFields::from_metadata(metadata.as_ref());
    Ok(NormalizedRow::assemble(
        ids,
        &record,
        source_url.to_string_lossy().into_owned(),
    ))
}
