//! MRIQC metric record transformation.
//!
//! This module turns one MRIQC image-quality-metric JSON document into a
//! single-row table with a fixed column layout:
//!
//! `subject_id, session, task, run, <metrics in source order>, source_url`
//!
//! The nested `bids_meta` block supplies the subject, provenance and geometry
//! fields are dropped, and `source_url` points at the HTML report MRIQC wrote
//! for the same acquisition.

mod io;
mod source_url;
mod transform;
mod types;

pub(crate) use io::transform_logged;
pub use io::{convert_record_file, read_record, transform_record_file, write_row};
pub use source_url::derive_source_url;
pub use transform::{extract_metadata, normalize_record, strip_fields};
pub use types::{
    render_cell, AcquisitionMetadata, IdentifyingFields, MetricRecord, NormalizedRow,
};
