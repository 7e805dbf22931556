//! Types for metric records and their normalized tabular form.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::borrow::Cow;
use std::io::Write;

use crate::config::RecordConfig;
use crate::Result;

/// One MRIQC metric record, keys kept in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricRecord {
    fields: IndexMap<String, Value>,
}

impl MetricRecord {
    /// Parse a record from JSON text. The document must be an object.
    ///
    /// Bare `NaN`, `Infinity` and `-Infinity` values are read as `null`.
    pub fn from_json_str(text: &str) -> serde_json::Result<Self> {
        let fields: IndexMap<String, Value> = serde_json::from_str(&null_non_finite(text))?;
        Ok(Self { fields })
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Remove a key, keeping the order of the remaining fields.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.shift_remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

const NON_FINITE_TOKENS: [&str; 3] = ["-Infinity", "Infinity", "NaN"];

/// Replace non-finite number tokens outside of string literals with `null`.
fn null_non_finite(text: &str) -> Cow<'_, str> {
    if !NON_FINITE_TOKENS.iter().any(|token| text.contains(token)) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
        } else if let Some(token) = NON_FINITE_TOKENS.iter().find(|t| rest.starts_with(**t)) {
            out.push_str("null");
            rest = &rest[token.len()..];
            continue;
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }

    Cow::Owned(out)
}

/// Acquisition metadata pulled from the nested `bids_meta` block.
///
/// Absent sub-fields are empty strings; unlisted sub-fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AcquisitionMetadata {
    #[serde(rename = "subject", default, deserialize_with = "scalar_text")]
    pub subject_id: String,
    #[serde(default, deserialize_with = "scalar_text")]
    pub modality: String,
    #[serde(default, deserialize_with = "scalar_text")]
    pub datatype: String,
    #[serde(default, deserialize_with = "scalar_text")]
    pub suffix: String,
}

fn scalar_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(render_cell(&value))
}

/// The four identifying columns placed at the front of every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifyingFields {
    pub subject_id: String,
    pub session: String,
    pub task: String,
    pub run: String,
}

impl IdentifyingFields {
    /// Session, task and run have no source in the current record shape.
    pub fn from_metadata(metadata: Option<&AcquisitionMetadata>) -> Self {
        Self {
            subject_id: metadata.map(|m| m.subject_id.clone()).unwrap_or_default(),
            ..Default::default()
        }
    }

    fn into_cells(self) -> [String; 4] {
        [self.subject_id, self.session, self.task, self.run]
    }
}

/// Render a JSON value as a single table cell.
///
/// Strings are written verbatim, `null` as an empty cell, booleans in the
/// capitalized form the NIDM tooling reads, and containers as compact JSON.
pub fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// A single-row table with a fixed leading and trailing column set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRow {
    columns: Vec<String>,
    cells: Vec<String>,
}

impl NormalizedRow {
    /// Lay out identifying columns, then the remaining metrics in record
    /// order, then the source URL.
    ///
    /// A metric that reuses a reserved column name is dropped in favour of the
    /// injected value, so every column appears exactly once.
    pub fn assemble(ids: IdentifyingFields, metrics: &MetricRecord, source_url: String) -> Self {
        let capacity = metrics.len() + RecordConfig::IDENTIFYING_COLUMNS.len() + 1;
        let mut columns = Vec::with_capacity(capacity);
        let mut cells = Vec::with_capacity(capacity);

        for (column, cell) in RecordConfig::IDENTIFYING_COLUMNS
            .iter()
            .zip(ids.into_cells())
        {
            columns.push(column.to_string());
            cells.push(cell);
        }

        for (key, value) in metrics.iter().filter(|(key, _)| !is_reserved_column(key)) {
            columns.push(key.to_string());
            cells.push(render_cell(value));
        }

        columns.push(RecordConfig::SOURCE_URL_COLUMN.to_string());
        cells.push(source_url);

        Self { columns, cells }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Look up a cell by column name.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| self.cells[i].as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Write the header line and the data line, without an index column.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::WriterBuilder::new()
            .delimiter(RecordConfig::DELIMITER)
            .from_writer(writer);
        csv.write_record(&self.columns)?;
        csv.write_record(&self.cells)?;
        csv.flush()?;
        Ok(())
    }
}

fn is_reserved_column(key: &str) -> bool {
    key == RecordConfig::SOURCE_URL_COLUMN || RecordConfig::IDENTIFYING_COLUMNS.contains(&key)
}
