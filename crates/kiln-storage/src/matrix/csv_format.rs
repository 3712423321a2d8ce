//! Gzip-compressed CSV matrices with a YAML descriptor.
//!
//! The producer hands over plain CSV text with a header row holding the two
//! index columns, the feature columns and the label column, in any order.
//! Values are expected to be in final form already; this format compresses
//! on write and validates structure on read, it never reshapes values.

use std::collections::HashSet;
use std::io::Read;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use super::format::MatrixFormat;
use super::frame::{DesignMatrix, IndexKey, LoadedMatrix};
use super::metadata::MatrixMetadata;
use crate::error::{StorageError, StorageResult};

/// Data file suffix.
pub const CSV_DATA_SUFFIX: &str = "csv.gz";

/// Descriptor file suffix.
pub const YAML_METADATA_SUFFIX: &str = "yaml";

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvFormat;

impl MatrixFormat for CsvFormat {
    fn data_suffix(&self) -> &str {
        CSV_DATA_SUFFIX
    }

    fn metadata_suffix(&self) -> &str {
        YAML_METADATA_SUFFIX
    }

    fn encode(&self, source: &mut dyn Read) -> StorageResult<Vec<u8>> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        std::io::copy(source, &mut encoder).map_err(|e| StorageError::Encode {
            reason: format!("failed to compress matrix: {}", e),
        })?;
        encoder.finish().map_err(|e| StorageError::Encode {
            reason: format!("failed to finish gzip stream: {}", e),
        })
    }

    fn decode(
        &self,
        payload: &[u8],
        metadata: &MatrixMetadata,
        location: &str,
    ) -> StorageResult<LoadedMatrix> {
        let err = |reason: String| StorageError::decode(location, reason);

        let (entity_col, as_of_col) = metadata.index_columns().map_err(err)?;
        let label_col = metadata.label_name.as_str();
        if label_col == entity_col || label_col == as_of_col {
            return Err(err(format!("label column '{}' is an index column", label_col)));
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(GzDecoder::new(payload));

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| err(format!("CSV header error: {}", e)))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut seen = HashSet::new();
        if let Some(dup) = headers.iter().find(|h| !seen.insert(h.as_str())) {
            return Err(err(format!("duplicate column '{}'", dup)));
        }

        let position = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| err(format!("missing column '{}'", name)))
        };
        let entity_pos = position(entity_col)?;
        let as_of_pos = position(as_of_col)?;
        let label_pos = position(label_col)?;

        let feature_pos: Vec<usize> = (0..headers.len())
            .filter(|i| ![entity_pos, as_of_pos, label_pos].contains(i))
            .collect();
        let columns: Vec<String> = feature_pos.iter().map(|&i| headers[i].clone()).collect();

        let mut index = Vec::new();
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        let mut keys = HashSet::new();

        for (row_no, record) in reader.records().enumerate() {
            let record = record.map_err(|e| err(format!("CSV record error: {}", e)))?;
            let field = |i: usize| record.get(i).unwrap_or("");
            let at = |what: &str, raw: &str| {
                err(format!("row {}: invalid {} '{}'", row_no + 1, what, raw))
            };

            let raw = field(entity_pos);
            let entity_id: i64 = raw.trim().parse().map_err(|_| at(entity_col, raw))?;
            let raw = field(as_of_pos);
            let as_of_date = parse_as_of(raw).ok_or_else(|| at(as_of_col, raw))?;

            let key = IndexKey::new(entity_id, as_of_date);
            if !keys.insert(key) {
                return Err(err(format!(
                    "row {}: duplicate index ({}, {})",
                    row_no + 1,
                    entity_id,
                    as_of_date
                )));
            }

            let values = feature_pos
                .iter()
                .map(|&i| {
                    let raw = field(i);
                    parse_value(raw).ok_or_else(|| at(headers[i].as_str(), raw))
                })
                .collect::<StorageResult<Vec<f64>>>()?;

            let raw = field(label_pos);
            let label = if raw.trim().is_empty() {
                None
            } else {
                Some(parse_value(raw).ok_or_else(|| at(label_col, raw))?)
            };

            index.push(key);
            rows.push(values);
            labels.push(label);
        }

        let design = DesignMatrix::new(
            (entity_col.to_string(), as_of_col.to_string()),
            index,
            columns,
            rows,
        );

        Ok(LoadedMatrix {
            design_matrix: Arc::new(design),
            labels: Arc::new(labels),
            label_name: label_col.to_string(),
        })
    }
}

/// Parse a date or timestamp cell. Dates become midnight.
fn parse_as_of(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Parse a numeric cell. An empty cell is NaN.
fn parse_value(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(f64::NAN);
    }
    raw.parse().ok()
}
