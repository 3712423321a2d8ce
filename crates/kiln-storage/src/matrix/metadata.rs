//! Matrix descriptor document (the YAML sidecar next to the data file).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{StorageError, StorageResult};

/// Column holding the entity identifier.
pub const ENTITY_ID_COLUMN: &str = "entity_id";

/// Column holding the as-of timestamp.
pub const AS_OF_DATE_COLUMN: &str = "as_of_date";

/// Default composite key, in order.
pub const DEFAULT_INDICES: [&str; 2] = [ENTITY_ID_COLUMN, AS_OF_DATE_COLUMN];

/// Role of a matrix in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatrixType {
    Train,
    Test,
    Production,
}

impl MatrixType {
    /// Whether the matrix is scored rather than trained on.
    pub fn is_test(&self) -> bool {
        matches!(self, Self::Test | Self::Production)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Test => "test",
            Self::Production => "production",
        }
    }
}

/// Parsed descriptor.
///
/// Only `label_name` is required. Keys this type does not model are kept in
/// `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixMetadata {
    pub label_name: String,

    /// Index column override: `[entity column, as-of column]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indices: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matrix_type: Option<MatrixType>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl MatrixMetadata {
    pub fn new(label_name: impl Into<String>) -> Self {
        Self {
            label_name: label_name.into(),
            indices: None,
            matrix_type: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_indices<I, S>(mut self, indices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.indices = Some(indices.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_matrix_type(mut self, matrix_type: MatrixType) -> Self {
        self.matrix_type = Some(matrix_type);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: serde_yaml::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// The `(entity, as-of)` index column names.
    pub fn index_columns(&self) -> Result<(&str, &str), String> {
        match self.indices.as_deref() {
            None => Ok((DEFAULT_INDICES[0], DEFAULT_INDICES[1])),
            Some([entity, as_of]) => {
                if entity == as_of {
                    Err(format!("indices name the same column twice: {}", entity))
                } else {
                    Ok((entity.as_str(), as_of.as_str()))
                }
            }
            Some(other) => Err(format!(
                "indices must name exactly 2 columns, got {}",
                other.len()
            )),
        }
    }

    /// Parse a descriptor document.
    pub fn from_yaml(bytes: &[u8], location: &str) -> StorageResult<Self> {
        serde_yaml::from_slice(bytes).map_err(|e| StorageError::decode(location, e))
    }

    /// Render the descriptor document.
    pub fn to_yaml(&self) -> StorageResult<String> {
        serde_yaml::to_string(self).map_err(|e| StorageError::Encode {
            reason: format!("failed to serialize matrix metadata: {}", e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_descriptor() {
        let meta = MatrixMetadata::from_yaml(b"label_name: label\n", "m.yaml").unwrap();
        assert_eq!(meta, MatrixMetadata::new("label"));
        assert_eq!(meta.index_columns().unwrap(), ("entity_id", "as_of_date"));
    }

    #[test]
    fn test_missing_label_name_is_decode_error() {
        let err = MatrixMetadata::from_yaml(b"indices: [a, b]\n", "m.yaml").unwrap_err();
        assert!(err.is_decode());
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let err = MatrixMetadata::from_yaml(&[0xff, 0xfe, b':', b'['], "m.yaml").unwrap_err();
        assert!(err.is_decode());
    }

    #[test]
    fn test_indices_override() {
        let yaml = b"label_name: outcome\nindices: [person_id, event_date]\n";
        let meta = MatrixMetadata::from_yaml(yaml, "m.yaml").unwrap();
        assert_eq!(meta.index_columns().unwrap(), ("person_id", "event_date"));
    }

    #[test]
    fn test_wrong_index_arity_rejected() {
        let meta = MatrixMetadata::new("label").with_indices(["entity_id"]);
        assert!(meta.index_columns().is_err());
        let meta = MatrixMetadata::new("label").with_indices(["a", "a"]);
        assert!(meta.index_columns().is_err());
    }

    #[test]
    fn test_extra_keys_roundtrip() {
        let yaml = b"label_name: label\nmatrix_type: train\nfeature_start_time: '2012-01-01'\nlabel_config:\n  timespan: 6month\n  query: select 1\n";
        let meta = MatrixMetadata::from_yaml(yaml, "m.yaml").unwrap();
        assert_eq!(meta.matrix_type, Some(MatrixType::Train));
        assert_eq!(meta.extra.len(), 2);
        assert!(meta.extra.contains_key("label_config"));

        let rendered = meta.to_yaml().unwrap();
        let reparsed = MatrixMetadata::from_yaml(rendered.as_bytes(), "m.yaml").unwrap();
        assert_eq!(reparsed, meta);
    }

    #[test]
    fn test_unknown_matrix_type_is_decode_error() {
        let err = MatrixMetadata::from_yaml(b"label_name: l\nmatrix_type: validation\n", "m.yaml")
            .unwrap_err();
        assert!(err.is_decode());
    }

    #[test]
    fn test_default_indices_not_written() {
        let rendered = MatrixMetadata::new("label").to_yaml().unwrap();
        assert_eq!(rendered.trim(), "label_name: label");
    }

    #[test]
    fn test_is_test() {
        assert!(!MatrixType::Train.is_test());
        assert!(MatrixType::Test.is_test());
        assert!(MatrixType::Production.is_test());
    }
}
