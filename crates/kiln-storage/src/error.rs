//! Error types for matrix and model storage operations.

use std::fmt;

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// How a requested column ordering failed to match the stored feature columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnMismatchKind {
    /// Fewer columns were requested than the matrix holds.
    Subset,
    /// More columns were requested than the matrix holds.
    Superset,
    /// Same number of columns, different membership.
    Mismatch,
}

impl fmt::Display for ColumnMismatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Subset => "requested columns are a subset of the matrix columns",
            Self::Superset => "requested columns are a superset of the matrix columns",
            Self::Mismatch => "requested columns differ from the matrix columns",
        };
        f.write_str(s)
    }
}

/// Errors that can occur while storing or loading matrices and models.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Nothing is stored at the location.
    #[error("not found: {location}")]
    NotFound { location: String },

    /// A requested column ordering is not a permutation of the feature columns.
    #[error("{kind}: requested {requested:?}, matrix has {actual:?}")]
    ColumnMismatch {
        kind: ColumnMismatchKind,
        requested: Vec<String>,
        actual: Vec<String>,
    },

    /// Stored bytes could not be parsed into the expected structure.
    #[error("failed to decode {location}: {reason}")]
    Decode { location: String, reason: String },

    /// An object could not be serialized for storage.
    #[error("failed to encode: {reason}")]
    Encode { reason: String },

    /// Local filesystem failure.
    #[error("I/O error at {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },

    /// Object storage failure.
    #[error("object store error at {location}: {source}")]
    ObjectStore {
        location: String,
        #[source]
        source: object_store::Error,
    },

    /// The project root could not be turned into a backend.
    #[error("invalid project root '{root}': {reason}")]
    InvalidRoot { root: String, reason: String },
}

impl StorageError {
    /// Returns true if nothing was stored at the requested location.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if a column ordering request was rejected.
    pub fn is_column_mismatch(&self) -> bool {
        matches!(self, Self::ColumnMismatch { .. })
    }

    /// Returns true if stored bytes were corrupt or in an unexpected format.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }

    /// Returns true for transport-level failures from either backend.
    pub fn is_backend(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::ObjectStore { .. })
    }

    /// Suggested exit code for CLI: 2 when nothing is stored, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } => 2,
            _ => 1,
        }
    }

    pub(crate) fn decode(location: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Decode {
            location: location.into(),
            reason: reason.to_string(),
        }
    }

    /// Map a filesystem error, turning a missing file into `NotFound`.
    pub(crate) fn from_io(err: std::io::Error, location: &str) -> Self {
        if is_absent(&err) {
            return Self::NotFound {
                location: location.to_string(),
            };
        }
        Self::Io {
            location: location.to_string(),
            source: err,
        }
    }

    /// Map an object store error, turning a missing object into `NotFound`.
    pub(crate) fn from_object_store(err: object_store::Error, location: &str) -> Self {
        match err {
            object_store::Error::NotFound { .. } => Self::NotFound {
                location: location.to_string(),
            },
            source => Self::ObjectStore {
                location: location.to_string(),
                source,
            },
        }
    }
}

/// True if the error means nothing is stored at the path, including when a
/// parent component is a regular file.
pub(crate) fn is_absent(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        std::io::ErrorKind::NotFound | std::io::ErrorKind::NotADirectory
    )
}
