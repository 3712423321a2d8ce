//! Byte-level storage over a single addressable location.
//!
//! Every backend implements the same four-operation contract:
//!
//! | op       | missing location            | present location          |
//! |----------|-----------------------------|---------------------------|
//! | `exists` | `Ok(false)`                 | `Ok(true)`                |
//! | `write`  | creates                     | fully replaces            |
//! | `load`   | `Err(StorageError::NotFound)` | exact bytes last written |
//! | `delete` | no-op                       | removes                   |
//!
//! Backends are selected by the scheme of the project root:
//!
//! ```text
//! /var/lib/kiln/project          # local filesystem
//! file:///var/lib/kiln/project   # local filesystem
//! s3://my-bucket/kiln/project    # S3 (credentials from AWS_* env)
//! memory://scratch               # in-process, for tests (always starts empty)
//! ```

pub mod fs;
pub mod naming;
pub mod object_store_backend;

use std::fmt;
use std::path::PathBuf;

use bytes::Bytes;
use percent_encoding::percent_decode_str;

use crate::error::{StorageError, StorageResult};

pub use fs::FsStore;
pub use naming::KeyBuilder;
pub use object_store_backend::ObjectStoreByteStore;

/// Uniform exists/write/load/delete contract over one location.
///
/// Handles are stateless: two handles for the same location observe each
/// other's writes immediately.
pub trait ByteStore: fmt::Debug + Send + Sync {
    /// Human-readable location, used in errors and logs.
    fn location(&self) -> String;

    /// True iff the location currently holds a value.
    fn exists(&self) -> StorageResult<bool>;

    /// Store `bytes`, replacing any prior value.
    fn write(&self, bytes: &[u8]) -> StorageResult<()>;

    /// Return the bytes previously written.
    ///
    /// Fails with `StorageError::NotFound` if nothing is stored.
    fn load(&self) -> StorageResult<Bytes>;

    /// Remove the value if present.
    fn delete(&self) -> StorageResult<()>;
}

/// Parsed project root location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootLocation {
    /// A directory on the local filesystem.
    Local(PathBuf),
    /// An S3 bucket and key prefix.
    S3 {
        bucket: String,
        prefix: String,
        region: Option<String>,
    },
    /// A process-local in-memory object store.
    ///
    /// `name` is only used in locations. Every connection gets its own empty
    /// store, so two roots with the same name never share data.
    Memory { name: String, prefix: String },
}

impl RootLocation {
    /// Parse a root such as `/data/project`, `file:///data/project`,
    /// `s3://bucket/prefix?region=eu-west-1` or `memory://name`.
    pub fn parse(root: &str) -> StorageResult<Self> {
        if !root.contains("://") {
            return Ok(Self::Local(PathBuf::from(root)));
        }

        let url = url::Url::parse(root).map_err(|e| StorageError::InvalidRoot {
            root: root.to_string(),
            reason: e.to_string(),
        })?;

        let prefix = decode_prefix(&url, root)?;

        match url.scheme() {
            "file" => url
                .to_file_path()
                .map(Self::Local)
                .map_err(|_| StorageError::InvalidRoot {
                    root: root.to_string(),
                    reason: "file URI does not name a local path".to_string(),
                }),
            "s3" => {
                let bucket = url
                    .host_str()
                    .filter(|b| !b.is_empty())
                    .ok_or_else(|| StorageError::InvalidRoot {
                        root: root.to_string(),
                        reason: "S3 URI must include bucket name".to_string(),
                    })?
                    .to_string();
                let region = url
                    .query_pairs()
                    .find(|(k, _)| k == "region")
                    .map(|(_, v)| v.to_string());
                Ok(Self::S3 {
                    bucket,
                    prefix,
                    region,
                })
            }
            "memory" => Ok(Self::Memory {
                name: url.host_str().unwrap_or_default().to_string(),
                prefix,
            }),
            scheme => Err(StorageError::InvalidRoot {
                root: root.to_string(),
                reason: format!("unsupported scheme: {}", scheme),
            }),
        }
    }

    /// Check if this root lives on the local filesystem.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }

    /// Key prefix inside the object store (empty for local roots).
    pub fn prefix(&self) -> &str {
        match self {
            Self::Local(_) => "",
            Self::S3 { prefix, .. } | Self::Memory { prefix, .. } => prefix,
        }
    }
}

/// The URI path as a plain key prefix: percent-escapes decoded, empty
/// segments dropped.
fn decode_prefix(url: &url::Url, root: &str) -> StorageResult<String> {
    let Some(segments) = url.path_segments() else {
        return Ok(String::new());
    };
    let mut parts = Vec::new();
    for segment in segments.filter(|s| !s.is_empty()) {
        let decoded = percent_decode_str(segment)
            .decode_utf8()
            .map_err(|e| StorageError::InvalidRoot {
                root: root.to_string(),
                reason: format!("path is not valid UTF-8: {}", e),
            })?;
        parts.push(decoded.into_owned());
    }
    Ok(parts.join("/"))
}

impl fmt::Display for RootLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::S3 { bucket, prefix, .. } => write!(f, "s3://{}/{}", bucket, prefix),
            Self::Memory { name, prefix } => write!(f, "memory://{}/{}", name, prefix),
        }
    }
}
