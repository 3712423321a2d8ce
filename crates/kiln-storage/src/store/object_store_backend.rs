//! Object store implementation of `ByteStore`.
//!
//! Supports S3 (and S3-compatible endpoints via `AWS_ENDPOINT`) and an
//! in-memory store via the `object_store` crate. The byte store contract is
//! synchronous, so each backend owns a current-thread runtime and blocks on
//! the object store futures. Do not call these stores from inside another
//! tokio runtime.

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use object_store::path::Path;
use object_store::{ObjectStore, ObjectStoreExt, PutPayload};
use tokio::runtime::Runtime;
use tracing::debug;

use super::{ByteStore, RootLocation};
use crate::error::{StorageError, StorageResult};

/// A connected object store shared by every byte store under one root.
#[derive(Debug, Clone)]
pub(crate) struct ObjectBackend {
    inner: Arc<dyn ObjectStore>,
    runtime: Arc<Runtime>,
    /// `scheme://bucket`, used to render locations.
    display_root: String,
}

impl ObjectBackend {
    /// Connect to the object store named by `location`.
    pub(crate) fn connect(location: &RootLocation) -> StorageResult<Self> {
        let (inner, display_root): (Arc<dyn ObjectStore>, String) = match location {
            RootLocation::Memory { name, .. } => (
                Arc::new(object_store::memory::InMemory::new()),
                format!("memory://{}", name),
            ),
            RootLocation::S3 { bucket, region, .. } => {
                let mut builder = object_store::aws::AmazonS3Builder::from_env()
                    .with_bucket_name(bucket)
                    .with_allow_http(false);

                if let Some(region) = region {
                    builder = builder.with_region(region);
                }

                let s3 = builder.build().map_err(|e| StorageError::InvalidRoot {
                    root: location.to_string(),
                    reason: format!("failed to create S3 client: {}", e),
                })?;
                (Arc::new(s3), format!("s3://{}", bucket))
            }
            RootLocation::Local(path) => {
                return Err(StorageError::InvalidRoot {
                    root: path.display().to_string(),
                    reason: "local paths are served by the filesystem store".to_string(),
                })
            }
        };

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| StorageError::Io {
                location: display_root.clone(),
                source: e,
            })?;

        Ok(Self {
            inner,
            runtime: Arc::new(runtime),
            display_root,
        })
    }

    /// A byte store handle for `key`.
    pub(crate) fn store(&self, key: Path) -> ObjectStoreByteStore {
        ObjectStoreByteStore {
            backend: self.clone(),
            key,
        }
    }
}

/// Byte store backed by one key in an object store.
#[derive(Debug, Clone)]
pub struct ObjectStoreByteStore {
    backend: ObjectBackend,
    key: Path,
}

impl ObjectStoreByteStore {
    /// Open a standalone store for a full object URI such as
    /// `s3://bucket/path/to/object`.
    pub fn from_url(url: &str) -> StorageResult<Self> {
        let location = RootLocation::parse(url)?;
        if location.prefix().is_empty() {
            return Err(StorageError::InvalidRoot {
                root: url.to_string(),
                reason: "object URI must include a key".to_string(),
            });
        }
        let backend = ObjectBackend::connect(&location)?;
        Ok(backend.store(Path::from(location.prefix())))
    }

    pub fn key(&self) -> &Path {
        &self.key
    }

    fn block_on<F: Future>(&self, fut: F) -> F::Output {
        self.backend.runtime.block_on(fut)
    }
}

impl ByteStore for ObjectStoreByteStore {
    fn location(&self) -> String {
        format!("{}/{}", self.backend.display_root, self.key)
    }

    fn exists(&self) -> StorageResult<bool> {
        match self.block_on(self.backend.inner.head(&self.key)) {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::ObjectStore {
                location: self.location(),
                source: e,
            }),
        }
    }

    fn write(&self, bytes: &[u8]) -> StorageResult<()> {
        let payload = PutPayload::from_bytes(Bytes::copy_from_slice(bytes));
        self.block_on(self.backend.inner.put(&self.key, payload))
            .map_err(|e| StorageError::ObjectStore {
                location: self.location(),
                source: e,
            })?;
        debug!(location = %self.location(), len = bytes.len(), "put object");
        Ok(())
    }

    fn load(&self) -> StorageResult<Bytes> {
        let location = self.location();
        self.block_on(async {
            let result = self
                .backend
                .inner
                .get(&self.key)
                .await
                .map_err(|e| StorageError::from_object_store(e, &location))?;
            result
                .bytes()
                .await
                .map_err(|e| StorageError::from_object_store(e, &location))
        })
    }

    fn delete(&self) -> StorageResult<()> {
        match self.block_on(self.backend.inner.delete(&self.key)) {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => {
                debug!(location = %self.location(), "deleted object");
                Ok(())
            }
            Err(e) => Err(StorageError::ObjectStore {
                location: self.location(),
                source: e,
            }),
        }
    }
}
