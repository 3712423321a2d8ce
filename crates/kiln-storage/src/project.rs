//! Project-scoped storage namespace.
//!
//! A `ProjectStorage` resolves one root location into a backend and hands
//! out stores below it. Callers never see which backend is active.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::config::StorageConfig;
use crate::error::StorageResult;
use crate::matrix::{CsvFormat, MatrixStorageEngine};
use crate::model::{ModelCodec, ModelStorageEngine};
use crate::store::naming::{sanitize_segment, MATRICES_DIR};
use crate::store::object_store_backend::ObjectBackend;
use crate::store::{ByteStore, FsStore, KeyBuilder, RootLocation};

#[derive(Debug, Clone)]
enum Backend {
    Local(PathBuf),
    Object {
        backend: ObjectBackend,
        keys: KeyBuilder,
    },
}

/// Storage namespace rooted at one location.
///
/// Cheap to clone; clones share the backend connection (and, for
/// `memory://` roots, the stored data).
#[derive(Debug, Clone)]
pub struct ProjectStorage {
    root: RootLocation,
    backend: Backend,
}

impl ProjectStorage {
    /// Resolve a root path or URI.
    pub fn new(root: &str) -> StorageResult<Self> {
        Self::from_location(RootLocation::parse(root)?)
    }

    pub fn from_location(root: RootLocation) -> StorageResult<Self> {
        let backend = match &root {
            RootLocation::Local(path) => Backend::Local(path.clone()),
            RootLocation::S3 { .. } | RootLocation::Memory { .. } => Backend::Object {
                backend: ObjectBackend::connect(&root)?,
                keys: KeyBuilder::new(root.prefix()),
            },
        };
        debug!(root = %root, "project storage ready");
        Ok(Self { root, backend })
    }

    /// Build from configuration. `s3_region` fills in a region the root
    /// URI does not specify.
    pub fn from_config(config: &StorageConfig) -> StorageResult<Self> {
        let mut root = RootLocation::parse(&config.project_path)?;
        if let RootLocation::S3 { region, .. } = &mut root {
            if region.is_none() {
                region.clone_from(&config.s3_region);
            }
        }
        Self::from_location(root)
    }

    /// An isolated in-memory project.
    pub fn memory() -> StorageResult<Self> {
        Self::from_location(RootLocation::Memory {
            name: "kiln".to_string(),
            prefix: String::new(),
        })
    }

    pub fn root(&self) -> &RootLocation {
        &self.root
    }

    /// Raw byte store at `{root}/{directories..}/{leaf}`.
    pub fn get_store(&self, directories: &[&str], leaf: &str) -> Arc<dyn ByteStore> {
        match &self.backend {
            Backend::Local(root) => {
                let mut path = root.clone();
                for dir in directories {
                    path.push(sanitize_segment(dir));
                }
                path.push(sanitize_segment(leaf));
                Arc::new(FsStore::new(path))
            }
            Backend::Object { backend, keys } => {
                Arc::new(backend.store(keys.key(directories, leaf)))
            }
        }
    }

    /// Matrix engine for `{root}/matrices`.
    pub fn matrix_storage_engine(&self) -> MatrixStorageEngine<CsvFormat> {
        self.matrix_storage_engine_in(MATRICES_DIR)
    }

    /// Matrix engine for a non-default sub-namespace.
    pub fn matrix_storage_engine_in(
        &self,
        directory: impl Into<String>,
    ) -> MatrixStorageEngine<CsvFormat> {
        MatrixStorageEngine::new(self.clone(), CsvFormat, directory)
    }

    /// Model engine for `{root}/models`, decoding with `codec`.
    pub fn model_storage_engine<C: ModelCodec>(&self, codec: C) -> ModelStorageEngine<C> {
        ModelStorageEngine::new(self.clone(), codec)
    }
}
