//! Matrix storage.
//!
//! A matrix is one tabular dataset identified by a caller-supplied UUID. It
//! is stored as two files under the project's matrix namespace:
//!
//! ```text
//! {root}/matrices/{uuid}.csv.gz   # data (index, features, label)
//! {root}/matrices/{uuid}.yaml     # descriptor (label_name, indices, ...)
//! ```
//!
//! Reads are lazy. Without an open cache scope every read goes to the
//! backend; inside `MatrixStore::cache` the first read is kept in memory
//! until the scope closes.

pub mod csv_format;
pub mod format;
pub mod frame;
pub mod metadata;

use std::cell::RefCell;
use std::fmt;
use std::io::Read;
use std::sync::Arc;

use bytes::Bytes;
use chrono::NaiveDate;
use tracing::{debug, info};

use crate::cache::ScopedCache;
use crate::error::{StorageError, StorageResult};
use crate::project::ProjectStorage;
use crate::store::naming::matrix_file_name;
use crate::store::ByteStore;

pub use csv_format::CsvFormat;
pub use format::MatrixFormat;
pub use frame::{DesignMatrix, IndexKey, Labels, LoadedMatrix};
pub use metadata::{MatrixMetadata, MatrixType};

/// Matrix store using the gzip CSV format.
pub type CsvMatrixStore = MatrixStore<CsvFormat>;

#[derive(Debug, Default)]
struct MatrixCache {
    raw: Option<Bytes>,
    matrix: Option<LoadedMatrix>,
}

/// One matrix: data file, descriptor file and scoped cache.
pub struct MatrixStore<F: MatrixFormat = CsvFormat> {
    uuid: String,
    format: F,
    data_store: Arc<dyn ByteStore>,
    metadata_store: Arc<dyn ByteStore>,
    metadata: RefCell<Option<Arc<MatrixMetadata>>>,
    cache: ScopedCache<MatrixCache>,
}

impl<F: MatrixFormat> MatrixStore<F> {
    pub fn new(
        uuid: impl Into<String>,
        format: F,
        data_store: Arc<dyn ByteStore>,
        metadata_store: Arc<dyn ByteStore>,
    ) -> Self {
        Self {
            uuid: uuid.into(),
            format,
            data_store,
            metadata_store,
            metadata: RefCell::new(None),
            cache: ScopedCache::new(),
        }
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    /// Location of the data file.
    pub fn data_location(&self) -> String {
        self.data_store.location()
    }

    /// Location of the descriptor file.
    pub fn metadata_location(&self) -> String {
        self.metadata_store.location()
    }

    /// True iff both the data and the descriptor are stored.
    pub fn exists(&self) -> StorageResult<bool> {
        Ok(self.data_store.exists()? && self.metadata_store.exists()?)
    }

    /// Open a cache scope. Reads inside the scope hit the backend at most
    /// once; the cached data is dropped when the returned guard is.
    pub fn cache(&self) -> MatrixCacheScope<'_, F> {
        self.cache.open();
        debug!(uuid = %self.uuid, "matrix cache scope opened");
        MatrixCacheScope { store: self }
    }

    /// Whether decoded data or raw bytes are currently held in memory.
    pub fn is_cached(&self) -> bool {
        self.cache
            .read(|c| c.raw.is_some() || c.matrix.is_some())
            .unwrap_or(false)
    }

    /// Parsed descriptor. Read once, then kept until the next `save`.
    pub fn metadata(&self) -> StorageResult<Arc<MatrixMetadata>> {
        if let Some(meta) = self.metadata.borrow().as_ref() {
            return Ok(Arc::clone(meta));
        }
        let bytes = self.metadata_store.load()?;
        let meta = Arc::new(MatrixMetadata::from_yaml(
            &bytes,
            &self.metadata_store.location(),
        )?);
        *self.metadata.borrow_mut() = Some(Arc::clone(&meta));
        Ok(meta)
    }

    /// The stored data payload, exactly as persisted.
    pub fn raw_bytes(&self) -> StorageResult<Bytes> {
        if let Some(raw) = self.cache.read(|c| c.raw.clone()).flatten() {
            debug!(uuid = %self.uuid, "raw bytes served from cache");
            return Ok(raw);
        }
        let raw = self.data_store.load()?;
        debug!(uuid = %self.uuid, len = raw.len(), "loaded matrix bytes");
        self.cache.update(|c| c.raw = Some(raw.clone()));
        Ok(raw)
    }

    fn load(&self) -> StorageResult<LoadedMatrix> {
        if let Some(loaded) = self.cache.read(|c| c.matrix.clone()).flatten() {
            debug!(uuid = %self.uuid, "matrix served from cache");
            return Ok(loaded);
        }
        let metadata = self.metadata()?;
        let raw = self.raw_bytes()?;
        let loaded = self
            .format
            .decode(&raw, &metadata, &self.data_store.location())?;
        self.cache.update(|c| c.matrix = Some(loaded.clone()));
        Ok(loaded)
    }

    /// True iff the matrix has no rows.
    pub fn empty(&self) -> StorageResult<bool> {
        Ok(self.load()?.design_matrix.is_empty())
    }

    /// Feature column names in stored order, without index or label columns.
    pub fn columns(&self) -> StorageResult<Vec<String>> {
        self.columns_with_label(false)
    }

    /// Feature column names, with the label column appended when asked.
    pub fn columns_with_label(&self, include_label: bool) -> StorageResult<Vec<String>> {
        let loaded = self.load()?;
        let mut columns = loaded.design_matrix.columns().to_vec();
        if include_label {
            columns.push(loaded.label_name.clone());
        }
        Ok(columns)
    }

    /// Label values in row order.
    pub fn labels(&self) -> StorageResult<Arc<Labels>> {
        Ok(self.load()?.labels)
    }

    /// Feature table indexed by `(entity, as-of)`.
    pub fn design_matrix(&self) -> StorageResult<Arc<DesignMatrix>> {
        Ok(self.load()?.design_matrix)
    }

    /// Design matrix and labels from the same read.
    pub fn matrix_label_tuple(&self) -> StorageResult<(Arc<DesignMatrix>, Arc<Labels>)> {
        let loaded = self.load()?;
        Ok((loaded.design_matrix, loaded.labels))
    }

    /// Composite keys in row order.
    pub fn index(&self) -> StorageResult<Vec<IndexKey>> {
        Ok(self.load()?.design_matrix.index().to_vec())
    }

    /// Distinct as-of dates, date-only, ascending.
    pub fn as_of_dates(&self) -> StorageResult<Vec<NaiveDate>> {
        Ok(self.load()?.design_matrix.as_of_dates())
    }

    /// Number of distinct entities.
    pub fn num_entities(&self) -> StorageResult<usize> {
        Ok(self.load()?.design_matrix.num_entities())
    }

    /// First row of the design matrix, `None` if the matrix is empty.
    pub fn head_of_matrix(&self) -> StorageResult<Option<DesignMatrix>> {
        Ok(self.load()?.design_matrix.head())
    }

    /// Matrix role from the descriptor's `matrix_type`.
    pub fn matrix_type(&self) -> StorageResult<MatrixType> {
        self.metadata()?
            .matrix_type
            .ok_or_else(|| StorageError::decode(self.metadata_location(), "no matrix_type"))
    }

    pub fn is_test(&self) -> StorageResult<bool> {
        Ok(self.matrix_type()?.is_test())
    }

    /// The design matrix with feature columns in exactly `requested` order.
    ///
    /// Fails with `ColumnMismatch` unless `requested` is a permutation of
    /// `columns()`.
    pub fn matrix_with_sorted_columns<S: AsRef<str>>(
        &self,
        requested: &[S],
    ) -> StorageResult<DesignMatrix> {
        self.design_matrix()?.with_sorted_columns(requested)
    }

    /// Persist a producer's byte stream and descriptor, replacing any
    /// previous content. Cached data is dropped; an open scope stays open.
    pub fn save<R: Read>(&self, mut source: R, metadata: &MatrixMetadata) -> StorageResult<()> {
        let payload = self.format.encode(&mut source)?;
        let descriptor = metadata.to_yaml()?;

        // Cached state is dropped before the first write, so a failure
        // between the two writes leaves nothing stale behind.
        *self.metadata.borrow_mut() = None;
        self.cache.reset();

        self.data_store.write(&payload)?;
        self.metadata_store.write(descriptor.as_bytes())?;

        *self.metadata.borrow_mut() = Some(Arc::new(metadata.clone()));

        info!(uuid = %self.uuid, bytes = payload.len(), "saved matrix");
        Ok(())
    }

    /// Remove data and descriptor.
    pub fn delete(&self) -> StorageResult<()> {
        self.data_store.delete()?;
        self.metadata_store.delete()?;
        *self.metadata.borrow_mut() = None;
        self.cache.reset();
        debug!(uuid = %self.uuid, "deleted matrix");
        Ok(())
    }
}

/// Clones share storage locations but never cached state.
impl<F: MatrixFormat> Clone for MatrixStore<F> {
    fn clone(&self) -> Self {
        Self::new(
            self.uuid.clone(),
            self.format.clone(),
            Arc::clone(&self.data_store),
            Arc::clone(&self.metadata_store),
        )
    }
}

impl<F: MatrixFormat> fmt::Debug for MatrixStore<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatrixStore")
            .field("uuid", &self.uuid)
            .field("format", &self.format)
            .field("data", &self.data_store.location())
            .field("metadata", &self.metadata_store.location())
            .field("cache_open", &self.cache.is_open())
            .finish()
    }
}

/// Open cache scope on a `MatrixStore`. Dropping it clears the cache.
#[must_use = "the cache scope closes as soon as the guard is dropped"]
pub struct MatrixCacheScope<'a, F: MatrixFormat> {
    store: &'a MatrixStore<F>,
}

impl<F: MatrixFormat> Drop for MatrixCacheScope<'_, F> {
    fn drop(&mut self) {
        self.store.cache.close();
        debug!(uuid = %self.store.uuid, "matrix cache scope closed");
    }
}

/// Factory for matrix stores under one project namespace.
#[derive(Debug, Clone)]
pub struct MatrixStorageEngine<F: MatrixFormat = CsvFormat> {
    project: ProjectStorage,
    format: F,
    directory: String,
}

impl<F: MatrixFormat> MatrixStorageEngine<F> {
    pub fn new(project: ProjectStorage, format: F, directory: impl Into<String>) -> Self {
        Self {
            project,
            format,
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &str {
        &self.directory
    }

    /// Store for `uuid`, at `{root}/{directory}/{uuid}.{suffix}`.
    pub fn get_store(&self, uuid: &str) -> MatrixStore<F> {
        let data = self.project.get_store(
            &[&self.directory],
            &matrix_file_name(uuid, self.format.data_suffix()),
        );
        let metadata = self.project.get_store(
            &[&self.directory],
            &matrix_file_name(uuid, self.format.metadata_suffix()),
        );
        MatrixStore::new(uuid, self.format.clone(), data, metadata)
    }
}
