//! Kiln storage: training matrices and model artifacts on local disk or
//! object storage, with scope-bounded in-memory caching.
//!
//! ```no_run
//! use kiln_storage::{JsonCodec, ProjectStorage};
//!
//! # fn main() -> kiln_storage::StorageResult<()> {
//! let project = ProjectStorage::new("s3://my-bucket/experiments/one")?;
//!
//! let matrix = project.matrix_storage_engine().get_store("0a1b2c");
//! {
//!     let _scope = matrix.cache();
//!     let columns = matrix.columns()?;
//!     let labels = matrix.labels()?;
//!     println!("{} features, {} rows", columns.len(), labels.len());
//! }
//!
//! let models = project.model_storage_engine(JsonCodec::<Vec<f64>>::new());
//! models.write(vec![0.25, 0.75], "deadbeef")?;
//! # Ok(())
//! # }
//! ```

mod cache;
pub mod config;
pub mod error;
pub mod matrix;
pub mod model;
pub mod project;
pub mod store;

// Convenience re-exports
pub use config::StorageConfig;
pub use error::{ColumnMismatchKind, StorageError, StorageResult};
pub use matrix::{
    CsvFormat, CsvMatrixStore, DesignMatrix, IndexKey, Labels, LoadedMatrix, MatrixCacheScope,
    MatrixFormat, MatrixMetadata, MatrixStorageEngine, MatrixStore, MatrixType,
};
pub use model::{JsonCodec, ModelCacheScope, ModelCodec, ModelStorageEngine};
pub use project::ProjectStorage;
pub use store::{ByteStore, FsStore, ObjectStoreByteStore, RootLocation};

// Re-export bytes for CLI convenience
pub use bytes::Bytes;
