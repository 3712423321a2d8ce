//! Model artifact storage, keyed by model hash.
//!
//! Models live at `{root}/models/{hash}`. Inside a `cache_models` scope,
//! decoded models are kept in memory so repeated loads of the same hash skip
//! the backend; every entry is dropped when the scope closes.

pub mod codec;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::cache::ScopedCache;
use crate::error::StorageResult;
use crate::project::ProjectStorage;
use crate::store::naming::MODELS_DIR;
use crate::store::ByteStore;

pub use codec::{JsonCodec, ModelCodec};

/// Typed object store for serialized models.
pub struct ModelStorageEngine<C: ModelCodec> {
    project: ProjectStorage,
    codec: C,
    cache: ScopedCache<HashMap<String, Arc<C::Model>>>,
}

impl<C: ModelCodec> ModelStorageEngine<C> {
    pub fn new(project: ProjectStorage, codec: C) -> Self {
        Self {
            project,
            codec,
            cache: ScopedCache::new(),
        }
    }

    fn store(&self, hash: &str) -> Arc<dyn ByteStore> {
        self.project.get_store(&[MODELS_DIR], hash)
    }

    /// Serialize and store `model` under `hash`.
    ///
    /// Inside an open cache scope the model is also cached, so a following
    /// `load` of the same hash skips the backend.
    pub fn write(&self, model: impl Into<Arc<C::Model>>, hash: &str) -> StorageResult<()> {
        let model = model.into();
        let bytes = self.codec.encode(&model)?;
        self.store(hash).write(&bytes)?;
        self.cache.update(|cache| {
            cache.insert(hash.to_string(), model);
        });
        debug!(hash, bytes = bytes.len(), "wrote model");
        Ok(())
    }

    pub fn exists(&self, hash: &str) -> StorageResult<bool> {
        self.store(hash).exists()
    }

    /// Load the model stored under `hash`.
    ///
    /// Fails with `NotFound` if nothing is stored and `Decode` if the stored
    /// bytes cannot be decoded.
    pub fn load(&self, hash: &str) -> StorageResult<Arc<C::Model>> {
        if let Some(model) = self.cache.read(|cache| cache.get(hash).cloned()).flatten() {
            debug!(hash, "model served from cache");
            return Ok(model);
        }

        let store = self.store(hash);
        let bytes = store.load()?;
        let model = Arc::new(self.codec.decode(&bytes, &store.location())?);
        self.cache.update(|cache| {
            cache.insert(hash.to_string(), Arc::clone(&model));
        });
        debug!(hash, "loaded model");
        Ok(model)
    }

    /// Remove the stored model, if any.
    pub fn delete(&self, hash: &str) -> StorageResult<()> {
        self.store(hash).delete()?;
        self.cache.update(|cache| {
            cache.remove(hash);
        });
        Ok(())
    }

    /// Open a model cache scope. The cache starts empty and is discarded
    /// when the outermost guard is dropped.
    pub fn cache_models(&self) -> ModelCacheScope<'_, C> {
        self.cache.open();
        debug!("model cache scope opened");
        ModelCacheScope { engine: self }
    }

    pub fn is_cached(&self, hash: &str) -> bool {
        self.cache
            .read(|cache| cache.contains_key(hash))
            .unwrap_or(false)
    }

    pub fn cache_len(&self) -> usize {
        self.cache.read(HashMap::len).unwrap_or(0)
    }
}

impl<C: ModelCodec + fmt::Debug> fmt::Debug for ModelStorageEngine<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelStorageEngine")
            .field("root", &self.project.root())
            .field("codec", &self.codec)
            .field("cache_open", &self.cache.is_open())
            .field("cached", &self.cache_len())
            .finish()
    }
}

/// Open model cache scope. Dropping it discards every cached model.
#[must_use = "the cache scope closes as soon as the guard is dropped"]
pub struct ModelCacheScope<'a, C: ModelCodec> {
    engine: &'a ModelStorageEngine<C>,
}

impl<C: ModelCodec> Drop for ModelCacheScope<'_, C> {
    fn drop(&mut self) {
        let dropped = self.engine.cache_len();
        self.engine.cache.close();
        debug!(dropped, "model cache scope closed");
    }
}
