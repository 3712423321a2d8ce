//! Model serialization.

use std::fmt;
use std::io::{Read, Write};
use std::marker::PhantomData;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{StorageError, StorageResult};

/// Converts model objects to and from stored bytes.
pub trait ModelCodec {
    type Model;

    fn encode(&self, model: &Self::Model) -> StorageResult<Vec<u8>>;

    /// Decode stored bytes. Corrupt or incompatible input is a `Decode`
    /// error, never a partial model.
    fn decode(&self, bytes: &[u8], location: &str) -> StorageResult<Self::Model>;
}

/// JSON codec, optionally gzip-compressed.
pub struct JsonCodec<T> {
    compressed: bool,
    _model: PhantomData<fn() -> T>,
}

impl<T> JsonCodec<T> {
    /// Plain JSON.
    pub fn new() -> Self {
        Self {
            compressed: false,
            _model: PhantomData,
        }
    }

    /// Gzip-compressed JSON.
    pub fn compressed() -> Self {
        Self {
            compressed: true,
            _model: PhantomData,
        }
    }

    pub fn is_compressed(&self) -> bool {
        self.compressed
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonCodec<T> {
    fn clone(&self) -> Self {
        Self {
            compressed: self.compressed,
            _model: PhantomData,
        }
    }
}

impl<T> fmt::Debug for JsonCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonCodec")
            .field("compressed", &self.compressed)
            .finish()
    }
}

impl<T: Serialize + DeserializeOwned> ModelCodec for JsonCodec<T> {
    type Model = T;

    fn encode(&self, model: &T) -> StorageResult<Vec<u8>> {
        let json = serde_json::to_vec(model).map_err(|e| StorageError::Encode {
            reason: format!("JSON serialization failed: {}", e),
        })?;
        if !self.compressed {
            return Ok(json);
        }

        let gzip_err = |e: std::io::Error| StorageError::Encode {
            reason: format!("gzip compression failed: {}", e),
        };
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&json).map_err(gzip_err)?;
        encoder.finish().map_err(gzip_err)
    }

    fn decode(&self, bytes: &[u8], location: &str) -> StorageResult<T> {
        if !self.compressed {
            return serde_json::from_slice(bytes).map_err(|e| StorageError::decode(location, e));
        }

        let mut json = Vec::new();
        GzDecoder::new(bytes)
            .read_to_end(&mut json)
            .map_err(|e| StorageError::decode(location, e))?;
        serde_json::from_slice(&json).map_err(|e| StorageError::decode(location, e))
    }
}
