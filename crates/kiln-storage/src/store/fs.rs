//! Local filesystem byte store.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::{debug, warn};

use super::ByteStore;
use crate::error::{is_absent, StorageError, StorageResult};

/// Byte store backed by a single file path.
#[derive(Debug, Clone)]
pub struct FsStore {
    path: PathBuf,
}

impl FsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling path used while a write is in flight.
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| OsString::from("store"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_err(&self, err: std::io::Error) -> StorageError {
        StorageError::Io {
            location: self.location(),
            source: err,
        }
    }
}

impl ByteStore for FsStore {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn exists(&self) -> StorageResult<bool> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if is_absent(&e) => Ok(false),
            Err(e) => Err(self.io_err(e)),
        }
    }

    fn write(&self, bytes: &[u8]) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
            }
        }

        // Write then rename so readers never see a partial file.
        let temp_path = self.temp_path();
        let written =
            fs::write(&temp_path, bytes).and_then(|()| fs::rename(&temp_path, &self.path));
        if let Err(e) = written {
            match fs::remove_file(&temp_path) {
                Ok(()) => {}
                Err(cleanup) if is_absent(&cleanup) => {}
                Err(cleanup) => {
                    warn!(location = %temp_path.display(), error = %cleanup, "failed to remove temp file");
                }
            }
            return Err(self.io_err(e));
        }

        debug!(location = %self.path.display(), len = bytes.len(), "wrote file");
        Ok(())
    }

    fn load(&self) -> StorageResult<Bytes> {
        let content = fs::read(&self.path).map_err(|e| StorageError::from_io(e, &self.location()))?;
        Ok(Bytes::from(content))
    }

    fn delete(&self) -> StorageResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(location = %self.path.display(), "deleted file");
                Ok(())
            }
            Err(e) if is_absent(&e) => Ok(()),
            Err(e) => Err(self.io_err(e)),
        }
    }
}
