//! Physical matrix formats.

use std::fmt;
use std::io::Read;

use super::frame::LoadedMatrix;
use super::metadata::MatrixMetadata;
use crate::error::StorageResult;

/// How a matrix is laid out in its data file.
///
/// A format names the suffixes of its two files and converts between the
/// producer's byte stream, the stored payload and the decoded matrix.
pub trait MatrixFormat: fmt::Debug + Clone + Send + Sync {
    /// Suffix of the data file, without the leading dot.
    fn data_suffix(&self) -> &str;

    /// Suffix of the descriptor file, without the leading dot.
    fn metadata_suffix(&self) -> &str;

    /// Turn a producer's byte stream into the stored payload.
    fn encode(&self, source: &mut dyn Read) -> StorageResult<Vec<u8>>;

    /// Decode and validate a stored payload.
    fn decode(
        &self,
        payload: &[u8],
        metadata: &MatrixMetadata,
        location: &str,
    ) -> StorageResult<LoadedMatrix>;
}
