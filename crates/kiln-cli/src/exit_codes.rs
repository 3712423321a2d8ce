//! Exit codes for the `kiln` binary.

use kiln_storage::StorageError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1; // Backend, decode or usage error
pub const NOT_FOUND: i32 = 2; // Requested matrix or model is not stored

/// Exit code for a failed command, taken from the first storage error in
/// the chain.
pub fn for_error(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<StorageError>())
        .map_or(FAILURE, StorageError::exit_code)
}
