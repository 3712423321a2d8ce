//! Key naming conventions for project storage.
//!
//! # Key Schema
//!
//! ```text
//! {root}/matrices/{uuid}.csv.gz   # Matrix data
//! {root}/matrices/{uuid}.yaml     # Matrix descriptor
//! {root}/models/{hash}            # Serialized model
//! ```
//!
//! Downstream stages rebuild these paths from ids alone, across runs and
//! processes, so the mapping must never depend on anything but the id.

use object_store::path::Path;

/// Sub-namespace holding matrices.
pub const MATRICES_DIR: &str = "matrices";

/// Sub-namespace holding model artifacts.
pub const MODELS_DIR: &str = "models";

/// Builder for object storage keys under a base prefix.
#[derive(Debug, Clone)]
pub struct KeyBuilder {
    /// Base prefix (e.g., "triage/run1")
    base_prefix: String,
}

impl KeyBuilder {
    /// Create a new key builder with the given base prefix.
    pub fn new(base_prefix: impl Into<String>) -> Self {
        let mut prefix = base_prefix.into();
        // Normalize: remove leading/trailing slashes
        prefix = prefix.trim_matches('/').to_string();
        Self {
            base_prefix: prefix,
        }
    }

    /// Key for `leaf` under the given directories.
    ///
    /// Returns: `{base}/{dir}/.../{leaf}`
    pub fn key(&self, directories: &[&str], leaf: &str) -> Path {
        let mut parts: Vec<String> = Vec::with_capacity(directories.len() + 2);
        if !self.base_prefix.is_empty() {
            parts.push(self.base_prefix.clone());
        }
        parts.extend(directories.iter().map(|d| sanitize_segment(d)));
        parts.push(sanitize_segment(leaf));
        Path::from(parts.join("/"))
    }
}

/// File name for a matrix component: `{uuid}.{suffix}`.
pub fn matrix_file_name(uuid: &str, suffix: &str) -> String {
    format!("{}.{}", uuid, suffix)
}

/// Sanitize one path segment so an id can never escape its namespace.
pub(crate) fn sanitize_segment(segment: &str) -> String {
    // Allow alphanumeric, dash, underscore, colon, dot
    let cleaned: String = segment
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == ':' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    match cleaned.as_str() {
        "." | ".." | "" => cleaned.replace('.', "_") + "_",
        _ => cleaned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_key() {
        let kb = KeyBuilder::new("triage/run1");
        let key = kb.key(&[MATRICES_DIR], &matrix_file_name("abc123", "csv.gz"));
        assert_eq!(key.as_ref(), "triage/run1/matrices/abc123.csv.gz");
    }

    #[test]
    fn test_model_key_no_prefix() {
        let kb = KeyBuilder::new("");
        let key = kb.key(&[MODELS_DIR], "deadbeef");
        assert_eq!(key.as_ref(), "models/deadbeef");
    }

    #[test]
    fn test_prefix_slashes_normalized() {
        let kb = KeyBuilder::new("/triage/");
        assert_eq!(kb.key(&["a"], "b").as_ref(), "triage/a/b");
    }

    #[test]
    fn test_separators_cannot_escape() {
        assert_eq!(sanitize_segment("../etc/passwd"), ".._etc_passwd");
        assert_eq!(sanitize_segment(".."), "___");
        assert_eq!(sanitize_segment(""), "_");
    }
}
