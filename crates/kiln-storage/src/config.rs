//! Storage configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{StorageError, StorageResult};

/// Environment variable holding the project root.
pub const PROJECT_PATH_ENV: &str = "KILN_PROJECT_PATH";

/// Environment variable holding the default S3 region.
pub const S3_REGION_ENV: &str = "KILN_S3_REGION";

/// Where a project's matrices and models live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Local path or `file://`, `s3://` or `memory://` URI.
    pub project_path: String,

    /// Region for `s3://` roots that do not name one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3_region: Option<String>,
}

impl StorageConfig {
    pub fn new(project_path: impl Into<String>) -> Self {
        Self {
            project_path: project_path.into(),
            s3_region: None,
        }
    }

    /// Set the fallback S3 region.
    pub fn with_s3_region(mut self, region: impl Into<String>) -> Self {
        self.s3_region = Some(region.into());
        self
    }

    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `KILN_PROJECT_PATH` | Project root (required) |
    /// | `KILN_S3_REGION` | Fallback S3 region |
    pub fn from_env() -> StorageResult<Self> {
        let project_path = std::env::var(PROJECT_PATH_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| StorageError::InvalidRoot {
                root: String::new(),
                reason: format!("{} is not set", PROJECT_PATH_ENV),
            })?;
        Ok(Self {
            project_path,
            s3_region: std::env::var(S3_REGION_ENV)
                .ok()
                .filter(|v| !v.trim().is_empty()),
        })
    }

    /// Load config from a YAML file.
    pub fn from_yaml_file(path: &Path) -> StorageResult<Self> {
        let location = path.display().to_string();
        let content =
            std::fs::read_to_string(path).map_err(|e| StorageError::from_io(e, &location))?;
        serde_yaml::from_str(&content).map_err(|e| StorageError::decode(location, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn clear_env() {
        std::env::remove_var(PROJECT_PATH_ENV);
        std::env::remove_var(S3_REGION_ENV);
    }

    #[test]
    #[serial]
    fn test_from_env() {
        clear_env();
        std::env::set_var(PROJECT_PATH_ENV, "s3://bucket/project");
        std::env::set_var(S3_REGION_ENV, "us-east-2");

        let config = StorageConfig::from_env().unwrap();
        assert_eq!(config.project_path, "s3://bucket/project");
        assert_eq!(config.s3_region.as_deref(), Some("us-east-2"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_requires_project_path() {
        clear_env();
        let err = StorageConfig::from_env().unwrap_err();
        assert!(matches!(err, StorageError::InvalidRoot { .. }));
        assert!(err.to_string().contains(PROJECT_PATH_ENV));
    }

    #[test]
    #[serial]
    fn test_from_env_ignores_blank_region() {
        clear_env();
        std::env::set_var(PROJECT_PATH_ENV, "/data/project");
        std::env::set_var(S3_REGION_ENV, "  ");
        assert_eq!(StorageConfig::from_env().unwrap().s3_region, None);
        clear_env();
    }

    #[test]
    fn test_from_yaml_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kiln.yaml");
        std::fs::write(&path, "project_path: memory://scratch\ns3_region: eu-west-1\n").unwrap();

        let config = StorageConfig::from_yaml_file(&path).unwrap();
        assert_eq!(
            config,
            StorageConfig::new("memory://scratch").with_s3_region("eu-west-1")
        );
    }

    #[test]
    fn test_from_yaml_file_errors() {
        let dir = TempDir::new().unwrap();
        let missing = StorageConfig::from_yaml_file(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(missing.is_not_found());

        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "s3_region: eu-west-1\n").unwrap();
        assert!(StorageConfig::from_yaml_file(&path).unwrap_err().is_decode());
    }
}
