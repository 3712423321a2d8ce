use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use kiln_storage::StorageConfig;

#[derive(Debug, Parser)]
#[command(
    name = "kiln",
    version,
    about = "Inspect training matrices and model artifacts in Kiln project storage"
)]
pub struct Cli {
    /// Project root: a local path, file://, s3://bucket/prefix or memory://name
    #[arg(long, env = "KILN_PROJECT_PATH", global = true)]
    pub project_path: Option<String>,

    /// Region for s3:// roots that do not name one
    #[arg(long, env = "KILN_S3_REGION", global = true)]
    pub s3_region: Option<String>,

    /// Read storage settings from a YAML file (takes precedence over --project-path)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

impl Cli {
    /// Storage settings from `--config`, or else from `--project-path`.
    pub fn storage_config(&self) -> Result<StorageConfig> {
        if let Some(path) = &self.config {
            return StorageConfig::from_yaml_file(path)
                .with_context(|| format!("failed to load config: {}", path.display()));
        }
        let project_path = self
            .project_path
            .as_deref()
            .context("no project root: pass --project-path or set KILN_PROJECT_PATH")?;
        let mut config = StorageConfig::new(project_path);
        config.s3_region.clone_from(&self.s3_region);
        Ok(config)
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Inspect or remove stored matrices
    Matrix(MatrixArgs),
    /// Inspect or remove stored models
    Model(ModelArgs),
    Version,
}

#[derive(Debug, Args)]
pub struct MatrixArgs {
    /// Matrix namespace under the project root
    #[arg(long, default_value = "matrices")]
    pub directory: String,

    #[command(subcommand)]
    pub cmd: MatrixSub,
}

#[derive(Debug, Subcommand)]
pub enum MatrixSub {
    /// Print descriptor, columns and row summary as JSON
    Show { uuid: String },
    /// Exit 0 if both data and descriptor are stored, 2 otherwise
    Exists { uuid: String },
    /// Remove data and descriptor
    Delete { uuid: String },
}

#[derive(Debug, Args)]
pub struct ModelArgs {
    /// Models are gzip-compressed JSON
    #[arg(long)]
    pub compressed: bool,

    #[command(subcommand)]
    pub cmd: ModelSub,
}

#[derive(Debug, Subcommand)]
pub enum ModelSub {
    /// Print a JSON model
    Show { hash: String },
    /// Exit 0 if the model is stored, 2 otherwise
    Exists { hash: String },
    /// Remove the model
    Delete { hash: String },
}
