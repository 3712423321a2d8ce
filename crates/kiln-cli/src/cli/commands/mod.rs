pub mod matrix;
pub mod model;

use anyhow::{Context, Result};
use kiln_storage::{ProjectStorage, RootLocation, StorageConfig};

use super::args::{Cli, Command};
use crate::exit_codes::SUCCESS;

pub fn dispatch(cli: Cli) -> Result<i32> {
    if let Command::Version = cli.cmd {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    let project = open_project(&cli.storage_config()?)?;
    tracing::debug!(root = %project.root(), "opened project");

    let mut out = std::io::stdout().lock();
    match cli.cmd {
        Command::Matrix(args) => matrix::run(&project, args, &mut out),
        Command::Model(args) => model::run(&project, args, &mut out),
        Command::Version => Ok(SUCCESS),
    }
}

/// Open the configured project. `memory://` roots start empty in every
/// process, so there is never anything for the CLI to inspect there.
fn open_project(config: &StorageConfig) -> Result<ProjectStorage> {
    let project = ProjectStorage::from_config(config)
        .with_context(|| format!("failed to open project: {}", config.project_path))?;
    if let RootLocation::Memory { .. } = project.root() {
        anyhow::bail!(
            "memory:// roots are private to one process; use a local path or an s3:// root: {}",
            config.project_path
        );
    }
    Ok(project)
}
