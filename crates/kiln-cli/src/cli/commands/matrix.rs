//! `kiln matrix` - Inspect stored matrices.

use std::io::Write;

use anyhow::{Context, Result};
use kiln_storage::{CsvMatrixStore, ProjectStorage};
use serde_json::json;

use crate::cli::args::{MatrixArgs, MatrixSub};
use crate::exit_codes::{NOT_FOUND, SUCCESS};

pub fn run(project: &ProjectStorage, args: MatrixArgs, out: &mut impl Write) -> Result<i32> {
    let engine = project.matrix_storage_engine_in(args.directory);
    match args.cmd {
        MatrixSub::Show { uuid } => show(&engine.get_store(&uuid), out),
        MatrixSub::Exists { uuid } => exists(&engine.get_store(&uuid), out),
        MatrixSub::Delete { uuid } => delete(&engine.get_store(&uuid), out),
    }
}

fn show(store: &CsvMatrixStore, out: &mut impl Write) -> Result<i32> {
    // One backend read for the whole summary.
    let _scope = store.cache();

    let metadata = store
        .metadata()
        .with_context(|| format!("failed to read descriptor: {}", store.metadata_location()))?;
    let matrix = store
        .design_matrix()
        .with_context(|| format!("failed to read matrix: {}", store.data_location()))?;
    let as_of_dates: Vec<String> = matrix
        .as_of_dates()
        .iter()
        .map(ToString::to_string)
        .collect();

    let summary = json!({
        "uuid": store.uuid(),
        "label_name": metadata.label_name,
        "matrix_type": metadata.matrix_type.map(|t| t.as_str()),
        "columns": matrix.columns(),
        "rows": matrix.len(),
        "entities": matrix.num_entities(),
        "as_of_dates": as_of_dates,
    });
    writeln!(out, "{}", serde_json::to_string_pretty(&summary)?)?;
    Ok(SUCCESS)
}

fn exists(store: &CsvMatrixStore, out: &mut impl Write) -> Result<i32> {
    let exists = store
        .exists()
        .with_context(|| format!("failed to check matrix {}", store.uuid()))?;
    writeln!(out, "{}", exists)?;
    Ok(if exists { SUCCESS } else { NOT_FOUND })
}

fn delete(store: &CsvMatrixStore, out: &mut impl Write) -> Result<i32> {
    store
        .delete()
        .with_context(|| format!("failed to delete matrix {}", store.uuid()))?;
    writeln!(out, "deleted {}", store.uuid())?;
    Ok(SUCCESS)
}
