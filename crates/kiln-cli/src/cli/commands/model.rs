//! `kiln model` - Inspect stored models.

use std::io::Write;

use anyhow::{Context, Result};
use kiln_storage::{JsonCodec, ModelStorageEngine, ProjectStorage};

use crate::cli::args::{ModelArgs, ModelSub};
use crate::exit_codes::{NOT_FOUND, SUCCESS};

type JsonModels = ModelStorageEngine<JsonCodec<serde_json::Value>>;

pub fn run(project: &ProjectStorage, args: ModelArgs, out: &mut impl Write) -> Result<i32> {
    let codec = if args.compressed {
        JsonCodec::compressed()
    } else {
        JsonCodec::new()
    };
    let engine: JsonModels = project.model_storage_engine(codec);

    match args.cmd {
        ModelSub::Show { hash } => {
            let model = engine
                .load(&hash)
                .with_context(|| format!("failed to load model {}", hash))?;
            writeln!(out, "{}", serde_json::to_string_pretty(&*model)?)?;
            Ok(SUCCESS)
        }
        ModelSub::Exists { hash } => {
            let exists = engine
                .exists(&hash)
                .with_context(|| format!("failed to check model {}", hash))?;
            writeln!(out, "{}", exists)?;
            Ok(if exists { SUCCESS } else { NOT_FOUND })
        }
        ModelSub::Delete { hash } => {
            engine
                .delete(&hash)
                .with_context(|| format!("failed to delete model {}", hash))?;
            writeln!(out, "deleted {}", hash)?;
            Ok(SUCCESS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit_codes;
    use serde_json::json;
    use tempfile::TempDir;

    fn project(dir: &TempDir) -> ProjectStorage {
        ProjectStorage::new(dir.path().to_str().unwrap()).unwrap()
    }

    fn args(compressed: bool, cmd: ModelSub) -> ModelArgs {
        ModelArgs { compressed, cmd }
    }

    #[test]
    fn test_show_compressed_model() {
        let dir = TempDir::new().unwrap();
        let project = project(&dir);
        let model = json!({"kind": "stump", "threshold": 0.45});
        project
            .model_storage_engine(JsonCodec::<serde_json::Value>::compressed())
            .write(model.clone(), "abc")
            .unwrap();

        let mut out = Vec::new();
        let code = run(&project, args(true, ModelSub::Show { hash: "abc".into() }), &mut out)
            .unwrap();
        assert_eq!(code, SUCCESS);
        let shown: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(shown, model);
    }

    #[test]
    fn test_show_with_wrong_codec_fails() {
        let dir = TempDir::new().unwrap();
        let project = project(&dir);
        project
            .model_storage_engine(JsonCodec::<serde_json::Value>::compressed())
            .write(json!([1, 2]), "abc")
            .unwrap();

        let err = run(&project, args(false, ModelSub::Show { hash: "abc".into() }), &mut Vec::new())
            .unwrap_err();
        assert_eq!(exit_codes::for_error(&err), exit_codes::FAILURE);
    }

    #[test]
    fn test_exists_and_delete() {
        let dir = TempDir::new().unwrap();
        let project = project(&dir);
        project
            .model_storage_engine(JsonCodec::<serde_json::Value>::new())
            .write(json!({"a": 1}), "h1")
            .unwrap();

        let code = run(&project, args(false, ModelSub::Exists { hash: "h1".into() }), &mut Vec::new())
            .unwrap();
        assert_eq!(code, SUCCESS);

        run(&project, args(false, ModelSub::Delete { hash: "h1".into() }), &mut Vec::new()).unwrap();

        let code = run(&project, args(false, ModelSub::Exists { hash: "h1".into() }), &mut Vec::new())
            .unwrap();
        assert_eq!(code, NOT_FOUND);
    }
}
