use std::io::Read;

use chrono::NaiveDate;
use flate2::read::GzDecoder;
use kiln_storage::{
    ByteStore, IndexKey, JsonCodec, MatrixMetadata, ObjectStoreByteStore, ProjectStorage,
    StorageConfig,
};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

const MATRIX: &str = "entity_id,as_of_date,feature_one,feature_two,label\n\
                      1,2016-01-01,0.5,0.4,0\n\
                      2,2016-01-01,0.4,0.5,1\n";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn assert_round_trip(project: &ProjectStorage) {
    let engine = project.matrix_storage_engine();
    let store = engine.get_store("1234");
    assert!(!store.exists().unwrap());

    store
        .save(MATRIX.as_bytes(), &MatrixMetadata::new("label"))
        .unwrap();
    assert!(store.exists().unwrap());

    // A fresh handle reads everything back from the backend.
    let fresh = engine.get_store("1234");
    let dm = fresh.design_matrix().unwrap();
    assert_eq!(dm.columns(), ["feature_one", "feature_two"]);
    assert_eq!(dm.rows(), [vec![0.5, 0.4], vec![0.4, 0.5]]);
    assert_eq!(
        dm.index()[1],
        IndexKey::new(2, date(2016, 1, 1).and_hms_opt(0, 0, 0).unwrap())
    );
    assert_eq!(*fresh.labels().unwrap(), vec![Some(0.0), Some(1.0)]);
    assert_eq!(fresh.metadata().unwrap().label_name, "label");
}

#[test]
fn test_round_trip_local_root() {
    let temp_dir = TempDir::new().unwrap();
    let project = ProjectStorage::new(temp_dir.path().to_str().unwrap()).unwrap();
    assert_round_trip(&project);
}

#[test]
fn test_round_trip_file_uri_root() {
    let temp_dir = TempDir::new().unwrap();
    let uri = format!("file://{}", temp_dir.path().display());
    let project = ProjectStorage::new(&uri).unwrap();
    assert_round_trip(&project);
    assert!(temp_dir.path().join("matrices").join("1234.yaml").is_file());
}

#[test]
fn test_round_trip_object_store_root() {
    let project = ProjectStorage::new("memory://bucket/project/one").unwrap();
    assert_round_trip(&project);

    let store = project.matrix_storage_engine().get_store("1234");
    assert_eq!(
        store.data_location(),
        "memory://bucket/project/one/matrices/1234.csv.gz"
    );
}

#[test]
fn test_on_disk_layout() {
    let temp_dir = TempDir::new().unwrap();
    let project = ProjectStorage::new(temp_dir.path().to_str().unwrap()).unwrap();

    project
        .matrix_storage_engine()
        .get_store("abcd")
        .save(MATRIX.as_bytes(), &MatrixMetadata::new("label"))
        .unwrap();
    project
        .model_storage_engine(JsonCodec::<Vec<f64>>::new())
        .write(vec![1.0, 2.0], "cafe")
        .unwrap();

    let matrices = temp_dir.path().join("matrices");
    let data = std::fs::read(matrices.join("abcd.csv.gz")).unwrap();
    let mut csv = String::new();
    GzDecoder::new(&data[..]).read_to_string(&mut csv).unwrap();
    assert_eq!(csv, MATRIX);

    let descriptor = std::fs::read_to_string(matrices.join("abcd.yaml")).unwrap();
    assert!(descriptor.contains("label_name: label"));

    let model = std::fs::read_to_string(temp_dir.path().join("models").join("cafe")).unwrap();
    assert_eq!(model, "[1.0,2.0]");
}

#[test]
fn test_as_of_dates() {
    let project = ProjectStorage::memory().unwrap();
    let store = project.matrix_storage_engine().get_store("dates");
    let csv = "entity_id,as_of_date,feature_one,feature_two,label\n\
               1,2016-01-01,0.5,0.4,0\n\
               2,2016-01-01,0.4,0.5,1\n\
               1,2017-01-01 00:00:00,0.5,0.4,0\n\
               2,2017-01-01 00:00:00,0.4,0.5,1\n";
    store.save(csv.as_bytes(), &MatrixMetadata::new("label")).unwrap();

    assert_eq!(
        store.as_of_dates().unwrap(),
        vec![date(2016, 1, 1), date(2017, 1, 1)]
    );
    assert_eq!(store.num_entities().unwrap(), 2);
}

#[test]
fn test_descriptor_extra_keys_survive() {
    let project = ProjectStorage::memory().unwrap();
    let store = project.matrix_storage_engine().get_store("extra");
    let metadata = MatrixMetadata::new("label")
        .with_extra("feature_start_time", "2010-01-01".into())
        .with_extra("state", "active".into());
    store.save(MATRIX.as_bytes(), &metadata).unwrap();

    let fresh = project.matrix_storage_engine().get_store("extra");
    assert_eq!(*fresh.metadata().unwrap(), metadata);
}

#[test]
fn test_custom_matrix_directory() {
    let temp_dir = TempDir::new().unwrap();
    let project = ProjectStorage::new(temp_dir.path().to_str().unwrap()).unwrap();
    let engine = project.matrix_storage_engine_in("holdout");
    assert_eq!(engine.directory(), "holdout");

    engine
        .get_store("m1")
        .save(MATRIX.as_bytes(), &MatrixMetadata::new("label"))
        .unwrap();
    assert!(temp_dir.path().join("holdout").join("m1.csv.gz").is_file());
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct LinearModel {
    intercept: f64,
    coefficients: Vec<f64>,
}

#[test]
fn test_model_cache_across_backends() {
    let temp_dir = TempDir::new().unwrap();
    let roots = [
        temp_dir.path().to_str().unwrap().to_string(),
        "memory://models".to_string(),
    ];
    for root in roots {
        let project = ProjectStorage::new(&root).unwrap();
        let engine = project.model_storage_engine(JsonCodec::<LinearModel>::compressed());
        let model = LinearModel {
            intercept: 0.1,
            coefficients: vec![0.5, -0.5],
        };
        {
            let _scope = engine.cache_models();
            engine.write(model, "lr1").unwrap();
            project.get_store(&["models"], "lr1").delete().unwrap();
            assert_eq!(engine.load("lr1").unwrap().coefficients, vec![0.5, -0.5]);
        }
        assert!(engine.load("lr1").unwrap_err().is_not_found());
    }
}

#[test]
fn test_project_from_config() {
    let project = ProjectStorage::from_config(&StorageConfig::new("memory://cfg/base")).unwrap();
    project
        .matrix_storage_engine()
        .get_store("m")
        .save(MATRIX.as_bytes(), &MatrixMetadata::new("label"))
        .unwrap();
    assert!(project.matrix_storage_engine().get_store("m").exists().unwrap());
}

#[test]
fn test_single_object_from_url() {
    let store = ObjectStoreByteStore::from_url("memory://scratch/some/key.bin").unwrap();
    assert!(!store.exists().unwrap());
    store.write(b"payload").unwrap();
    assert_eq!(&store.load().unwrap()[..], b"payload");
    assert!(ObjectStoreByteStore::from_url("memory://scratch").is_err());
}
