use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;

use serde_json::json;
use vq_model::{LinearModel, ModelError, ModelLoader, ModelMetadata, NormType, TrainedModel};

#[test]
fn loader_caches_by_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");
    let mut metadata = ModelMetadata::new();
    metadata.set_score_clip(0.0, 100.0);
    metadata.set("feature_dict", json!({"VMAF_feature": ["vif"]}));
    let names = vec!["VMAF_feature_vif_scores".to_string()];
    TrainedModel::linear(names, LinearModel::new(vec![100.0], 0.0))
        .unwrap()
        .with_metadata(metadata)
        .to_file(&path)
        .unwrap();

    let loader = ModelLoader::new();
    let first = loader.trained(&path).unwrap();
    let second = loader.trained(&path).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.norm_type(), NormType::None);
    assert_eq!(
        first.metadata().feature_dict(),
        Some(&json!({"VMAF_feature": ["vif"]}))
    );

    let xs = BTreeMap::from([("VMAF_feature_vif_scores".to_string(), vec![0.5, 0.9])]);
    assert_eq!(first.predict(&xs).unwrap(), vec![50.0, 90.0]);

    loader.clear();
    assert!(!Arc::ptr_eq(&first, &loader.trained(&path).unwrap()));
}

#[test]
fn missing_and_corrupt_files_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    let loader = ModelLoader::new();
    assert!(matches!(
        loader.trained(&dir.path().join("absent.json")),
        Err(ModelError::NotFound { .. })
    ));

    let corrupt = dir.path().join("corrupt.json");
    fs::write(&corrupt, "{ not json").unwrap();
    assert!(matches!(
        loader.trained(&corrupt),
        Err(ModelError::Corrupt { .. })
    ));
}

#[test]
fn libsvm_files_load_through_the_loader() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.model");
    fs::write(
        &path,
        "svm_type nu_svr\nkernel_type linear\nnr_class 2\ntotal_sv 1\nrho 0\nSV\n1 1:1 2:1\n",
    )
    .unwrap();
    let model = ModelLoader::new().libsvm(&path).unwrap();
    assert_eq!(model.support_vector_count(), 1);
}

#[test]
fn libsvm_model_round_trips_through_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("svm.json");
    let text = "svm_type nu_svr\nkernel_type rbf\ngamma 0.5\nrho 0\nSV\n2 1:1\n";
    TrainedModel::libsvm(vec!["x".into()], text)
        .unwrap()
        .with_linear_rescale(vec![1.0, 1.0], vec![0.0, 0.0])
        .unwrap()
        .to_file(&path)
        .unwrap();

    let loaded = TrainedModel::from_file(&path).unwrap();
    assert_eq!(loaded.norm_type(), NormType::LinearRescale);
    let xs = BTreeMap::from([("x".to_string(), vec![1.0])]);
    assert_eq!(loaded.predict(&xs).unwrap(), vec![2.0]);
}
