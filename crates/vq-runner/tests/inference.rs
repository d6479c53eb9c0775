mod common;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use common::{MockAssembler, assert_close, asset};
use serde_json::json;
use vq_feature::FeatureSpec;
use vq_model::{ModelError, ModelResult, RegressionPredictor};
use vq_runner::{
    InferenceMetric, LegacyPipeline, MetricContext, MetricIdentity, MetricOptions,
    MetricRegistry, QualityMetric, RescaleBound, RunnerConfig, RunnerError,
};
use vq_types::CancellationToken;

/// Reports the rescaled adm input scaled to a 0..100 score.
struct AdmProbe;

impl RegressionPredictor for AdmProbe {
    fn predict_one(&self, x: &[f64]) -> ModelResult<f64> {
        Ok(x[1] * 100.0)
    }
}

fn legacy_bounds() -> Vec<RescaleBound> {
    vec![
        RescaleBound::new("VMAF_feature_vif_scores", 0.0, 1.0),
        RescaleBound::new("VMAF_feature_adm_scores", 0.4, 1.0),
        RescaleBound::new("VMAF_feature_ansnr_scores", 10.0, 50.0),
        RescaleBound::new("VMAF_feature_motion_scores", 0.0, 20.0),
    ]
}

fn vmaf_features() -> MockAssembler {
    MockAssembler::new([
        ("VMAF_feature_vif_scores", vec![0.9, 0.9, 0.9]),
        ("VMAF_feature_adm_scores", vec![0.7, 0.7, 0.7]),
        ("VMAF_feature_ansnr_scores", vec![30.0, 30.0, 30.0]),
        ("VMAF_feature_motion_scores", vec![3.0, 15.0, 25.0]),
        ("Moment_feature_dis1st_scores", vec![2.0, 9.0, 1.0]),
    ])
}

fn legacy_metric(assembler: Arc<MockAssembler>) -> QualityMetric {
    let pipeline =
        LegacyPipeline::new(legacy_bounds(), "VMAF_feature_motion_scores", Arc::new(AdmProbe))
            .unwrap();
    let identity = MetricIdentity::new("VMAF_legacy", "1.2");
    QualityMetric::ModelInference(InferenceMetric::legacy(
        identity.clone(),
        identity.executor_id(Vec::<(&str, &str)>::new()),
        FeatureSpec::new().with_all("VMAF_feature"),
        assembler,
        pipeline,
    ))
}

#[tokio::test]
async fn legacy_pipeline_rescales_predicts_and_corrects() {
    let metric = legacy_metric(Arc::new(vmaf_features()));
    let record = metric
        .compute(&asset(1), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(record.executor_id(), "VMAF_legacy_1.2");
    // adm 0.7 rescales to 0.5; motion 15 and 25 (capped at 20) boost the score
    assert_close(
        record.require("VMAF_legacy_scores").unwrap(),
        &[50.0, 52.25, 56.0],
    );
    assert!(record.contains_key("VMAF_feature_vif_scores"));
}

#[tokio::test]
async fn legacy_pipeline_rejects_degenerate_bounds() {
    let mut bounds = legacy_bounds();
    bounds[1].upper = 0.4;
    let err = LegacyPipeline::new(bounds, "VMAF_feature_motion_scores", Arc::new(AdmProbe))
        .unwrap_err();
    assert!(matches!(err, RunnerError::InvalidRescaleBounds { .. }));
}

#[tokio::test]
async fn missing_feature_is_an_integrity_error() {
    let assembler = MockAssembler::new([("VMAF_feature_vif_scores", vec![0.9])]);
    let err = legacy_metric(Arc::new(assembler))
        .compute(&asset(1), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, RunnerError::Types(_)));
}

#[tokio::test]
async fn removal_is_delegated_to_the_assembler() {
    let assembler = Arc::new(vmaf_features());
    let metric = legacy_metric(assembler.clone());
    metric.remove_artifacts(&asset(1)).await.unwrap();
    let removed = assembler.removed.lock().unwrap();
    assert_eq!(removed.as_slice(), &[FeatureSpec::new().with_all("VMAF_feature")]);
}

#[tokio::test]
async fn run_all_isolates_per_asset_failures() {
    let metric = legacy_metric(Arc::new(vmaf_features().failing_for(2)));
    let assets = [asset(1), asset(2), asset(3)];
    let results = metric.run_all(&assets, &CancellationToken::new()).await;
    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(RunnerError::Feature(_))));
    assert!(results[2].is_ok());
}

#[tokio::test]
async fn cancelled_runs_never_reach_the_assembler() {
    let assembler = Arc::new(vmaf_features());
    let metric = legacy_metric(assembler.clone());
    let cancel = CancellationToken::new();
    cancel.cancel();
    let results = metric.run_all(&[asset(1)], &cancel).await;
    assert!(results[0].as_ref().unwrap_err().is_cancelled());
    assert!(assembler.requested.lock().unwrap().is_empty());
}

fn write_json(path: &Path, doc: serde_json::Value) -> PathBuf {
    std::fs::write(path, doc.to_string()).unwrap();
    path.to_path_buf()
}

fn write_model(dir: &Path) -> PathBuf {
    write_json(
        &dir.join("vmaf.json"),
        json!({
            "model_type": "linear",
            "feature_names": ["VMAF_feature_adm_scores", "VMAF_feature_vif_scores"],
            "coefficients": [0.0, 100.0],
            "info": {"score_clip": [0.0, 100.0], "dis1st_thr": 5.0}
        }),
    )
}

/// Linear model over vif alone, with an optional `feature_dict`.
fn write_vif_model(path: &Path, weight: f64, feature_dict: Option<serde_json::Value>) -> PathBuf {
    let mut info = json!({"score_clip": [0.0, 100.0], "dis1st_thr": 5.0});
    if let Some(dict) = feature_dict {
        info["feature_dict"] = dict;
    }
    write_json(
        path,
        json!({
            "model_type": "linear",
            "feature_names": ["VMAF_feature_vif_scores"],
            "coefficients": [weight],
            "info": info
        }),
    )
}

fn vmaf_context(dir: &Path, assembler: Arc<MockAssembler>) -> MetricContext {
    let config = RunnerConfig {
        workdir: dir.join("work"),
        vmaf_model: write_model(dir),
        ..RunnerConfig::default()
    };
    MetricContext::new(config, assembler).unwrap()
}

fn context_with(config: RunnerConfig, assembler: Arc<MockAssembler>) -> MetricContext {
    MetricContext::new(config, assembler).unwrap()
}

#[tokio::test]
async fn general_pipeline_clips_and_warps() {
    let dir = tempfile::tempdir().unwrap();
    let assembler = Arc::new(MockAssembler::new([
        ("VMAF_feature_vif_scores", vec![0.9, 1.2, 0.5]),
        ("VMAF_feature_adm_scores", vec![0.7, 0.7, 0.7]),
        ("Moment_feature_dis1st_scores", vec![2.0, 9.0, 6.0]),
    ]));
    let context = vmaf_context(dir.path(), assembler.clone());
    let options = MetricOptions {
        model_filepath: None,
        enable_warp: true,
    };
    let metric = MetricRegistry::with_builtins()
        .create("VMAF", &context, &options)
        .unwrap();

    assert_eq!(metric.executor_id().base(), "VMAF_0.3.2");
    assert_eq!(metric.executor_id().param("enable_warp"), Some("true"));
    let record = metric
        .compute(&asset(1), &CancellationToken::new())
        .await
        .unwrap();
    assert_close(record.require("VMAF_scores").unwrap(), &[96.0, 100.0, 50.0]);

    let requested = assembler.requested.lock().unwrap();
    assert_eq!(
        requested[0],
        FeatureSpec::new()
            .with_atoms("VMAF_feature", ["vif", "adm", "motion", "ansnr"])
            .with_atoms("Moment_feature", ["dis1st"])
    );
}

#[tokio::test]
async fn general_pipeline_without_warp_only_clips() {
    let dir = tempfile::tempdir().unwrap();
    let assembler = Arc::new(MockAssembler::new([
        ("VMAF_feature_vif_scores", vec![0.9, 1.2]),
        ("VMAF_feature_adm_scores", vec![0.7, 0.7]),
        ("Moment_feature_dis1st_scores", vec![2.0, 9.0]),
    ]));
    let context = vmaf_context(dir.path(), assembler);
    let metric = MetricRegistry::with_builtins()
        .create("VMAF", &context, &MetricOptions::default())
        .unwrap();
    assert_eq!(metric.executor_id().param("enable_warp"), None);
    let record = metric
        .compute(&asset(1), &CancellationToken::new())
        .await
        .unwrap();
    assert_close(record.require("VMAF_scores").unwrap(), &[90.0, 100.0]);
}

#[tokio::test]
async fn model_path_option_changes_identity_and_loads_eagerly() {
    let dir = tempfile::tempdir().unwrap();
    let context = vmaf_context(dir.path(), Arc::new(vmaf_features()));
    let registry = MetricRegistry::with_builtins();

    let custom = dir.path().join("custom.json");
    std::fs::copy(write_model(dir.path()), &custom).unwrap();
    let options = MetricOptions {
        model_filepath: Some(custom.clone()),
        enable_warp: false,
    };
    let metric = registry.create("VMAF", &context, &options).unwrap();
    assert_eq!(
        metric.executor_id().param("model_filepath"),
        Some(custom.display().to_string().as_str())
    );

    let missing = MetricOptions {
        model_filepath: Some(dir.path().join("absent.json")),
        enable_warp: false,
    };
    let err = registry.create("VMAF", &context, &missing).unwrap_err();
    assert!(matches!(err, RunnerError::Model(ModelError::NotFound { .. })));
}

#[tokio::test]
async fn configured_default_models_yield_distinct_identities() {
    let dir = tempfile::tempdir().unwrap();
    let assembler = Arc::new(MockAssembler::new([("VMAF_feature_vif_scores", vec![0.5])]));
    let registry = MetricRegistry::with_builtins();
    let base = RunnerConfig {
        workdir: dir.path().join("work"),
        ..RunnerConfig::default()
    };
    let strong = context_with(
        RunnerConfig {
            vmaf_model: write_vif_model(&dir.path().join("a.json"), 100.0, None),
            ..base.clone()
        },
        assembler.clone(),
    );
    let weak = context_with(
        RunnerConfig {
            vmaf_model: write_vif_model(&dir.path().join("b.json"), 10.0, None),
            ..base
        },
        assembler,
    );

    let options = MetricOptions::default();
    let strong = registry.create("VMAF", &strong, &options).unwrap();
    let weak = registry.create("VMAF", &weak, &options).unwrap();
    assert_ne!(strong.executor_id(), weak.executor_id());

    let cancel = CancellationToken::new();
    let strong_scores = strong.compute(&asset(1), &cancel).await.unwrap();
    let weak_scores = weak.compute(&asset(1), &cancel).await.unwrap();
    assert_close(strong_scores.require("VMAF_scores").unwrap(), &[50.0]);
    assert_close(weak_scores.require("VMAF_scores").unwrap(), &[5.0]);
}

#[tokio::test]
async fn relative_model_option_is_keyed_by_resolved_path() {
    let dir = tempfile::tempdir().unwrap();
    let registry = MetricRegistry::with_builtins();
    let options = MetricOptions {
        model_filepath: Some(PathBuf::from("m.json")),
        enable_warp: false,
    };
    let mut ids = Vec::new();
    for root in ["one", "two"] {
        let resource_root = dir.path().join(root);
        std::fs::create_dir_all(&resource_root).unwrap();
        write_vif_model(&resource_root.join("m.json"), 100.0, None);
        let context = context_with(
            RunnerConfig {
                workdir: dir.path().join("work"),
                resource_root: resource_root.clone(),
                ..RunnerConfig::default()
            },
            Arc::new(vmaf_features()),
        );
        let metric = registry.create("VMAF", &context, &options).unwrap();
        assert_eq!(
            metric.executor_id().param("model_filepath"),
            Some(resource_root.join("m.json").display().to_string().as_str())
        );
        ids.push(metric.executor_id().to_string());
    }
    assert_ne!(ids[0], ids[1]);
}

#[tokio::test]
async fn legacy_model_location_is_part_of_the_identity() {
    let dir = tempfile::tempdir().unwrap();
    let registry = MetricRegistry::with_builtins();
    let mut ids = Vec::new();
    for name in ["v8a.model", "v8b.model"] {
        let path = dir.path().join(name);
        std::fs::write(
            &path,
            "svm_type nu_svr\nkernel_type linear\ntotal_sv 1\nrho 0\nSV\n1 1:1\n",
        )
        .unwrap();
        let context = context_with(
            RunnerConfig {
                workdir: dir.path().join("work"),
                vmaf_legacy_model: path,
                ..RunnerConfig::default()
            },
            Arc::new(vmaf_features()),
        );
        let metric = registry
            .create("VMAF_legacy", &context, &MetricOptions::default())
            .unwrap();
        assert_eq!(metric.executor_id().base(), "VMAF_legacy_1.2");
        ids.push(metric.executor_id().to_string());
    }
    assert_ne!(ids[0], ids[1]);
}

#[tokio::test]
async fn model_feature_dict_selects_requested_features() {
    let dir = tempfile::tempdir().unwrap();
    let assembler = Arc::new(MockAssembler::new([
        ("VMAF_feature_vif_scores", vec![0.5]),
        ("Moment_feature_ref1st_scores", vec![30.0]),
    ]));
    let model = write_vif_model(
        &dir.path().join("dict.json"),
        100.0,
        Some(json!({"VMAF_feature": ["vif"], "Moment_feature": ["ref1st"]})),
    );
    let context = context_with(
        RunnerConfig {
            workdir: dir.path().join("work"),
            vmaf_model: model,
            ..RunnerConfig::default()
        },
        assembler.clone(),
    );
    let metric = MetricRegistry::with_builtins()
        .create("VMAF", &context, &MetricOptions::default())
        .unwrap();
    let record = metric
        .compute(&asset(1), &CancellationToken::new())
        .await
        .unwrap();
    assert_close(record.require("VMAF_scores").unwrap(), &[50.0]);

    let requested = assembler.requested.lock().unwrap();
    assert_eq!(
        requested[0],
        FeatureSpec::new()
            .with_atoms("VMAF_feature", ["vif"])
            .with_atoms("Moment_feature", ["ref1st"])
    );
}

#[tokio::test]
async fn warp_adds_dis1st_to_an_existing_moment_selection() {
    let dir = tempfile::tempdir().unwrap();
    let assembler = Arc::new(MockAssembler::new([
        ("VMAF_feature_vif_scores", vec![0.9]),
        ("Moment_feature_ref1st_scores", vec![30.0]),
        ("Moment_feature_dis1st_scores", vec![2.0]),
    ]));
    let model = write_vif_model(
        &dir.path().join("dict.json"),
        100.0,
        Some(json!({"VMAF_feature": ["vif"], "Moment_feature": ["ref1st"]})),
    );
    let context = context_with(
        RunnerConfig {
            workdir: dir.path().join("work"),
            vmaf_model: model,
            ..RunnerConfig::default()
        },
        assembler.clone(),
    );
    let options = MetricOptions {
        model_filepath: None,
        enable_warp: true,
    };
    let metric = MetricRegistry::with_builtins()
        .create("VMAF", &context, &options)
        .unwrap();
    let record = metric
        .compute(&asset(1), &CancellationToken::new())
        .await
        .unwrap();
    // 90 with dis1st 2 below the threshold of 5 warps to 96
    assert_close(record.require("VMAF_scores").unwrap(), &[96.0]);

    let requested = assembler.requested.lock().unwrap();
    assert_eq!(
        requested[0],
        FeatureSpec::new()
            .with_atoms("VMAF_feature", ["vif"])
            .with_atoms("Moment_feature", ["ref1st", "dis1st"])
    );
}

#[tokio::test]
async fn malformed_feature_dict_fails_at_creation() {
    let dir = tempfile::tempdir().unwrap();
    let model = write_vif_model(
        &dir.path().join("bad.json"),
        100.0,
        Some(json!({"VMAF_feature": "some"})),
    );
    let context = context_with(
        RunnerConfig {
            workdir: dir.path().join("work"),
            vmaf_model: model,
            ..RunnerConfig::default()
        },
        Arc::new(vmaf_features()),
    );
    let err = MetricRegistry::with_builtins()
        .create("VMAF", &context, &MetricOptions::default())
        .unwrap_err();
    assert!(matches!(err, RunnerError::Feature(_)));
}
