use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use vq_feature::{FeatureAssembler, FeatureSpec};
use vq_model::{RegressionPredictor, TrainedModel, perframe_vectors};
use vq_types::{Asset, CancellationToken, ExecutorId, FeatureResult, ScoreRecord};

use crate::error::{RunnerError, RunnerResult};
use crate::identity::MetricIdentity;
use crate::postprocess::{self, DIS1ST_ATOM, MOMENT_FEATURE_TYPE};

/// Rescale interval of one model input.
#[derive(Debug, Clone, PartialEq)]
pub struct RescaleBound {
    pub key: String,
    pub lower: f64,
    pub upper: f64,
}

impl RescaleBound {
    pub fn new(key: impl Into<String>, lower: f64, upper: f64) -> Self {
        Self {
            key: key.into(),
            lower,
            upper,
        }
    }
}

/// Fixed feature rescaling, injected SVR predictor and motion
/// post-correction.
#[derive(Clone)]
pub struct LegacyPipeline {
    bounds: Vec<RescaleBound>,
    motion_key: String,
    predictor: Arc<dyn RegressionPredictor>,
}

impl LegacyPipeline {
    /// Fails on degenerate bounds or when `motion_key` has no bound.
    pub fn new(
        bounds: Vec<RescaleBound>,
        motion_key: impl Into<String>,
        predictor: Arc<dyn RegressionPredictor>,
    ) -> RunnerResult<Self> {
        let motion_key = motion_key.into();
        for bound in &bounds {
            postprocess::check_bounds(&bound.key, bound.lower, bound.upper)?;
        }
        if !bounds.iter().any(|bound| bound.key == motion_key) {
            return Err(RunnerError::config(format!(
                "motion feature '{motion_key}' is not a model input"
            )));
        }
        Ok(Self {
            bounds,
            motion_key,
            predictor,
        })
    }

    pub fn bounds(&self) -> &[RescaleBound] {
        &self.bounds
    }

    pub fn motion_key(&self) -> &str {
        &self.motion_key
    }

    pub fn predict(&self, features: &FeatureResult) -> RunnerResult<Vec<f64>> {
        let mut rescaled = BTreeMap::new();
        for bound in &self.bounds {
            let values = features.require(&bound.key)?;
            rescaled.insert(
                bound.key.clone(),
                postprocess::rescale_scores(&bound.key, values, bound.lower, bound.upper)?,
            );
        }
        let keys: Vec<&str> = self.bounds.iter().map(|b| b.key.as_str()).collect();
        let vectors = perframe_vectors(&keys, &rescaled)?;
        let motion = features.require(&self.motion_key)?;

        vectors
            .iter()
            .zip(motion)
            .map(|(x, &m)| {
                let score = self.predictor.predict_one(x)?;
                Ok(postprocess::legacy_post_correction(m, score))
            })
            .collect()
    }
}

/// Trained model whose metadata drives feature selection and
/// post-processing.
#[derive(Debug, Clone)]
pub struct GeneralPipeline {
    model: Arc<TrainedModel>,
    feature_spec: FeatureSpec,
    enable_warp: bool,
}

impl GeneralPipeline {
    pub fn new(
        model: Arc<TrainedModel>,
        default_spec: FeatureSpec,
        enable_warp: bool,
    ) -> RunnerResult<Self> {
        let mut feature_spec = match model.metadata().feature_dict() {
            Some(value) => FeatureSpec::from_value(value)?,
            None => default_spec,
        };
        if enable_warp {
            feature_spec = feature_spec.ensure_atom(MOMENT_FEATURE_TYPE, DIS1ST_ATOM);
        }
        // Surface malformed post-processing metadata before any asset runs.
        model.metadata().score_clip()?;
        model.metadata().dis1st_thr()?;
        Ok(Self {
            model,
            feature_spec,
            enable_warp,
        })
    }

    pub fn model(&self) -> &TrainedModel {
        &self.model
    }

    pub fn enable_warp(&self) -> bool {
        self.enable_warp
    }

    pub fn predict(&self, features: &FeatureResult) -> RunnerResult<Vec<f64>> {
        let predicted = self.model.predict(features.scores())?;
        let clipped = postprocess::clip_scores(self.model.metadata(), predicted)?;
        if self.enable_warp {
            postprocess::warp_scores(self.model.metadata(), features, clipped)
        } else {
            Ok(clipped)
        }
    }
}

impl fmt::Debug for LegacyPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LegacyPipeline")
            .field("bounds", &self.bounds)
            .field("motion_key", &self.motion_key)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub enum InferencePipeline {
    Legacy(LegacyPipeline),
    General(GeneralPipeline),
}

/// Metric computed from assembled features by a regression model.
#[derive(Clone)]
pub struct InferenceMetric {
    identity: MetricIdentity,
    executor_id: ExecutorId,
    feature_spec: FeatureSpec,
    assembler: Arc<dyn FeatureAssembler>,
    pipeline: InferencePipeline,
}

impl InferenceMetric {
    pub fn legacy(
        identity: MetricIdentity,
        executor_id: ExecutorId,
        feature_spec: FeatureSpec,
        assembler: Arc<dyn FeatureAssembler>,
        pipeline: LegacyPipeline,
    ) -> Self {
        Self {
            executor_id,
            identity,
            feature_spec,
            assembler,
            pipeline: InferencePipeline::Legacy(pipeline),
        }
    }

    pub fn general(
        identity: MetricIdentity,
        executor_id: ExecutorId,
        assembler: Arc<dyn FeatureAssembler>,
        pipeline: GeneralPipeline,
    ) -> Self {
        Self {
            identity,
            executor_id,
            feature_spec: pipeline.feature_spec.clone(),
            assembler,
            pipeline: InferencePipeline::General(pipeline),
        }
    }

    pub fn identity(&self) -> &MetricIdentity {
        &self.identity
    }

    pub fn executor_id(&self) -> &ExecutorId {
        &self.executor_id
    }

    pub fn feature_spec(&self) -> &FeatureSpec {
        &self.feature_spec
    }

    pub fn pipeline(&self) -> &InferencePipeline {
        &self.pipeline
    }

    pub async fn compute(
        &self,
        asset: &Asset,
        cancel: &CancellationToken,
    ) -> RunnerResult<ScoreRecord> {
        if cancel.is_cancelled() {
            return Err(RunnerError::Cancelled);
        }
        let features = self
            .assembler
            .assemble(&self.feature_spec, asset, cancel)
            .await?;
        if cancel.is_cancelled() {
            return Err(RunnerError::Cancelled);
        }

        let scores = match &self.pipeline {
            InferencePipeline::Legacy(pipeline) => pipeline.predict(&features)?,
            InferencePipeline::General(pipeline) => pipeline.predict(&features)?,
        };

        let mut result = features.into_scores();
        result.insert(self.identity.scores_key(), scores);
        Ok(ScoreRecord::new(
            asset.clone(),
            self.executor_id.to_string(),
            result,
        )?)
    }

    pub async fn remove_artifacts(&self, asset: &Asset) -> RunnerResult<()> {
        self.assembler
            .remove_results(&self.feature_spec, asset)
            .await?;
        Ok(())
    }
}

impl fmt::Debug for InferenceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InferenceMetric")
            .field("executor_id", &self.executor_id)
            .field("assembler", &self.assembler.name())
            .field("feature_spec", &self.feature_spec)
            .field("pipeline", &self.pipeline)
            .finish()
    }
}
