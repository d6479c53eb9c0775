//! The closed set of metric variants and their shared operations.

mod command;
mod inference;

pub use command::CommandMetric;
pub use inference::{
    GeneralPipeline, InferenceMetric, InferencePipeline, LegacyPipeline, RescaleBound,
};

use tracing::{info, warn};
use vq_types::{Asset, CancellationToken, ExecutorId, ScoreRecord};

use crate::error::{RunnerError, RunnerResult};
use crate::identity::MetricIdentity;

#[derive(Debug, Clone)]
pub enum QualityMetric {
    /// Runs an external program and parses its score log.
    CommandLine(CommandMetric),
    /// Assembles features and predicts with a regression model.
    ModelInference(InferenceMetric),
}

impl QualityMetric {
    pub fn identity(&self) -> &MetricIdentity {
        match self {
            QualityMetric::CommandLine(metric) => metric.identity(),
            QualityMetric::ModelInference(metric) => metric.identity(),
        }
    }

    pub fn executor_id(&self) -> ExecutorId {
        match self {
            QualityMetric::CommandLine(metric) => metric.executor_id(),
            QualityMetric::ModelInference(metric) => metric.executor_id().clone(),
        }
    }

    pub fn scores_key(&self) -> String {
        self.identity().scores_key()
    }

    pub fn score_key(&self) -> String {
        self.identity().score_key()
    }

    pub async fn compute(
        &self,
        asset: &Asset,
        cancel: &CancellationToken,
    ) -> RunnerResult<ScoreRecord> {
        let record = match self {
            QualityMetric::CommandLine(metric) => metric.compute(asset, cancel).await?,
            QualityMetric::ModelInference(metric) => metric.compute(asset, cancel).await?,
        };
        info!(
            executor = record.executor_id(),
            asset = %asset,
            frames = record.frame_count(),
            "computed quality scores"
        );
        Ok(record)
    }

    /// Deletes the artifacts owned by this variant for `asset`.
    pub async fn remove_artifacts(&self, asset: &Asset) -> RunnerResult<()> {
        match self {
            QualityMetric::CommandLine(metric) => metric.remove_artifacts(asset).await,
            QualityMetric::ModelInference(metric) => metric.remove_artifacts(asset).await,
        }
    }

    /// Computes every asset in order; one failure never stops the rest.
    pub async fn run_all(
        &self,
        assets: &[Asset],
        cancel: &CancellationToken,
    ) -> Vec<RunnerResult<ScoreRecord>> {
        self.run_all_with(assets, cancel, |_, _| {}).await
    }

    /// Like [`QualityMetric::run_all`], reporting each outcome as it lands.
    pub async fn run_all_with<F>(
        &self,
        assets: &[Asset],
        cancel: &CancellationToken,
        mut on_result: F,
    ) -> Vec<RunnerResult<ScoreRecord>>
    where
        F: FnMut(&Asset, &RunnerResult<ScoreRecord>),
    {
        let mut results = Vec::with_capacity(assets.len());
        for asset in assets {
            let result = if cancel.is_cancelled() {
                Err(RunnerError::Cancelled)
            } else {
                self.compute(asset, cancel).await
            };
            if let Err(err) = &result {
                warn!(asset = %asset, error = %err, "quality computation failed");
            }
            on_result(asset, &result);
            results.push(result);
        }
        results
    }
}
