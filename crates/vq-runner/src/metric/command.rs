use std::path::{Path, PathBuf};

use tracing::debug;
use vq_process::{
    InvocationOptions, ProcessError, ProgramInvocation, read_score_log, remove_if_exists,
    run_to_log,
};
use vq_types::{Asset, CancellationToken, ExecutorId, ScoreRecord};

use crate::error::{RunnerError, RunnerResult};
use crate::identity::MetricIdentity;

/// Metric computed by an external program that prints one indexed score
/// line per frame.
#[derive(Debug, Clone)]
pub struct CommandMetric {
    identity: MetricIdentity,
    program: PathBuf,
    atom: String,
    workdir: PathBuf,
    options: InvocationOptions,
}

impl CommandMetric {
    pub fn new(
        identity: MetricIdentity,
        program: impl Into<PathBuf>,
        atom: impl Into<String>,
        workdir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            identity,
            program: program.into(),
            atom: atom.into(),
            workdir: workdir.into(),
            options: InvocationOptions::default(),
        }
    }

    pub fn with_options(mut self, options: InvocationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn identity(&self) -> &MetricIdentity {
        &self.identity
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn executor_id(&self) -> ExecutorId {
        self.identity.executor_id(Vec::<(&str, &str)>::new())
    }

    pub fn log_path(&self, asset: &Asset) -> PathBuf {
        self.workdir.join(format!(
            "{}_{}.log",
            self.executor_id(),
            asset.artifact_stem()
        ))
    }

    pub async fn compute(
        &self,
        asset: &Asset,
        cancel: &CancellationToken,
    ) -> RunnerResult<ScoreRecord> {
        if cancel.is_cancelled() {
            return Err(RunnerError::Cancelled);
        }
        let log_path = self.log_path(asset);
        remove_if_exists(&log_path).await?;

        let invocation = ProgramInvocation::new(&self.program).asset_args(asset);
        debug!(command = %invocation, log = %log_path.display(), "running quality program");
        run_to_log(&invocation, &log_path, &self.options, cancel).await?;

        let mut parsed = read_score_log(&log_path, &[self.atom.as_str()]).await?;
        let scores = parsed
            .remove(&self.atom)
            .ok_or_else(|| ProcessError::NoScores {
                atom: self.atom.clone(),
            })?;
        let record = ScoreRecord::new(
            asset.clone(),
            self.executor_id().to_string(),
            [(self.identity.scores_key(), scores)].into_iter().collect(),
        )?;
        Ok(record)
    }

    pub async fn remove_artifacts(&self, asset: &Asset) -> RunnerResult<()> {
        let log_path = self.log_path(asset);
        if remove_if_exists(&log_path).await? {
            debug!(log = %log_path.display(), "removed quality log");
        }
        Ok(())
    }
}
