use thiserror::Error;
use vq_feature::FeatureError;
use vq_model::ModelError;
use vq_process::ProcessError;
use vq_types::TypesError;

pub type RunnerResult<T> = Result<T, RunnerError>;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Types(#[from] TypesError),

    #[error("rescale bounds for '{key}' are degenerate: upper {upper} must exceed lower {lower}")]
    InvalidRescaleBounds { key: String, lower: f64, upper: f64 },

    #[error("unknown metric '{id}'")]
    UnknownMetric { id: String },

    #[error("metric '{id}' is already registered")]
    DuplicateMetric { id: String },

    #[error("invalid runner configuration: {reason}")]
    Config { reason: String },

    #[error("score computation cancelled")]
    Cancelled,
}

impl RunnerError {
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// True for cancellation raised at any layer.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            RunnerError::Cancelled
                | RunnerError::Feature(FeatureError::Cancelled)
                | RunnerError::Process(ProcessError::Cancelled { .. })
        )
    }
}
