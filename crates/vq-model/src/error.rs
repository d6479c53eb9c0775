use std::path::PathBuf;

use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model file {} does not exist", .path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read model file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("model file {} is corrupt: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("libsvm model line {line}: {reason}")]
    InvalidLibsvm { line: usize, reason: String },

    #[error("invalid model: {reason}")]
    Invalid { reason: String },

    #[error("invalid metadata '{key}': {reason}")]
    InvalidMetadata { key: String, reason: String },

    #[error("model input feature '{key}' is missing")]
    MissingFeature { key: String },

    #[error("feature '{key}' has {actual} frames, expected {expected}")]
    FeatureLengthMismatch {
        key: String,
        expected: usize,
        actual: usize,
    },

    #[error("feature vector has {actual} values, model expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl ModelError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_metadata(key: &str, reason: impl Into<String>) -> Self {
        Self::InvalidMetadata {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}
