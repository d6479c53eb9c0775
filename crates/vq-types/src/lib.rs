//! Shared domain models for the vq-score workspace.
//!
//! This crate centralizes the lightweight data structures exchanged between
//! the process, feature, model, and runner crates. Keep it free of runtime
//! dependencies so every crate can depend on it without pulling an async
//! runtime or a model backend.

mod asset;
mod cancel;
mod identity;
mod record;

pub use asset::{Asset, AssetBuilder, YuvType};
pub use cancel::CancellationToken;
pub use identity::{ExecutorId, feature_scores_key, score_key, scores_key};
pub use record::{FeatureResult, ScoreRecord};

use thiserror::Error;

pub type TypesResult<T> = Result<T, TypesError>;

#[derive(Debug, Error)]
pub enum TypesError {
    #[error("invalid asset: {reason}")]
    InvalidAsset { reason: String },

    #[error("unknown pixel format '{value}'")]
    UnknownYuvType { value: String },

    #[error("result for {executor_id} carries no score sequences")]
    EmptyRecord { executor_id: String },

    #[error("score sequence '{key}' is empty")]
    EmptyScores { key: String },

    #[error("score sequence '{key}' has {actual} frames, expected {expected}")]
    FrameCountMismatch {
        key: String,
        expected: usize,
        actual: usize,
    },

    #[error("result has no score sequence '{key}'")]
    MissingKey { key: String },
}

impl TypesError {
    pub fn invalid_asset(reason: impl Into<String>) -> Self {
        Self::InvalidAsset {
            reason: reason.into(),
        }
    }
}
