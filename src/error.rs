use std::path::PathBuf;

use thiserror::Error;
use vq_runner::RunnerError;
use vq_types::TypesError;

use crate::settings::ConfigError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Runner(#[from] RunnerError),

    #[error(transparent)]
    Types(#[from] TypesError),

    #[error("{message}")]
    Usage { message: String },

    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid JSON{}: {source}", location(.path))]
    Json {
        path: Option<PathBuf>,
        source: serde_json::Error,
    },

    #[error("{failed} of {total} assets failed")]
    AssetsFailed { failed: usize, total: usize },
}

impl AppError {
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }
}

fn location(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|path| format!(" in {}", path.display()))
        .unwrap_or_default()
}
