use thiserror::Error;
use vq_process::ProcessError;
use vq_types::TypesError;

#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("no extractor configured for feature type '{type_tag}'")]
    UnknownExtractor { type_tag: String },

    #[error("extractor '{type_tag}' does not emit atom '{atom}'")]
    UnknownAtom { type_tag: String, atom: String },

    #[error("extractor '{type_tag}' is configured more than once")]
    DuplicateExtractor { type_tag: String },

    #[error("invalid feature spec: {reason}")]
    InvalidSpec { reason: String },

    #[error("feature assembly was cancelled")]
    Cancelled,

    #[error("feature assembler error: {message}")]
    Backend { message: String },

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error(transparent)]
    Types(#[from] TypesError),
}

impl FeatureError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_spec(reason: impl Into<String>) -> Self {
        Self::InvalidSpec {
            reason: reason.into(),
        }
    }
}
