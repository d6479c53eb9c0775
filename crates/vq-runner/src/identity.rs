use std::fmt;

use vq_types::{ExecutorId, score_key, scores_key};

/// Fixed type tag and version of one metric family.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetricIdentity {
    type_tag: String,
    version: String,
}

impl MetricIdentity {
    pub fn new(type_tag: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            type_tag: type_tag.into(),
            version: version.into(),
        }
    }

    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn scores_key(&self) -> String {
        scores_key(&self.type_tag)
    }

    pub fn score_key(&self) -> String {
        score_key(&self.type_tag)
    }

    /// Executor identity extended by the given optional parameters.
    pub fn executor_id<'a, I, V>(&self, params: I) -> ExecutorId
    where
        I: IntoIterator<Item = (&'a str, V)>,
        V: fmt::Display,
    {
        params.into_iter().fold(
            ExecutorId::new(&self.type_tag, &self.version),
            |id, (key, value)| id.with_param(key, value),
        )
    }
}

impl fmt::Display for MetricIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.type_tag, self.version)
    }
}
