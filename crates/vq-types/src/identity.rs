use std::collections::BTreeMap;
use std::fmt;

/// Key holding the full per-frame sequence produced by metric `type_tag`.
pub fn scores_key(type_tag: &str) -> String {
    format!("{type_tag}_scores")
}

/// Key reserved for an aggregate value of metric `type_tag`.
pub fn score_key(type_tag: &str) -> String {
    format!("{type_tag}_score")
}

/// Key of one per-frame series emitted by a feature extractor.
pub fn feature_scores_key(feature_type: &str, atom: &str) -> String {
    format!("{feature_type}_{atom}_scores")
}

/// Stable cache/lookup key of a metric configuration.
///
/// Rendered as `TYPE_VERSION` followed by every optional parameter as
/// `key_value`. Parameters are kept in a sorted map so the rendering never
/// depends on the order in which they were supplied.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExecutorId {
    type_tag: String,
    version: String,
    params: BTreeMap<String, String>,
}

impl ExecutorId {
    pub fn new(type_tag: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            type_tag: type_tag.into(),
            version: version.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.set_param(key, value);
        self
    }

    pub fn set_param(&mut self, key: impl Into<String>, value: impl fmt::Display) {
        self.params.insert(key.into(), value.to_string());
    }

    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `TYPE_VERSION` without optional parameters.
    pub fn base(&self) -> String {
        format!("{}_{}", self.type_tag, self.version)
    }
}

impl fmt::Display for ExecutorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.type_tag, self.version)?;
        if self.params.is_empty() {
            return Ok(());
        }
        let rendered: Vec<String> = self
            .params
            .iter()
            .map(|(key, value)| format!("{key}_{value}"))
            .collect();
        write!(f, "_{}", rendered.join("_"))
    }
}
