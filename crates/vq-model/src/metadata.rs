use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ModelError, ModelResult};

/// Feature specification the model was trained on.
pub const FEATURE_DICT: &str = "feature_dict";
/// `[lower, upper]` bounds applied to predicted scores.
pub const SCORE_CLIP: &str = "score_clip";
/// Threshold of the distorted first-moment warp correction.
pub const DIS1ST_THR: &str = "dis1st_thr";

/// Free-form key/value information persisted alongside a model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelMetadata {
    values: BTreeMap<String, Value>,
}

impl ModelMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Returns the stored value, or `default` when the key is absent.
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.values.get(key).cloned().unwrap_or(default)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn feature_dict(&self) -> Option<&Value> {
        self.get(FEATURE_DICT)
    }

    pub fn score_clip(&self) -> ModelResult<Option<(f64, f64)>> {
        let Some(value) = self.get(SCORE_CLIP) else {
            return Ok(None);
        };
        let pair = value
            .as_array()
            .filter(|items| items.len() == 2)
            .and_then(|items| Some((items[0].as_f64()?, items[1].as_f64()?)))
            .ok_or_else(|| {
                ModelError::invalid_metadata(SCORE_CLIP, "expected [lower, upper] numbers")
            })?;
        if pair.0 > pair.1 {
            return Err(ModelError::invalid_metadata(
                SCORE_CLIP,
                format!("lower bound {} exceeds upper bound {}", pair.0, pair.1),
            ));
        }
        Ok(Some(pair))
    }

    pub fn set_score_clip(&mut self, lower: f64, upper: f64) {
        self.set(SCORE_CLIP, vec![lower, upper]);
    }

    pub fn dis1st_thr(&self) -> ModelResult<Option<f64>> {
        let Some(value) = self.get(DIS1ST_THR) else {
            return Ok(None);
        };
        match value.as_f64() {
            Some(thr) if thr > 0.0 && thr.is_finite() => Ok(Some(thr)),
            _ => Err(ModelError::invalid_metadata(
                DIS1ST_THR,
                "expected a positive number",
            )),
        }
    }

    pub fn set_dis1st_thr(&mut self, threshold: f64) {
        self.set(DIS1ST_THR, threshold);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn score_clip_is_validated() {
        let mut meta = ModelMetadata::new();
        assert_eq!(meta.score_clip().unwrap(), None);
        meta.set_score_clip(0.0, 100.0);
        assert_eq!(meta.score_clip().unwrap(), Some((0.0, 100.0)));
        meta.set(SCORE_CLIP, json!([100.0, 0.0]));
        assert!(meta.score_clip().is_err());
        meta.set(SCORE_CLIP, json!("0..100"));
        assert!(meta.score_clip().is_err());
    }

    #[test]
    fn dis1st_thr_must_be_positive() {
        let mut meta = ModelMetadata::new();
        meta.set_dis1st_thr(1.0);
        assert_eq!(meta.dis1st_thr().unwrap(), Some(1.0));
        meta.set(DIS1ST_THR, 0.0);
        assert!(meta.dis1st_thr().is_err());
    }

    #[test]
    fn get_or_falls_back_to_default() {
        let mut meta = ModelMetadata::new();
        assert_eq!(meta.get_or("norm", json!("none")), json!("none"));
        meta.set("norm", "linear_rescale");
        assert_eq!(meta.get_or("norm", json!("none")), json!("linear_rescale"));
    }
}
