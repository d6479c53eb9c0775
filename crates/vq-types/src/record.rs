use std::collections::BTreeMap;

use serde::Serialize;

use crate::{Asset, TypesError, TypesResult};

/// Per-frame scores computed for one asset by one executor.
///
/// Every sequence is non-empty and all sequences share the same length, which
/// is the frame count of the asset. A record is never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRecord {
    asset: Asset,
    executor_id: String,
    scores: BTreeMap<String, Vec<f64>>,
}

/// Record produced by a feature assembler; keys are feature score keys.
pub type FeatureResult = ScoreRecord;

impl ScoreRecord {
    pub fn new(
        asset: Asset,
        executor_id: impl Into<String>,
        scores: BTreeMap<String, Vec<f64>>,
    ) -> TypesResult<Self> {
        let executor_id = executor_id.into();
        let mut expected = None;
        for (key, values) in &scores {
            if values.is_empty() {
                return Err(TypesError::EmptyScores { key: key.clone() });
            }
            match expected {
                None => expected = Some(values.len()),
                Some(expected) if expected != values.len() => {
                    return Err(TypesError::FrameCountMismatch {
                        key: key.clone(),
                        expected,
                        actual: values.len(),
                    });
                }
                Some(_) => {}
            }
        }
        if expected.is_none() {
            return Err(TypesError::EmptyRecord { executor_id });
        }
        Ok(Self {
            asset,
            executor_id,
            scores,
        })
    }

    pub fn asset(&self) -> &Asset {
        &self.asset
    }

    pub fn executor_id(&self) -> &str {
        &self.executor_id
    }

    pub fn frame_count(&self) -> usize {
        self.scores.values().next().map(Vec::len).unwrap_or(0)
    }

    pub fn get(&self, key: &str) -> Option<&[f64]> {
        self.scores.get(key).map(Vec::as_slice)
    }

    /// Looks up a sequence whose presence is guaranteed by the producer.
    pub fn require(&self, key: &str) -> TypesResult<&[f64]> {
        self.get(key).ok_or_else(|| TypesError::MissingKey {
            key: key.to_string(),
        })
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.scores.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.scores.keys().map(String::as_str)
    }

    pub fn scores(&self) -> &BTreeMap<String, Vec<f64>> {
        &self.scores
    }

    pub fn into_scores(self) -> BTreeMap<String, Vec<f64>> {
        self.scores
    }
}
