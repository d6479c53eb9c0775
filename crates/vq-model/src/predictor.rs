use std::collections::BTreeMap;

use crate::error::{ModelError, ModelResult};

/// Maps one (already normalized) feature vector to one raw prediction.
pub trait RegressionPredictor: Send + Sync {
    /// Highest feature dimension the predictor reads, when known.
    fn dimension(&self) -> Option<usize> {
        None
    }

    fn predict_one(&self, x: &[f64]) -> ModelResult<f64>;
}

/// Builds one vector per frame, taking features in `feature_names` order.
pub fn perframe_vectors<S: AsRef<str>>(
    feature_names: &[S],
    xs: &BTreeMap<String, Vec<f64>>,
) -> ModelResult<Vec<Vec<f64>>> {
    let mut columns = Vec::with_capacity(feature_names.len());
    for name in feature_names {
        let name = name.as_ref();
        let column = xs.get(name).ok_or_else(|| ModelError::MissingFeature {
            key: name.to_string(),
        })?;
        columns.push((name, column.as_slice()));
    }

    let Some(frames) = columns.first().map(|(_, column)| column.len()) else {
        return Ok(Vec::new());
    };
    for (name, column) in &columns {
        if column.len() != frames {
            return Err(ModelError::FeatureLengthMismatch {
                key: (*name).to_string(),
                expected: frames,
                actual: column.len(),
            });
        }
    }

    Ok((0..frames)
        .map(|frame| columns.iter().map(|(_, column)| column[frame]).collect())
        .collect())
}
