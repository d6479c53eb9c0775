use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::predictor::RegressionPredictor;

/// `y = coefficients . x + bias`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub coefficients: Vec<f64>,
    #[serde(default)]
    pub bias: f64,
}

impl LinearModel {
    pub fn new(coefficients: Vec<f64>, bias: f64) -> Self {
        Self { coefficients, bias }
    }
}

impl RegressionPredictor for LinearModel {
    fn dimension(&self) -> Option<usize> {
        Some(self.coefficients.len())
    }

    fn predict_one(&self, x: &[f64]) -> ModelResult<f64> {
        if x.len() != self.coefficients.len() {
            return Err(ModelError::DimensionMismatch {
                expected: self.coefficients.len(),
                actual: x.len(),
            });
        }
        Ok(self
            .coefficients
            .iter()
            .zip(x)
            .map(|(c, v)| c * v)
            .sum::<f64>()
            + self.bias)
    }
}
