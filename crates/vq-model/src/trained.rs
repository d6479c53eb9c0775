use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::linear::LinearModel;
use crate::metadata::ModelMetadata;
use crate::predictor::{RegressionPredictor, perframe_vectors};
use crate::svm::SvmModel;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormType {
    #[default]
    None,
    /// Index 0 of slopes/intercepts rescales the output, index `i + 1` the
    /// i-th input feature.
    LinearRescale,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "model_type")]
enum PersistedRegressor {
    #[serde(rename = "libsvm_nusvr")]
    Libsvm { model: String },
    #[serde(rename = "linear")]
    Linear(LinearModel),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedModel {
    #[serde(flatten)]
    regressor: PersistedRegressor,
    feature_names: Vec<String>,
    #[serde(default)]
    norm_type: NormType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    slopes: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    intercepts: Vec<f64>,
    #[serde(default)]
    info: ModelMetadata,
}

/// A regressor together with the feature order, input normalization and
/// metadata it was trained with.
#[derive(Clone)]
pub struct TrainedModel {
    feature_names: Vec<String>,
    norm_type: NormType,
    slopes: Vec<f64>,
    intercepts: Vec<f64>,
    predictor: Arc<dyn RegressionPredictor>,
    persisted: Option<PersistedRegressor>,
    metadata: ModelMetadata,
}

impl fmt::Debug for TrainedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrainedModel")
            .field("feature_names", &self.feature_names)
            .field("norm_type", &self.norm_type)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

impl TrainedModel {
    /// Wraps an arbitrary predictor; such a model cannot be written back to
    /// disk.
    pub fn from_predictor(
        feature_names: Vec<String>,
        predictor: Arc<dyn RegressionPredictor>,
    ) -> ModelResult<Self> {
        let model = Self {
            feature_names,
            norm_type: NormType::None,
            slopes: Vec::new(),
            intercepts: Vec::new(),
            predictor,
            persisted: None,
            metadata: ModelMetadata::new(),
        };
        model.validate()?;
        Ok(model)
    }

    pub fn linear(feature_names: Vec<String>, model: LinearModel) -> ModelResult<Self> {
        Self::from_persisted(PersistedModel {
            regressor: PersistedRegressor::Linear(model),
            feature_names,
            norm_type: NormType::None,
            slopes: Vec::new(),
            intercepts: Vec::new(),
            info: ModelMetadata::new(),
        })
    }

    pub fn libsvm(feature_names: Vec<String>, model_text: impl Into<String>) -> ModelResult<Self> {
        Self::from_persisted(PersistedModel {
            regressor: PersistedRegressor::Libsvm {
                model: model_text.into(),
            },
            feature_names,
            norm_type: NormType::None,
            slopes: Vec::new(),
            intercepts: Vec::new(),
            info: ModelMetadata::new(),
        })
    }

    pub fn with_linear_rescale(
        mut self,
        slopes: Vec<f64>,
        intercepts: Vec<f64>,
    ) -> ModelResult<Self> {
        self.norm_type = NormType::LinearRescale;
        self.slopes = slopes;
        self.intercepts = intercepts;
        self.validate()?;
        Ok(self)
    }

    pub fn with_metadata(mut self, metadata: ModelMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn from_json_str(text: &str) -> ModelResult<Self> {
        let persisted: PersistedModel = serde_json::from_str(text)
            .map_err(|err| ModelError::invalid(format!("malformed model document: {err}")))?;
        Self::from_persisted(persisted)
    }

    pub fn from_file(path: &Path) -> ModelResult<Self> {
        if !path.exists() {
            return Err(ModelError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let bytes = std::fs::read(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let persisted: PersistedModel =
            serde_json::from_slice(&bytes).map_err(|source| ModelError::Corrupt {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_persisted(persisted)
    }

    pub fn to_json_string(&self) -> ModelResult<String> {
        let regressor = self.persisted.clone().ok_or_else(|| {
            ModelError::invalid("model wraps a custom predictor and has no persisted form")
        })?;
        let persisted = PersistedModel {
            regressor,
            feature_names: self.feature_names.clone(),
            norm_type: self.norm_type,
            slopes: self.slopes.clone(),
            intercepts: self.intercepts.clone(),
            info: self.metadata.clone(),
        };
        serde_json::to_string_pretty(&persisted)
            .map_err(|err| ModelError::invalid(format!("cannot serialize model: {err}")))
    }

    pub fn to_file(&self, path: &Path) -> ModelResult<()> {
        let text = self.to_json_string()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ModelError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, text).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    fn from_persisted(persisted: PersistedModel) -> ModelResult<Self> {
        let predictor: Arc<dyn RegressionPredictor> = match &persisted.regressor {
            PersistedRegressor::Libsvm { model } => Arc::new(model.parse::<SvmModel>()?),
            PersistedRegressor::Linear(linear) => Arc::new(linear.clone()),
        };
        let model = Self {
            feature_names: persisted.feature_names,
            norm_type: persisted.norm_type,
            slopes: persisted.slopes,
            intercepts: persisted.intercepts,
            predictor,
            persisted: Some(persisted.regressor),
            metadata: persisted.info,
        };
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> ModelResult<()> {
        if self.feature_names.is_empty() {
            return Err(ModelError::invalid("model declares no feature names"));
        }
        let n = self.feature_names.len();
        if let Some(dim) = self.predictor.dimension() {
            if dim > n {
                return Err(ModelError::invalid(format!(
                    "regressor reads {dim} features but only {n} are named"
                )));
            }
        }
        if self.norm_type == NormType::LinearRescale {
            if self.slopes.len() != n + 1 || self.intercepts.len() != n + 1 {
                return Err(ModelError::invalid(format!(
                    "linear_rescale needs {} slopes and intercepts, got {} and {}",
                    n + 1,
                    self.slopes.len(),
                    self.intercepts.len()
                )));
            }
            if self.slopes[0] == 0.0 {
                return Err(ModelError::invalid("output slope must be non-zero"));
            }
        }
        Ok(())
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn norm_type(&self) -> NormType {
        self.norm_type
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut ModelMetadata {
        &mut self.metadata
    }

    /// Predicts one score per frame from feature series keyed by name.
    pub fn predict(&self, xs: &BTreeMap<String, Vec<f64>>) -> ModelResult<Vec<f64>> {
        perframe_vectors(&self.feature_names, xs)?
            .into_iter()
            .map(|mut x| {
                self.normalize(&mut x);
                let y = self.predictor.predict_one(&x)?;
                Ok(self.denormalize(y))
            })
            .collect()
    }

    fn normalize(&self, x: &mut [f64]) {
        if self.norm_type == NormType::LinearRescale {
            for (i, v) in x.iter_mut().enumerate() {
                *v = self.slopes[i + 1] * *v + self.intercepts[i + 1];
            }
        }
    }

    fn denormalize(&self, y: f64) -> f64 {
        match self.norm_type {
            NormType::None => y,
            NormType::LinearRescale => (y - self.intercepts[0]) / self.slopes[0],
        }
    }
}
