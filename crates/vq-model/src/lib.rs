//! Pre-trained regression models mapping per-frame feature vectors to
//! quality scores.
//!
//! Two persisted forms are understood: a plain libsvm text model (used as-is
//! by the legacy metric) and a JSON envelope carrying feature names, input
//! normalization, the regressor and free-form metadata.

mod error;
mod linear;
mod loader;
mod metadata;
mod predictor;
mod svm;
mod trained;

pub use error::{ModelError, ModelResult};
pub use linear::LinearModel;
pub use loader::ModelLoader;
pub use metadata::{DIS1ST_THR, FEATURE_DICT, ModelMetadata, SCORE_CLIP};
pub use predictor::{RegressionPredictor, perframe_vectors};
pub use svm::{SvmKernel, SvmModel};
pub use trained::{NormType, TrainedModel};
