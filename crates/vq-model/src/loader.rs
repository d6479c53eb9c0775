use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::error::ModelResult;
use crate::svm::SvmModel;
use crate::trained::TrainedModel;

/// Loads models from disk once per path and shares them afterwards.
#[derive(Debug, Default)]
pub struct ModelLoader {
    trained: Mutex<HashMap<PathBuf, Arc<TrainedModel>>>,
    svm: Mutex<HashMap<PathBuf, Arc<SvmModel>>>,
}

impl ModelLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trained(&self, path: &Path) -> ModelResult<Arc<TrainedModel>> {
        load_cached(&self.trained, path, TrainedModel::from_file)
    }

    pub fn libsvm(&self, path: &Path) -> ModelResult<Arc<SvmModel>> {
        load_cached(&self.svm, path, SvmModel::from_file)
    }

    /// Drops every cached model so the next request re-reads the file.
    pub fn clear(&self) {
        self.trained
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.svm
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

fn load_cached<T>(
    cache: &Mutex<HashMap<PathBuf, Arc<T>>>,
    path: &Path,
    load: impl FnOnce(&Path) -> ModelResult<T>,
) -> ModelResult<Arc<T>> {
    let mut guard = cache.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(model) = guard.get(path) {
        return Ok(model.clone());
    }
    let model = Arc::new(load(path)?);
    debug!(path = %path.display(), "loaded model");
    guard.insert(path.to_path_buf(), model.clone());
    Ok(model)
}
