use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use vq_runner::RunnerResult;
use vq_types::{Asset, ScoreRecord};

use crate::error::AppError;

/// Outcome of one asset in the JSON report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetReport {
    pub asset: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executor_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_score: Option<f64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub scores: BTreeMap<String, Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub metric: String,
    pub executor_id: String,
    pub assets: Vec<AssetReport>,
}

impl Report {
    pub fn new(metric: impl Into<String>, executor_id: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            executor_id: executor_id.into(),
            assets: Vec::new(),
        }
    }

    /// Records one asset outcome; `scores_key` picks the series averaged into
    /// `mean_score`.
    pub fn push(&mut self, asset: &Asset, scores_key: &str, result: RunnerResult<ScoreRecord>) {
        let entry = match result {
            Ok(record) => AssetReport {
                asset: asset.identifier(),
                executor_id: Some(record.executor_id().to_string()),
                mean_score: record.get(scores_key).map(mean),
                scores: record.into_scores(),
                error: None,
            },
            Err(err) => AssetReport {
                asset: asset.identifier(),
                executor_id: None,
                mean_score: None,
                scores: BTreeMap::new(),
                error: Some(err.to_string()),
            },
        };
        self.assets.push(entry);
    }

    pub fn failed(&self) -> usize {
        self.assets.iter().filter(|a| a.error.is_some()).count()
    }

    pub fn to_json(&self) -> Result<String, AppError> {
        serde_json::to_string_pretty(self).map_err(|source| AppError::Json { path: None, source })
    }

    /// Writes the report to `path`, or to stdout when absent.
    pub fn write(&self, path: Option<&Path>) -> Result<(), AppError> {
        let json = self.to_json()?;
        match path {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent).map_err(|source| AppError::Io {
                        path: parent.to_path_buf(),
                        source,
                    })?;
                }
                std::fs::write(path, json).map_err(|source| AppError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                writeln!(stdout, "{json}").map_err(|source| AppError::Io {
                    path: "<stdout>".into(),
                    source,
                })
            }
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
