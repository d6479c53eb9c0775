use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use vq_feature::ExtractorDefinition;
use vq_process::InvocationOptions;

use crate::error::{RunnerError, RunnerResult};

const DEFAULT_PROCESS_TIMEOUT_SECS: u64 = 600;

/// Immutable configuration shared by every metric built from a registry.
///
/// Relative program and model paths resolve against `resource_root`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub workdir: PathBuf,
    pub resource_root: PathBuf,
    pub process_timeout_secs: u64,
    pub psnr_program: PathBuf,
    pub vmaf_model: PathBuf,
    pub vmaf_legacy_model: PathBuf,
    pub extractors: Vec<ExtractorDefinition>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            workdir: PathBuf::from("workspace/workdir"),
            resource_root: PathBuf::from("."),
            process_timeout_secs: DEFAULT_PROCESS_TIMEOUT_SECS,
            psnr_program: PathBuf::from("feature/psnr"),
            vmaf_model: PathBuf::from("resource/model/nflxall_vmafv4.json"),
            vmaf_legacy_model: PathBuf::from("resource/model/model_V8a.model"),
            extractors: Vec::new(),
        }
    }
}

impl RunnerConfig {
    pub fn validate(&self) -> RunnerResult<()> {
        if self.process_timeout_secs == 0 {
            return Err(RunnerError::config("process_timeout_secs must be positive"));
        }
        if self.workdir.as_os_str().is_empty() {
            return Err(RunnerError::config("workdir must not be empty"));
        }
        Ok(())
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.resource_root.join(path)
        }
    }

    pub fn psnr_program_path(&self) -> PathBuf {
        self.resolve(&self.psnr_program)
    }

    pub fn vmaf_model_path(&self) -> PathBuf {
        self.resolve(&self.vmaf_model)
    }

    pub fn vmaf_legacy_model_path(&self) -> PathBuf {
        self.resolve(&self.vmaf_legacy_model)
    }

    /// Extractor definitions with their programs resolved.
    pub fn resolved_extractors(&self) -> Vec<ExtractorDefinition> {
        self.extractors
            .iter()
            .cloned()
            .map(|mut definition| {
                definition.program = self.resolve(&definition.program);
                definition
            })
            .collect()
    }

    pub fn invocation_options(&self) -> InvocationOptions {
        InvocationOptions::with_timeout(Duration::from_secs(self.process_timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_resolve_against_resource_root() {
        let config = RunnerConfig {
            resource_root: PathBuf::from("/opt/vq"),
            vmaf_model: PathBuf::from("/models/custom.json"),
            ..RunnerConfig::default()
        };
        assert_eq!(config.psnr_program_path(), PathBuf::from("/opt/vq/feature/psnr"));
        assert_eq!(config.vmaf_model_path(), PathBuf::from("/models/custom.json"));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = RunnerConfig {
            process_timeout_secs: 0,
            ..RunnerConfig::default()
        };
        assert!(matches!(config.validate(), Err(RunnerError::Config { .. })));
        assert!(RunnerConfig::default().validate().is_ok());
    }
}
