use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use directories::{BaseDirs, ProjectDirs};
use serde::Deserialize;
use vq_feature::ExtractorDefinition;
use vq_runner::{MetricOptions, RunnerConfig};

use crate::cli::{CliArgs, CliSources};

const PROJECT_CONFIG_FILE: &str = "vq-score.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    metric: Option<String>,
    workdir: Option<String>,
    resource_root: Option<String>,
    process_timeout_secs: Option<u64>,
    psnr_program: Option<String>,
    vmaf_model: Option<String>,
    vmaf_legacy_model: Option<String>,
    enable_warp: Option<bool>,
    extractors: Vec<ExtractorDefinition>,
}

#[derive(Debug)]
pub struct EffectiveSettings {
    pub metric: String,
    pub options: MetricOptions,
    pub runner: RunnerConfig,
    pub config_dir: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    InvalidValue {
        path: Option<PathBuf>,
        field: &'static str,
        value: String,
    },
    NotFound {
        path: PathBuf,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read config file {}: {}", path.display(), source)
            }
            ConfigError::Parse { path, source } => {
                write!(f, "failed to parse config file {}: {}", path.display(), source)
            }
            ConfigError::InvalidValue { path, field, value } => {
                if let Some(path) = path {
                    write!(
                        f,
                        "invalid value '{}' for '{}' in {}",
                        value,
                        field,
                        path.display()
                    )
                } else {
                    write!(f, "invalid value '{}' for '{}'", value, field)
                }
            }
            ConfigError::NotFound { path } => {
                write!(f, "config file {} does not exist", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::InvalidValue { .. } => None,
            ConfigError::NotFound { .. } => None,
        }
    }
}

pub fn resolve_settings(
    cli: &CliArgs,
    sources: &CliSources,
) -> Result<EffectiveSettings, ConfigError> {
    let (file, config_path) = load_config(cli.config.as_deref())?;
    merge(cli, sources, file, config_path)
}

fn load_config(
    path_override: Option<&Path>,
) -> Result<(FileConfig, Option<PathBuf>), ConfigError> {
    if let Some(path) = path_override {
        let path = expand_pathbuf(path.to_path_buf());
        if !path.exists() {
            return Err(ConfigError::NotFound { path });
        }
        return read_config(path);
    }

    let candidates = [project_config_path(), default_config_path()];
    for path in candidates.into_iter().flatten() {
        if path.exists() {
            return read_config(path);
        }
    }
    Ok((FileConfig::default(), None))
}

fn read_config(path: PathBuf) -> Result<(FileConfig, Option<PathBuf>), ConfigError> {
    let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    let config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.clone(),
        source,
    })?;
    Ok((config, Some(path)))
}

fn merge(
    cli: &CliArgs,
    sources: &CliSources,
    file: FileConfig,
    config_path: Option<PathBuf>,
) -> Result<EffectiveSettings, ConfigError> {
    let config_dir = config_path
        .as_ref()
        .and_then(|path| path.parent().map(|dir| dir.to_path_buf()));
    let base = config_dir.as_deref();

    let FileConfig {
        metric: file_metric,
        workdir: file_workdir,
        resource_root: file_resource_root,
        process_timeout_secs: file_timeout,
        psnr_program: file_psnr_program,
        vmaf_model: file_vmaf_model,
        vmaf_legacy_model: file_vmaf_legacy_model,
        enable_warp: file_enable_warp,
        extractors,
    } = file;

    let mut metric = cli.metric.trim().to_string();
    if !sources.metric_from_cli {
        if let Some(value) = normalize_string(file_metric) {
            metric = value;
        }
    }
    if metric.is_empty() {
        return Err(ConfigError::InvalidValue {
            path: None,
            field: "metric",
            value: metric,
        });
    }

    let defaults = RunnerConfig::default();
    let workdir = match &cli.workdir {
        Some(dir) => expand_pathbuf(dir.clone()),
        None => normalize_string(file_workdir)
            .and_then(|value| resolve_path_from_config(value, base))
            .unwrap_or_else(|| match base {
                Some(dir) => dir.join(&defaults.workdir),
                None => defaults.workdir.clone(),
            }),
    };
    let resource_root = normalize_string(file_resource_root)
        .and_then(|value| resolve_path_from_config(value, base))
        .or_else(|| config_dir.clone())
        .unwrap_or_else(|| defaults.resource_root.clone());

    let mut process_timeout_secs = cli.timeout_secs;
    if !sources.timeout_from_cli {
        if let Some(value) = file_timeout {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    path: config_path,
                    field: "process_timeout_secs",
                    value: value.to_string(),
                });
            }
            process_timeout_secs = value;
        }
    }

    for definition in &extractors {
        if definition.atoms.is_empty() {
            return Err(ConfigError::InvalidValue {
                path: config_path,
                field: "extractors.atoms",
                value: definition.type_tag.clone(),
            });
        }
    }

    let runner = RunnerConfig {
        workdir,
        resource_root,
        process_timeout_secs,
        psnr_program: path_or(file_psnr_program, defaults.psnr_program),
        vmaf_model: path_or(file_vmaf_model, defaults.vmaf_model),
        vmaf_legacy_model: path_or(file_vmaf_legacy_model, defaults.vmaf_legacy_model),
        extractors,
    };

    let options = MetricOptions {
        model_filepath: cli.model.clone().map(expand_pathbuf),
        enable_warp: cli.enable_warp || file_enable_warp.unwrap_or(false),
    };

    Ok(EffectiveSettings {
        metric,
        options,
        runner,
        config_dir,
    })
}

fn path_or(value: Option<String>, default: PathBuf) -> PathBuf {
    normalize_string(value)
        .map(|value| expand_home_path(&value))
        .unwrap_or(default)
}

fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("rs", "vq-score", "vq-score")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    env::current_dir()
        .ok()
        .map(|dir| dir.join(PROJECT_CONFIG_FILE))
}

fn normalize_string(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn expand_pathbuf(path: PathBuf) -> PathBuf {
    match path.to_str() {
        Some(s) => expand_home_path(s),
        None => path,
    }
}

fn resolve_path_from_config(value: String, base: Option<&Path>) -> Option<PathBuf> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    let expanded = expand_home_path(trimmed);
    match base {
        Some(base) if !expanded.is_absolute() => Some(base.join(expanded)),
        _ => Some(expanded),
    }
}

fn expand_home_path(value: &str) -> PathBuf {
    if value == "~" {
        if let Some(base) = BaseDirs::new() {
            return base.home_dir().to_path_buf();
        }
    } else if let Some(stripped) = value.strip_prefix("~/") {
        if let Some(base) = BaseDirs::new() {
            return base.home_dir().join(stripped);
        }
    }
    PathBuf::from(value)
}
