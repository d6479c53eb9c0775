use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use vq_feature::{ExternalFeatureAssembler, ExtractorCatalog, FeatureAssembler, FeatureSpec};
use vq_model::ModelLoader;
use vq_types::ExecutorId;

use crate::config::RunnerConfig;
use crate::error::{RunnerError, RunnerResult};
use crate::identity::MetricIdentity;
use crate::metric::{
    CommandMetric, GeneralPipeline, InferenceMetric, LegacyPipeline, QualityMetric, RescaleBound,
};

const VMAF_FEATURE_TYPE: &str = "VMAF_feature";

const LEGACY_BOUNDS: [(&str, f64, f64); 4] = [
    ("VMAF_feature_vif_scores", 0.0, 1.0),
    ("VMAF_feature_adm_scores", 0.4, 1.0),
    ("VMAF_feature_ansnr_scores", 10.0, 50.0),
    ("VMAF_feature_motion_scores", 0.0, 20.0),
];
const LEGACY_MOTION_KEY: &str = "VMAF_feature_motion_scores";
const DEFAULT_VMAF_ATOMS: [&str; 4] = ["vif", "adm", "motion", "ansnr"];

/// Per-metric choices that become part of the executor identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricOptions {
    pub model_filepath: Option<PathBuf>,
    pub enable_warp: bool,
}

/// Shared collaborators handed to every metric factory.
pub struct MetricContext {
    config: RunnerConfig,
    assembler: Arc<dyn FeatureAssembler>,
    models: ModelLoader,
}

impl MetricContext {
    pub fn new(
        config: RunnerConfig,
        assembler: Arc<dyn FeatureAssembler>,
    ) -> RunnerResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            assembler,
            models: ModelLoader::new(),
        })
    }

    /// Context whose assembler runs the extractors declared in `config`.
    pub fn with_external_extractors(config: RunnerConfig) -> RunnerResult<Self> {
        let catalog = ExtractorCatalog::from_definitions(config.resolved_extractors())?;
        let assembler = ExternalFeatureAssembler::new(catalog, config.workdir.clone())
            .with_options(config.invocation_options());
        Self::new(config, Arc::new(assembler))
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn assembler(&self) -> Arc<dyn FeatureAssembler> {
        self.assembler.clone()
    }

    pub fn models(&self) -> &ModelLoader {
        &self.models
    }
}

impl fmt::Debug for MetricContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricContext")
            .field("config", &self.config)
            .field("assembler", &self.assembler.name())
            .finish_non_exhaustive()
    }
}

pub type MetricFactory = fn(&MetricContext, &MetricOptions) -> RunnerResult<QualityMetric>;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BuiltinMetric {
    Psnr,
    Vmaf,
    VmafLegacy,
}

impl BuiltinMetric {
    pub const ALL: [BuiltinMetric; 3] = [
        BuiltinMetric::Psnr,
        BuiltinMetric::Vmaf,
        BuiltinMetric::VmafLegacy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BuiltinMetric::Psnr => "PSNR",
            BuiltinMetric::Vmaf => "VMAF",
            BuiltinMetric::VmafLegacy => "VMAF_legacy",
        }
    }

    pub fn version(&self) -> &'static str {
        match self {
            BuiltinMetric::Psnr => "1.0",
            BuiltinMetric::Vmaf => "0.3.2",
            BuiltinMetric::VmafLegacy => "1.2",
        }
    }

    pub fn identity(&self) -> MetricIdentity {
        MetricIdentity::new(self.as_str(), self.version())
    }

    fn factory(&self) -> MetricFactory {
        match self {
            BuiltinMetric::Psnr => build_psnr,
            BuiltinMetric::Vmaf => build_vmaf,
            BuiltinMetric::VmafLegacy => build_vmaf_legacy,
        }
    }
}

#[derive(Debug)]
pub struct BuiltinMetricParseError(pub String);

impl fmt::Display for BuiltinMetricParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown built-in metric '{}'", self.0)
    }
}

impl std::error::Error for BuiltinMetricParseError {}

impl FromStr for BuiltinMetric {
    type Err = BuiltinMetricParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        BuiltinMetric::ALL
            .into_iter()
            .find(|metric| metric.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| BuiltinMetricParseError(trimmed.to_string()))
    }
}

/// Metric identifiers mapped to the factories that build them.
#[derive(Debug, Clone, Default)]
pub struct MetricRegistry {
    factories: BTreeMap<String, MetricFactory>,
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let factories = BuiltinMetric::ALL
            .into_iter()
            .map(|metric| (metric.as_str().to_string(), metric.factory()))
            .collect();
        Self { factories }
    }

    pub fn register(
        &mut self,
        id: impl Into<String>,
        factory: MetricFactory,
    ) -> RunnerResult<()> {
        let id = id.into();
        if self.factories.contains_key(&id) {
            return Err(RunnerError::DuplicateMetric { id });
        }
        self.factories.insert(id, factory);
        Ok(())
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    pub fn create(
        &self,
        id: &str,
        context: &MetricContext,
        options: &MetricOptions,
    ) -> RunnerResult<QualityMetric> {
        let factory = self
            .factories
            .get(id)
            .ok_or_else(|| RunnerError::UnknownMetric { id: id.to_string() })?;
        factory(context, options)
    }
}

fn reject_options(metric: BuiltinMetric, options: &MetricOptions) -> RunnerResult<()> {
    if options.model_filepath.is_some() || options.enable_warp {
        return Err(RunnerError::config(format!(
            "{} accepts neither a model file nor warping",
            metric.as_str()
        )));
    }
    Ok(())
}

fn build_psnr(context: &MetricContext, options: &MetricOptions) -> RunnerResult<QualityMetric> {
    reject_options(BuiltinMetric::Psnr, options)?;
    let config = context.config();
    let metric = CommandMetric::new(
        BuiltinMetric::Psnr.identity(),
        config.psnr_program_path(),
        "psnr",
        config.workdir.clone(),
    )
    .with_options(config.invocation_options());
    Ok(QualityMetric::CommandLine(metric))
}

fn absolute_path(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Executor id of `metric`, carrying the absolute model path whenever it is
/// not the built-in default model.
fn model_executor_id(metric: BuiltinMetric, model_path: &Path, builtin: &Path) -> ExecutorId {
    let mut executor_id = metric.identity().executor_id(Vec::<(&str, &str)>::new());
    let model_path = absolute_path(model_path);
    if model_path != absolute_path(builtin) {
        executor_id.set_param("model_filepath", model_path.display());
    }
    executor_id
}

fn build_vmaf_legacy(
    context: &MetricContext,
    options: &MetricOptions,
) -> RunnerResult<QualityMetric> {
    reject_options(BuiltinMetric::VmafLegacy, options)?;
    let model_path = context.config().vmaf_legacy_model_path();
    let model = context.models().libsvm(&model_path)?;
    let bounds = LEGACY_BOUNDS
        .iter()
        .map(|&(key, lower, upper)| RescaleBound::new(key, lower, upper))
        .collect();
    let pipeline = LegacyPipeline::new(bounds, LEGACY_MOTION_KEY, model)?;
    let executor_id = model_executor_id(
        BuiltinMetric::VmafLegacy,
        &model_path,
        &RunnerConfig::default().vmaf_legacy_model_path(),
    );
    Ok(QualityMetric::ModelInference(InferenceMetric::legacy(
        BuiltinMetric::VmafLegacy.identity(),
        executor_id,
        FeatureSpec::new().with_all(VMAF_FEATURE_TYPE),
        context.assembler(),
        pipeline,
    )))
}

fn build_vmaf(context: &MetricContext, options: &MetricOptions) -> RunnerResult<QualityMetric> {
    let config = context.config();
    let model_path = match &options.model_filepath {
        Some(path) => config.resolve(path),
        None => config.vmaf_model_path(),
    };
    let model = context.models().trained(&model_path)?;
    let default_spec = FeatureSpec::new().with_atoms(VMAF_FEATURE_TYPE, DEFAULT_VMAF_ATOMS);
    let pipeline = GeneralPipeline::new(model, default_spec, options.enable_warp)?;

    let identity = BuiltinMetric::Vmaf.identity();
    let mut executor_id = model_executor_id(
        BuiltinMetric::Vmaf,
        &model_path,
        &RunnerConfig::default().vmaf_model_path(),
    );
    if options.enable_warp {
        executor_id.set_param("enable_warp", true);
    }
    Ok(QualityMetric::ModelInference(InferenceMetric::general(
        identity,
        executor_id,
        context.assembler(),
        pipeline,
    )))
}
