//! Quality metric runners: the metric abstraction, the command-line and
//! model-inference variants, score post-processing and the registry that
//! builds metrics from configuration.

mod config;
mod error;
mod identity;
pub mod metric;
pub mod postprocess;
mod registry;

pub use config::RunnerConfig;
pub use error::{RunnerError, RunnerResult};
pub use identity::MetricIdentity;
pub use metric::{
    CommandMetric, GeneralPipeline, InferenceMetric, InferencePipeline, LegacyPipeline,
    QualityMetric, RescaleBound,
};
pub use registry::{
    BuiltinMetric, BuiltinMetricParseError, MetricContext, MetricFactory, MetricOptions,
    MetricRegistry,
};
