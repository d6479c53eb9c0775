use async_trait::async_trait;
use vq_types::{Asset, CancellationToken, FeatureResult};

use crate::error::FeatureError;
use crate::spec::FeatureSpec;

/// Runs the extractors named by a [`FeatureSpec`] for one asset.
///
/// Implementations own every artifact they produce; callers remove them only
/// through [`FeatureAssembler::remove_results`].
#[async_trait]
pub trait FeatureAssembler: Send + Sync {
    /// Stable assembler name used for logging and diagnostics.
    fn name(&self) -> &'static str;

    /// Produces one series per requested atom, keyed by feature score key.
    async fn assemble(
        &self,
        spec: &FeatureSpec,
        asset: &Asset,
        cancel: &CancellationToken,
    ) -> Result<FeatureResult, FeatureError>;

    /// Purges cached feature artifacts of `asset`.
    async fn remove_results(&self, spec: &FeatureSpec, asset: &Asset)
    -> Result<(), FeatureError>;
}

/// Placeholder used when no extractor is wired; assembly always fails.
#[derive(Debug, Default)]
pub struct NoopFeatureAssembler;

#[async_trait]
impl FeatureAssembler for NoopFeatureAssembler {
    fn name(&self) -> &'static str {
        "noop"
    }

    async fn assemble(
        &self,
        _: &FeatureSpec,
        _: &Asset,
        _: &CancellationToken,
    ) -> Result<FeatureResult, FeatureError> {
        Err(FeatureError::backend("no feature extractors configured"))
    }

    async fn remove_results(&self, _: &FeatureSpec, _: &Asset) -> Result<(), FeatureError> {
        Ok(())
    }
}
