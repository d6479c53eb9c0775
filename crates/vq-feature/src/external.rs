use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;
use vq_process::{InvocationOptions, read_score_log, remove_if_exists, run_to_log};
use vq_types::{Asset, CancellationToken, FeatureResult, ScoreRecord};

use crate::assembler::FeatureAssembler;
use crate::error::FeatureError;
use crate::extractor::ExtractorCatalog;
use crate::spec::FeatureSpec;

/// Assembler that drives external extractor programs, one per feature type,
/// and reads their score logs from `workdir`.
#[derive(Debug, Clone)]
pub struct ExternalFeatureAssembler {
    catalog: ExtractorCatalog,
    workdir: PathBuf,
    options: InvocationOptions,
}

impl ExternalFeatureAssembler {
    pub fn new(catalog: ExtractorCatalog, workdir: impl Into<PathBuf>) -> Self {
        Self {
            catalog,
            workdir: workdir.into(),
            options: InvocationOptions::default(),
        }
    }

    pub fn with_options(mut self, options: InvocationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn catalog(&self) -> &ExtractorCatalog {
        &self.catalog
    }
}

#[async_trait]
impl FeatureAssembler for ExternalFeatureAssembler {
    fn name(&self) -> &'static str {
        "external"
    }

    async fn assemble(
        &self,
        spec: &FeatureSpec,
        asset: &Asset,
        cancel: &CancellationToken,
    ) -> Result<FeatureResult, FeatureError> {
        spec.validate()?;
        let mut scores = BTreeMap::new();
        let mut executors = Vec::new();

        for (type_tag, selection) in spec.entries() {
            if cancel.is_cancelled() {
                return Err(FeatureError::Cancelled);
            }
            let definition = self.catalog.get(type_tag)?;
            let atoms = definition.resolve_atoms(selection)?;
            let log_path = definition.log_path(&self.workdir, asset);

            remove_if_exists(&log_path).await?;
            run_to_log(
                &definition.invocation(asset),
                &log_path,
                &self.options,
                cancel,
            )
            .await?;
            let parsed = read_score_log(&log_path, &atoms).await?;
            debug!(
                extractor = %definition.executor_id(),
                asset = %asset,
                atoms = atoms.len(),
                "feature extraction finished"
            );

            for (atom, values) in parsed {
                scores.insert(definition.scores_key(&atom), values);
            }
            executors.push(definition.executor_id().to_string());
        }

        Ok(ScoreRecord::new(asset.clone(), executors.join("+"), scores)?)
    }

    async fn remove_results(
        &self,
        spec: &FeatureSpec,
        asset: &Asset,
    ) -> Result<(), FeatureError> {
        for type_tag in spec.type_tags() {
            let definition = self.catalog.get(type_tag)?;
            let log_path = definition.log_path(&self.workdir, asset);
            if remove_if_exists(&log_path).await? {
                debug!(log = %log_path.display(), "removed feature log");
            }
        }
        Ok(())
    }
}
