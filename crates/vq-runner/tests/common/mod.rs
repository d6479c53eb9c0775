#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use vq_feature::{FeatureAssembler, FeatureError, FeatureSpec};
use vq_types::{Asset, CancellationToken, FeatureResult, ScoreRecord, YuvType};

/// Assembler returning canned series and remembering what it was asked.
pub struct MockAssembler {
    scores: BTreeMap<String, Vec<f64>>,
    failing_asset_id: Option<u32>,
    pub requested: Mutex<Vec<FeatureSpec>>,
    pub removed: Mutex<Vec<FeatureSpec>>,
}

impl MockAssembler {
    pub fn new(scores: impl IntoIterator<Item = (&'static str, Vec<f64>)>) -> Self {
        Self {
            scores: scores
                .into_iter()
                .map(|(key, values)| (key.to_string(), values))
                .collect(),
            failing_asset_id: None,
            requested: Mutex::new(Vec::new()),
            removed: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_for(mut self, asset_id: u32) -> Self {
        self.failing_asset_id = Some(asset_id);
        self
    }
}

#[async_trait]
impl FeatureAssembler for MockAssembler {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn assemble(
        &self,
        spec: &FeatureSpec,
        asset: &Asset,
        _: &CancellationToken,
    ) -> Result<FeatureResult, FeatureError> {
        self.requested.lock().unwrap().push(spec.clone());
        if self.failing_asset_id == Some(asset.asset_id()) {
            return Err(FeatureError::backend("extractor crashed"));
        }
        Ok(ScoreRecord::new(asset.clone(), "mock_1.0", self.scores.clone())?)
    }

    async fn remove_results(&self, spec: &FeatureSpec, _: &Asset) -> Result<(), FeatureError> {
        self.removed.lock().unwrap().push(spec.clone());
        Ok(())
    }
}

pub fn asset(asset_id: u32) -> Asset {
    Asset::builder("test")
        .asset_id(asset_id)
        .ref_path("/data/ref.yuv")
        .dis_path("/data/dis.yuv")
        .width(176)
        .height(144)
        .yuv_type(YuvType::Yuv420p)
        .build()
        .unwrap()
}

pub fn assert_close(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 1e-9, "{actual:?} != {expected:?}");
    }
}
