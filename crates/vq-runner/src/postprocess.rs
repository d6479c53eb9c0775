//! Numeric post-processing applied to raw model predictions.

use tracing::debug;
use vq_model::ModelMetadata;
use vq_types::{FeatureResult, TypesError};

use crate::error::{RunnerError, RunnerResult};

pub const MOMENT_FEATURE_TYPE: &str = "Moment_feature";
pub const DIS1ST_ATOM: &str = "dis1st";
/// Feature key of the distorted first-moment series consumed by warping.
pub const DIS1ST_SCORES_KEY: &str = "Moment_feature_dis1st_scores";

const MOTION_CORRECTION_START: f64 = 12.0;
const MOTION_CORRECTION_CAP: f64 = 20.0;
const MOTION_CORRECTION_GAIN: f64 = 0.015;

pub fn clip(value: f64, lower: f64, upper: f64) -> f64 {
    value.max(lower).min(upper)
}

/// Clips `value` into `[lower, upper]` then maps it linearly onto `[0, 1]`.
pub fn rescale(value: f64, lower: f64, upper: f64) -> f64 {
    (clip(value, lower, upper) - lower) / (upper - lower)
}

pub fn check_bounds(key: &str, lower: f64, upper: f64) -> RunnerResult<()> {
    if upper > lower {
        Ok(())
    } else {
        Err(RunnerError::InvalidRescaleBounds {
            key: key.to_string(),
            lower,
            upper,
        })
    }
}

pub fn rescale_scores(
    key: &str,
    values: &[f64],
    lower: f64,
    upper: f64,
) -> RunnerResult<Vec<f64>> {
    check_bounds(key, lower, upper)?;
    Ok(values.iter().map(|&v| rescale(v, lower, upper)).collect())
}

/// Boosts scores of high-motion frames, then clamps to `[0, 100]`.
pub fn legacy_post_correction(motion: f64, score: f64) -> f64 {
    let corrected = if motion > MOTION_CORRECTION_START {
        let m = motion.min(MOTION_CORRECTION_CAP);
        score * (1.0 + MOTION_CORRECTION_GAIN * (m - MOTION_CORRECTION_START))
    } else {
        score
    };
    clip(corrected, 0.0, 100.0)
}

/// Applies the model's `score_clip` bounds when present.
pub fn clip_scores(metadata: &ModelMetadata, scores: Vec<f64>) -> RunnerResult<Vec<f64>> {
    match metadata.score_clip()? {
        Some((lower, upper)) => Ok(scores.into_iter().map(|y| clip(y, lower, upper)).collect()),
        None => Ok(scores),
    }
}

/// Pulls scores of dark frames towards the upper clip bound.
///
/// Needs `score_clip`, `dis1st_thr` and the dis1st feature series; when any is
/// absent the scores are returned unchanged.
pub fn warp_scores(
    metadata: &ModelMetadata,
    features: &FeatureResult,
    scores: Vec<f64>,
) -> RunnerResult<Vec<f64>> {
    let (Some((_, upper)), Some(thr)) = (metadata.score_clip()?, metadata.dis1st_thr()?) else {
        debug!("warp skipped: model lacks score_clip or dis1st_thr");
        return Ok(scores);
    };
    let Some(dis1sts) = features.get(DIS1ST_SCORES_KEY) else {
        debug!("warp skipped: no {DIS1ST_SCORES_KEY} feature");
        return Ok(scores);
    };
    if dis1sts.len() != scores.len() {
        return Err(TypesError::FrameCountMismatch {
            key: DIS1ST_SCORES_KEY.to_string(),
            expected: scores.len(),
            actual: dis1sts.len(),
        }
        .into());
    }
    Ok(scores
        .into_iter()
        .zip(dis1sts)
        .map(|(y, &d)| {
            if d < thr {
                upper - d * (upper - y) / thr
            } else {
                y
            }
        })
        .collect())
}
