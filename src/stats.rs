use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::BootstrapConfig;

#[derive(Debug, Error, PartialEq)]
pub enum StatsError {
    #[error("paired vectors differ in length: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub low: f64,
    pub high: f64,
}

impl ConfidenceInterval {
    pub fn contains(&self, value: f64) -> bool {
        self.low <= value && value <= self.high
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BootstrapEstimate {
    pub mean: f64,
    pub ci: ConfidenceInterval,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairedDifference {
    pub mean_diff: f64,
    pub ci: ConfidenceInterval,
    pub p_value: f64,
    pub significant: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub metric: String,
    pub model_a: String,
    pub model_b: String,
    pub posters: usize,
    pub mean_diff: f64,
    pub ci_low: f64,
    pub ci_high: f64,
    pub p_value: f64,
    pub significant: bool,
}

pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

pub fn population_std(values: &[f64]) -> f64 {
    let Some(center) = mean(values) else {
        return 0.0;
    };
    if values.len() < 2 {
        return 0.0;
    }
    let variance = values
        .iter()
        .map(|value| (value - center).powi(2))
        .sum::<f64>()
        / values.len() as f64;
    variance.sqrt()
}

/// Percentile bootstrap of the sample mean. The reported mean is the
/// observed one; only the interval comes from the resamples.
pub fn bootstrap_mean<R: Rng>(
    values: &[f64],
    config: &BootstrapConfig,
    rng: &mut R,
) -> Option<BootstrapEstimate> {
    let observed = mean(values)?;
    if config.samples == 0 {
        return None;
    }

    let count = values.len();
    let mut resample_means = Vec::<f64>::with_capacity(config.samples);
    for _ in 0..config.samples {
        let mut total = 0.0_f64;
        for _ in 0..count {
            total += values[rng.random_range(0..count)];
        }
        resample_means.push(total / count as f64);
    }

    Some(BootstrapEstimate {
        mean: observed,
        ci: percentile_interval(resample_means, config.alpha),
    })
}

pub fn bootstrap_mean_seeded(
    values: &[f64],
    config: &BootstrapConfig,
) -> Option<BootstrapEstimate> {
    let mut rng = seeded_rng(config.seed);
    bootstrap_mean(values, config, &mut rng)
}

/// Paired bootstrap of `mean(a) - mean(b)`: each resample draws one set of
/// poster indices and applies it to both vectors.
pub fn paired_bootstrap<R: Rng>(
    left: &[f64],
    right: &[f64],
    config: &BootstrapConfig,
    rng: &mut R,
) -> Result<Option<PairedDifference>, StatsError> {
    if left.len() != right.len() {
        return Err(StatsError::LengthMismatch {
            left: left.len(),
            right: right.len(),
        });
    }
    let (Some(left_mean), Some(right_mean)) = (mean(left), mean(right)) else {
        return Ok(None);
    };
    if config.samples == 0 {
        return Ok(None);
    }

    let count = left.len();
    let mut diffs = Vec::<f64>::with_capacity(config.samples);
    for _ in 0..config.samples {
        let mut left_total = 0.0_f64;
        let mut right_total = 0.0_f64;
        for _ in 0..count {
            let index = rng.random_range(0..count);
            left_total += left[index];
            right_total += right[index];
        }
        diffs.push(left_total / count as f64 - right_total / count as f64);
    }

    let at_or_below = diffs.iter().filter(|diff| **diff <= 0.0).count();
    let at_or_above = diffs.iter().filter(|diff| **diff >= 0.0).count();
    let tail = at_or_below.min(at_or_above) as f64 / config.samples as f64;
    let p_value = (2.0 * tail).clamp(0.0, 1.0);

    let ci = percentile_interval(diffs, config.alpha);
    Ok(Some(PairedDifference {
        mean_diff: left_mean - right_mean,
        ci,
        p_value,
        significant: !ci.contains(0.0),
    }))
}

pub fn compare_models(
    metric: &str,
    model_a: (&str, &[f64]),
    model_b: (&str, &[f64]),
    config: &BootstrapConfig,
) -> Result<Option<ComparisonResult>, StatsError> {
    let mut rng = seeded_rng(config.seed);
    let difference = paired_bootstrap(model_a.1, model_b.1, config, &mut rng)?;

    Ok(difference.map(|difference| ComparisonResult {
        metric: metric.to_string(),
        model_a: model_a.0.to_string(),
        model_b: model_b.0.to_string(),
        posters: model_a.1.len(),
        mean_diff: difference.mean_diff,
        ci_low: difference.ci.low,
        ci_high: difference.ci.high,
        p_value: difference.p_value,
        significant: difference.significant,
    }))
}

fn percentile_interval(mut samples: Vec<f64>, alpha: f64) -> ConfidenceInterval {
    samples.sort_by(|left, right| left.total_cmp(right));
    let last = samples.len().saturating_sub(1);
    let count = samples.len() as f64;

    let low_index = ((alpha / 2.0) * count).floor() as usize;
    let high_index = (((1.0 - alpha / 2.0) * count).floor() as usize).saturating_sub(1);
    let low_index = low_index.min(last);
    let high_index = high_index.clamp(low_index, last);

    ConfidenceInterval {
        low: samples.get(low_index).copied().unwrap_or(f64::NAN),
        high: samples.get(high_index).copied().unwrap_or(f64::NAN),
    }
}
