use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_BOOTSTRAP_SAMPLES: usize = 1000;
pub const DEFAULT_BOOTSTRAP_SEED: u64 = 23;
pub const DEFAULT_BOOTSTRAP_ALPHA: f64 = 0.05;
pub const DEFAULT_TOP_LEVEL_THRESHOLD: f64 = 0.8;
pub const DEFAULT_STRUCTURED_PARTIAL_CREDIT: f64 = 0.5;
pub const DEFAULT_MISSING_FIELD_PENALTY: f64 = 10.0;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{table}.{field} must be a finite non-negative number, got {value}")]
    InvalidWeight {
        table: &'static str,
        field: &'static str,
        value: f64,
    },
    #[error("{table} weights must sum to 1.0, got {sum}")]
    WeightSum { table: &'static str, sum: f64 },
    #[error("bootstrap alpha must lie strictly between 0 and 1, got {0}")]
    Alpha(f64),
    #[error("bootstrap sample count must be positive")]
    Samples,
    #[error("top-level similarity threshold must lie in [0, 1], got {0}")]
    Threshold(f64),
    #[error("structured partial credit must lie in [0, 1], got {0}")]
    PartialCredit(f64),
    #[error("missing-field penalty must be a finite non-negative number, got {0}")]
    Penalty(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventFieldWeights {
    pub date: f64,
    pub time: f64,
    pub venue: f64,
    pub city: f64,
    pub province: f64,
    pub country: f64,
    pub event_name: f64,
    pub ticket_info: f64,
    pub status: f64,
}

impl EventFieldWeights {
    pub fn full() -> Self {
        Self {
            date: 0.3,
            time: 0.05,
            venue: 0.2,
            city: 0.15,
            province: 0.1,
            country: 0.05,
            event_name: 0.05,
            ticket_info: 0.05,
            status: 0.05,
        }
    }

    /// Restricted to date, venue, city, province and country.
    pub fn core() -> Self {
        Self {
            date: 0.375,
            time: 0.0,
            venue: 0.25,
            city: 0.1875,
            province: 0.125,
            country: 0.0625,
            event_name: 0.0,
            ticket_info: 0.0,
            status: 0.0,
        }
    }

    fn entries(&self) -> [(&'static str, f64); 9] {
        [
            ("date", self.date),
            ("time", self.time),
            ("venue", self.venue),
            ("city", self.city),
            ("province", self.province),
            ("country", self.country),
            ("event_name", self.event_name),
            ("ticket_info", self.ticket_info),
            ("status", self.status),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityWeights {
    pub structured: f64,
    pub event_match: f64,
    pub top_level: f64,
    pub event_count: f64,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            structured: 0.4,
            event_match: 0.35,
            top_level: 0.15,
            event_count: 0.1,
        }
    }
}

impl QualityWeights {
    fn entries(&self) -> [(&'static str, f64); 4] {
        [
            ("structured", self.structured),
            ("event_match", self.event_match),
            ("top_level", self.top_level),
            ("event_count", self.event_count),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BootstrapConfig {
    pub samples: usize,
    pub seed: u64,
    pub alpha: f64,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            samples: DEFAULT_BOOTSTRAP_SAMPLES,
            seed: DEFAULT_BOOTSTRAP_SEED,
            alpha: DEFAULT_BOOTSTRAP_ALPHA,
        }
    }
}

impl BootstrapConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.samples == 0 {
            return Err(ConfigError::Samples);
        }
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(ConfigError::Alpha(self.alpha));
        }
        Ok(())
    }
}

/// Every tunable that influences a score. One instance is threaded through
/// the whole run and written next to its outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub event_weights: EventFieldWeights,
    pub core_event_weights: EventFieldWeights,
    pub quality_weights: QualityWeights,
    pub top_level_threshold: f64,
    pub structured_partial_credit: f64,
    pub missing_field_penalty: f64,
    pub bootstrap: BootstrapConfig,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            event_weights: EventFieldWeights::full(),
            core_event_weights: EventFieldWeights::core(),
            quality_weights: QualityWeights::default(),
            top_level_threshold: DEFAULT_TOP_LEVEL_THRESHOLD,
            structured_partial_credit: DEFAULT_STRUCTURED_PARTIAL_CREDIT,
            missing_field_penalty: DEFAULT_MISSING_FIELD_PENALTY,
            bootstrap: BootstrapConfig::default(),
        }
    }
}

impl ScoringConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read(path)
            .with_context(|| format!("failed to read scoring config: {}", path.display()))?;
        serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse scoring config: {}", path.display()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_weight_table("event_weights", &self.event_weights.entries())?;
        check_weight_table("core_event_weights", &self.core_event_weights.entries())?;
        check_weight_table("quality_weights", &self.quality_weights.entries())?;

        if !(0.0..=1.0).contains(&self.top_level_threshold) {
            return Err(ConfigError::Threshold(self.top_level_threshold));
        }
        if !(0.0..=1.0).contains(&self.structured_partial_credit) {
            return Err(ConfigError::PartialCredit(self.structured_partial_credit));
        }
        if !self.missing_field_penalty.is_finite() || self.missing_field_penalty < 0.0 {
            return Err(ConfigError::Penalty(self.missing_field_penalty));
        }

        self.bootstrap.validate()
    }
}

fn check_weight_table(
    table: &'static str,
    entries: &[(&'static str, f64)],
) -> Result<(), ConfigError> {
    for (field, value) in entries {
        if !value.is_finite() || *value < 0.0 {
            return Err(ConfigError::InvalidWeight {
                table,
                field,
                value: *value,
            });
        }
    }

    let sum = entries.iter().map(|(_, value)| value).sum::<f64>();
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(ConfigError::WeightSum { table, sum });
    }

    Ok(())
}
