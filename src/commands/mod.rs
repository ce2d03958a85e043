use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::BootstrapOverrides;
use crate::config::ScoringConfig;

pub mod compare;
pub mod score;
pub mod validate;

/// Config file (or defaults) with command-line bootstrap overrides applied,
/// validated before any input is touched.
pub fn resolve_config(
    path: Option<&Path>,
    overrides: &BootstrapOverrides,
) -> Result<ScoringConfig> {
    let mut config = match path {
        Some(path) => ScoringConfig::load(path)?,
        None => ScoringConfig::default(),
    };

    if let Some(samples) = overrides.bootstrap_samples {
        config.bootstrap.samples = samples;
    }
    if let Some(seed) = overrides.seed {
        config.bootstrap.seed = seed;
    }
    if let Some(alpha) = overrides.alpha {
        config.bootstrap.alpha = alpha;
    }

    config.validate().context("invalid scoring config")?;
    Ok(config)
}
