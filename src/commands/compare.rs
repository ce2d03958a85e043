use std::collections::{BTreeMap, HashMap};

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::cli::{CompareArgs, CompareMetric};
use crate::commands::resolve_config;
use crate::config::BootstrapConfig;
use crate::scoring::PosterScore;
use crate::stats::{ComparisonResult, compare_models};
use crate::util::{read_json, write_json_pretty};

pub type ModelScores = BTreeMap<String, Vec<PosterScore>>;

pub fn run(args: CompareArgs) -> Result<()> {
    let config = resolve_config(args.config.as_deref(), &args.bootstrap)?;
    let mut scores = read_json::<ModelScores>(&args.scores_path)?;

    if !args.models.is_empty() {
        for model in &args.models {
            if !scores.contains_key(model) {
                bail!("model {model} not found in {}", args.scores_path.display());
            }
        }
        scores.retain(|name, _| args.models.contains(name));
    }
    if scores.len() < 2 {
        bail!("need at least two models to compare, found {}", scores.len());
    }

    let comparisons = compare_all(&scores, &[args.metric], &config.bootstrap)?;
    for comparison in &comparisons {
        info!(
            metric = %comparison.metric,
            model_a = %comparison.model_a,
            model_b = %comparison.model_b,
            mean_diff = comparison.mean_diff,
            p_value = comparison.p_value,
            significant = comparison.significant,
            "paired comparison"
        );
    }

    let out = args.out.unwrap_or_else(|| {
        args.scores_path
            .with_file_name(format!("comparisons_{}.json", args.metric.as_str()))
    });
    write_json_pretty(&out, &comparisons)?;
    info!(path = %out.display(), comparisons = comparisons.len(), "wrote comparisons");

    Ok(())
}

/// Every unordered model pair in name order, for each metric. Posters are
/// paired by id; posters scored for only one model are left out.
pub fn compare_all(
    scores: &ModelScores,
    metrics: &[CompareMetric],
    bootstrap: &BootstrapConfig,
) -> Result<Vec<ComparisonResult>> {
    let names = scores.keys().collect::<Vec<&String>>();
    let mut results = Vec::<ComparisonResult>::new();

    for (index, model_a) in names.iter().enumerate() {
        for model_b in &names[index + 1..] {
            for metric in metrics {
                let (left, right) = paired_values(&scores[*model_a], &scores[*model_b], *metric);
                if left.len() != scores[*model_a].len() || right.len() != scores[*model_b].len() {
                    warn!(
                        model_a = %model_a,
                        model_b = %model_b,
                        shared = left.len(),
                        "models were scored on different posters; comparing the overlap"
                    );
                }

                let comparison = compare_models(
                    metric.as_str(),
                    (model_a.as_str(), left.as_slice()),
                    (model_b.as_str(), right.as_slice()),
                    bootstrap,
                )
                .with_context(|| format!("failed to compare {model_a} with {model_b}"))?;

                match comparison {
                    Some(comparison) => results.push(comparison),
                    None => warn!(
                        model_a = %model_a,
                        model_b = %model_b,
                        metric = metric.as_str(),
                        "no shared posters to compare"
                    ),
                }
            }
        }
    }

    Ok(results)
}

pub fn metric_value(metric: CompareMetric, score: &PosterScore) -> f64 {
    match metric {
        CompareMetric::AppQuality => score.breakdown.app_quality_score,
        CompareMetric::AppCore => score.breakdown.app_core_score,
    }
}

fn paired_values(
    left: &[PosterScore],
    right: &[PosterScore],
    metric: CompareMetric,
) -> (Vec<f64>, Vec<f64>) {
    let right_by_poster = right
        .iter()
        .map(|score| (score.poster_id.as_str(), metric_value(metric, score)))
        .collect::<HashMap<&str, f64>>();

    left.iter()
        .filter_map(|score| {
            right_by_poster
                .get(score.poster_id.as_str())
                .map(|right_value| (metric_value(metric, score), *right_value))
        })
        .unzip()
}
