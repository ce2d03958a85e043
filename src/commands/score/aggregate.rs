use super::*;

pub(super) fn summarize_model(
    model: &ModelPredictions,
    scores: &[PosterScore],
    bootstrap: &BootstrapConfig,
) -> RunSummary {
    let quality = scores
        .iter()
        .map(|score| score.breakdown.app_quality_score)
        .collect::<Vec<f64>>();
    let core = scores
        .iter()
        .map(|score| score.breakdown.app_core_score)
        .collect::<Vec<f64>>();

    RunSummary {
        model: model.name.clone(),
        posters: scores.len(),
        scored: count_status(scores, PredictionStatus::Scored),
        missing_predictions: count_status(scores, PredictionStatus::Missing),
        parse_failures: count_status(scores, PredictionStatus::ParseFailure),
        app_quality: score_statistics(&quality, bootstrap),
        app_core: score_statistics(&core, bootstrap),
        json_parse_rate: rate(scores, |score| score.validation.parsed),
        schema_ok_rate: rate(scores, |score| score.validation.schema_ok),
        schema_valid_rate: rate(scores, |score| score.validation.schema_valid),
        schema_strict_rate: rate(scores, |score| score.validation.schema_strict),
        avg_structured_score: average(scores, |breakdown| breakdown.structured_score),
        avg_top_level_score: average(scores, |breakdown| breakdown.top_level_score),
        avg_event_match_score: average(scores, |breakdown| breakdown.event_match_score),
        avg_core_event_match_score: average(scores, |breakdown| {
            breakdown.core_event_match_score
        }),
        avg_event_count_score: average(scores, |breakdown| breakdown.event_count_score),
        avg_venue_score: average(scores, |breakdown| breakdown.venue_score),
        avg_location_score: average(scores, |breakdown| breakdown.location_score),
        avg_missing_field_rate: average(scores, |breakdown| breakdown.missing_field_rate),
        avg_event_diff: average(scores, |breakdown| breakdown.event_count_diff as f64),
        avg_date_f1: average(scores, |breakdown| breakdown.date_f1),
        prediction_cost_usd: model.cost_usd,
    }
}

fn score_statistics(values: &[f64], bootstrap: &BootstrapConfig) -> ScoreStatistics {
    let estimate = bootstrap_mean_seeded(values, bootstrap);
    ScoreStatistics {
        mean: estimate.map(|estimate| estimate.mean),
        ci: estimate.map(|estimate| estimate.ci),
        std: population_std(values),
    }
}

fn count_status(scores: &[PosterScore], status: PredictionStatus) -> usize {
    scores.iter().filter(|score| score.status == status).count()
}

fn rate(scores: &[PosterScore], predicate: impl Fn(&PosterScore) -> bool) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    let hits = scores.iter().filter(|score| predicate(score)).count();
    Some(hits as f64 / scores.len() as f64)
}

fn average(scores: &[PosterScore], metric: impl Fn(&ScoreBreakdown) -> f64) -> Option<f64> {
    let values = scores
        .iter()
        .map(|score| metric(&score.breakdown))
        .collect::<Vec<f64>>();
    mean(&values)
}
