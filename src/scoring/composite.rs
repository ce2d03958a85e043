use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::loader::{decode_document, decode_text, record_from_object};
use super::matcher::{MatchAssignment, match_events};
use super::schema::validate_document;
use super::similarity::{exact_similarity, handle_similarity, is_blank, string_similarity};
use crate::config::ScoringConfig;
use crate::model::{EventRecord, ExtractionRecord, PosterId, ValidationResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionStatus {
    Scored,
    ParseFailure,
    Missing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub structured_score: f64,
    pub top_level_score: f64,
    pub event_match_score: f64,
    pub core_event_match_score: f64,
    pub event_count_score: f64,
    pub missing_field_rate: f64,
    pub app_quality_score: f64,
    pub app_core_score: f64,
    pub venue_score: f64,
    pub location_score: f64,
    pub date_f1: f64,
    pub gold_events: usize,
    pub predicted_events: usize,
    pub matched_events: usize,
    pub event_count_diff: usize,
}

impl ScoreBreakdown {
    fn failed(gold_events: usize) -> Self {
        Self {
            structured_score: 0.0,
            top_level_score: 0.0,
            event_match_score: 0.0,
            core_event_match_score: 0.0,
            event_count_score: 0.0,
            missing_field_rate: if gold_events > 0 { 1.0 } else { 0.0 },
            app_quality_score: 0.0,
            app_core_score: 0.0,
            venue_score: 0.0,
            location_score: 0.0,
            date_f1: 0.0,
            gold_events,
            predicted_events: 0,
            matched_events: 0,
            event_count_diff: gold_events,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosterScore {
    pub poster_id: PosterId,
    pub status: PredictionStatus,
    pub validation: ValidationResult,
    pub breakdown: ScoreBreakdown,
}

/// Scores one model's output for one poster. `prediction` is the raw file
/// text, `None` when the model produced no file.
pub fn score_poster(
    gold: &ExtractionRecord,
    prediction: Option<&str>,
    config: &ScoringConfig,
) -> PosterScore {
    let gold_events = gold.events.len();

    let Some(raw) = prediction else {
        return PosterScore {
            poster_id: gold.poster_id.clone(),
            status: PredictionStatus::Missing,
            validation: ValidationResult::unparsed("prediction missing"),
            breakdown: ScoreBreakdown::failed(gold_events),
        };
    };

    let object = match decode_document(raw) {
        Ok(object) => object,
        Err(validation) => return parse_failure(gold, validation),
    };

    let validation = validate_document(&object);
    let predicted = record_from_object(&gold.poster_id, &object);
    let breakdown = score_record(gold, &predicted, &validation, config);

    PosterScore {
        poster_id: gold.poster_id.clone(),
        status: PredictionStatus::Scored,
        validation,
        breakdown,
    }
}

/// Same as [`score_poster`] for raw file bytes.
pub fn score_poster_bytes(
    gold: &ExtractionRecord,
    prediction: Option<&[u8]>,
    config: &ScoringConfig,
) -> PosterScore {
    match prediction.map(decode_text) {
        None => score_poster(gold, None, config),
        Some(Ok(raw)) => score_poster(gold, Some(raw), config),
        Some(Err(validation)) => parse_failure(gold, validation),
    }
}

fn parse_failure(gold: &ExtractionRecord, validation: ValidationResult) -> PosterScore {
    PosterScore {
        poster_id: gold.poster_id.clone(),
        status: PredictionStatus::ParseFailure,
        validation,
        breakdown: ScoreBreakdown::failed(gold.events.len()),
    }
}

pub fn score_record(
    gold: &ExtractionRecord,
    predicted: &ExtractionRecord,
    validation: &ValidationResult,
    config: &ScoringConfig,
) -> ScoreBreakdown {
    let gold_events = gold.events.len();
    let predicted_events = predicted.events.len();

    let full = match_events(&gold.events, &predicted.events, &config.event_weights);
    let core = match_events(&gold.events, &predicted.events, &config.core_event_weights);

    let structured_score = structured_score(validation, config);
    let top_level_score = top_level_score(gold, predicted, config.top_level_threshold);
    let event_count_score = event_count_score(gold_events, predicted_events);
    let missing_field_rate = missing_field_rate(&full, &predicted.events);

    let app_quality_score = app_score(
        structured_score,
        full.event_match_score,
        top_level_score,
        event_count_score,
        missing_field_rate,
        config,
    );
    let app_core_score = app_score(
        structured_score,
        core.event_match_score,
        top_level_score,
        event_count_score,
        missing_field_rate,
        config,
    );

    ScoreBreakdown {
        structured_score,
        top_level_score,
        event_match_score: full.event_match_score,
        core_event_match_score: core.event_match_score,
        event_count_score,
        missing_field_rate,
        app_quality_score,
        app_core_score,
        venue_score: full.mean_over_gold(|pair| pair.field_scores.venue),
        location_score: full.mean_over_gold(|pair| pair.field_scores.location()),
        date_f1: date_f1(&gold.events, &predicted.events),
        gold_events,
        predicted_events,
        matched_events: full.pairs.len(),
        event_count_diff: gold_events.abs_diff(predicted_events),
    }
}

pub fn structured_score(validation: &ValidationResult, config: &ScoringConfig) -> f64 {
    if validation.schema_strict {
        1.0
    } else if validation.schema_valid {
        config.structured_partial_credit
    } else {
        0.0
    }
}

/// Fraction of the five top-level fields that agree with gold at or above
/// `threshold`.
pub fn top_level_score(
    gold: &ExtractionRecord,
    predicted: &ExtractionRecord,
    threshold: f64,
) -> f64 {
    let similarities = [
        string_similarity(gold.artist_name.as_deref(), predicted.artist_name.as_deref()),
        handle_similarity(
            gold.instagram_handle.as_deref(),
            predicted.instagram_handle.as_deref(),
        ),
        string_similarity(gold.tour_name.as_deref(), predicted.tour_name.as_deref()),
        string_similarity(gold.contact_info.as_deref(), predicted.contact_info.as_deref()),
        exact_similarity(gold.source_month.as_deref(), predicted.source_month.as_deref()),
    ];
    let passed = similarities
        .iter()
        .filter(|similarity| **similarity >= threshold)
        .count();
    passed as f64 / similarities.len() as f64
}

/// Symmetric in the two counts: the gap is taken relative to the larger one.
pub fn event_count_score(gold_events: usize, predicted_events: usize) -> f64 {
    if gold_events == 0 && predicted_events == 0 {
        return 1.0;
    }
    let gap = gold_events.abs_diff(predicted_events) as f64;
    let denominator = gold_events.max(predicted_events).max(1) as f64;
    1.0 - (gap / denominator).min(1.0)
}

pub fn missing_field_rate(assignment: &MatchAssignment, predicted: &[EventRecord]) -> f64 {
    if assignment.gold_count() == 0 {
        return 0.0;
    }
    if assignment.pairs.is_empty() {
        return 1.0;
    }

    let incomplete = assignment
        .pairs
        .iter()
        .filter_map(|pair| predicted.get(pair.predicted_index))
        .filter(|event| lacks_essential_field(event))
        .count();
    incomplete as f64 / assignment.pairs.len() as f64
}

fn lacks_essential_field(event: &EventRecord) -> bool {
    is_blank(event.date.as_ref().map(|date| date.raw.as_str()))
        || is_blank(event.venue.as_deref())
        || is_blank(event.city.as_deref())
        || is_blank(event.province.as_deref())
}

pub fn app_score(
    structured_score: f64,
    event_match_score: f64,
    top_level_score: f64,
    event_count_score: f64,
    missing_field_rate: f64,
    config: &ScoringConfig,
) -> f64 {
    let weights = &config.quality_weights;
    let base = weights.structured * structured_score
        + weights.event_match * event_match_score
        + weights.top_level * top_level_score
        + weights.event_count * event_count_score;
    let penalty = config.missing_field_penalty * missing_field_rate;
    (100.0 * base.clamp(0.0, 1.0) - penalty).max(0.0)
}

/// F1 of the canonical date multisets, ignoring pairing.
pub fn date_f1(gold: &[EventRecord], predicted: &[EventRecord]) -> f64 {
    let gold_dates = canonical_dates(gold);
    let predicted_dates = canonical_dates(predicted);
    let gold_total = gold_dates.values().sum::<usize>();
    let predicted_total = predicted_dates.values().sum::<usize>();

    if gold_total == 0 && predicted_total == 0 {
        return 1.0;
    }
    if gold_total == 0 || predicted_total == 0 {
        return 0.0;
    }

    let overlap = gold_dates
        .iter()
        .map(|(date, count)| (*count).min(predicted_dates.get(date).copied().unwrap_or(0)))
        .sum::<usize>();
    if overlap == 0 {
        return 0.0;
    }

    let precision = overlap as f64 / predicted_total as f64;
    let recall = overlap as f64 / gold_total as f64;
    2.0 * precision * recall / (precision + recall)
}

fn canonical_dates(events: &[EventRecord]) -> HashMap<NaiveDate, usize> {
    let mut counts = HashMap::<NaiveDate, usize>::new();
    for date in events
        .iter()
        .filter_map(|event| event.date.as_ref().and_then(|date| date.canonical))
    {
        *counts.entry(date).or_default() += 1;
    }
    counts
}
