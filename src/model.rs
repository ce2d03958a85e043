use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::config::ScoringConfig;
use crate::stats::ConfidenceInterval;

pub type PosterId = String;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventDate {
    pub raw: String,
    pub canonical: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventTime {
    pub raw: String,
    pub canonical: Option<NaiveTime>,
}

/// One tour date. `None` means the key was absent or null; `Some("")` means
/// the model emitted an empty string.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct EventRecord {
    pub date: Option<EventDate>,
    pub time: Option<EventTime>,
    pub venue: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub country: Option<String>,
    pub event_name: Option<String>,
    pub ticket_info: Option<String>,
    pub status: Option<String>,
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ExtractionRecord {
    pub poster_id: PosterId,
    pub artist_name: Option<String>,
    pub instagram_handle: Option<String>,
    pub tour_name: Option<String>,
    pub contact_info: Option<String>,
    pub source_month: Option<String>,
    pub poster_confidence: Option<f64>,
    pub events: Vec<EventRecord>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    pub parsed: bool,
    pub schema_ok: bool,
    pub schema_valid: bool,
    pub schema_strict: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn unparsed(error: impl Into<String>) -> Self {
        Self {
            parsed: false,
            schema_ok: false,
            schema_valid: false,
            schema_strict: false,
            errors: vec![error.into()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PosterManifestEntry {
    pub id: PosterId,
    #[serde(default)]
    pub status: Option<String>,
}

impl PosterManifestEntry {
    pub fn is_ok(&self) -> bool {
        self.status.as_deref().map(|status| status == "ok").unwrap_or(true)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictionMeta {
    #[serde(default)]
    pub estimated_cost_usd: Option<f64>,
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreStatistics {
    pub mean: Option<f64>,
    pub ci: Option<ConfidenceInterval>,
    pub std: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub model: String,
    pub posters: usize,
    pub scored: usize,
    pub missing_predictions: usize,
    pub parse_failures: usize,
    pub app_quality: ScoreStatistics,
    pub app_core: ScoreStatistics,
    pub json_parse_rate: Option<f64>,
    pub schema_ok_rate: Option<f64>,
    pub schema_valid_rate: Option<f64>,
    pub schema_strict_rate: Option<f64>,
    pub avg_structured_score: Option<f64>,
    pub avg_top_level_score: Option<f64>,
    pub avg_event_match_score: Option<f64>,
    pub avg_core_event_match_score: Option<f64>,
    pub avg_event_count_score: Option<f64>,
    pub avg_venue_score: Option<f64>,
    pub avg_location_score: Option<f64>,
    pub avg_missing_field_rate: Option<f64>,
    pub avg_event_diff: Option<f64>,
    pub avg_date_f1: Option<f64>,
    pub prediction_cost_usd: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PosterCounts {
    pub posters_manifest_ok: usize,
    pub ground_truth_available: usize,
    pub missing_ground_truth: usize,
    pub invalid_ground_truth: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub manifest_version: u32,
    pub run_id: String,
    pub generated_at: String,
    pub tool_version: String,
    pub ground_truth_dir: String,
    pub predictions_dir: String,
    pub ground_truth_sha256: String,
    pub counts: PosterCounts,
    pub models: Vec<String>,
    pub prediction_seeds: Vec<u64>,
    pub ground_truth_cost_usd: f64,
    pub config: ScoringConfig,
}
