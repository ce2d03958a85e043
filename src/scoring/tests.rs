use chrono::{NaiveDate, NaiveTime};
use serde_json::{Value, json};

use super::PredictionStatus;
use super::composite::{
    app_score, date_f1, event_count_score, missing_field_rate, score_poster, score_poster_bytes,
    structured_score, top_level_score,
};
use super::dates::{normalize_date, normalize_time};
use super::loader::load_record;
use super::matcher::{match_events, solve_assignment};
use super::schema::validate_raw;
use super::similarity::{handle_similarity, normalize_text, string_similarity};
use crate::config::{EventFieldWeights, ScoringConfig};
use crate::model::{ExtractionRecord, ValidationResult};

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("valid test time")
}

fn full_event(date: &str, venue: &str, city: &str, province: &str) -> Value {
    json!({
        "date": date,
        "time": "19:30",
        "venue": venue,
        "city": city,
        "province": province,
        "country": "Thailand",
        "event_name": null,
        "ticket_info": null,
        "status": "active",
        "confidence": 0.8
    })
}

fn document(events: Value) -> Value {
    json!({
        "artist_name": "Polycat",
        "instagram_handle": "@polycat",
        "tour_name": "Polycat Tour 2026",
        "contact_info": "tickets@polycat.example",
        "source_month": "2026-01",
        "poster_confidence": 0.9,
        "events": events
    })
}

fn record(value: &Value) -> ExtractionRecord {
    load_record("poster-1", &value.to_string()).expect("test document should decode")
}

fn three_events() -> Value {
    json!([
        full_event("2026-01-05", "Warehouse 30", "Bangkok", "Bangkok"),
        full_event("2026-01-17", "Lanna Hall", "Mueang Chiang Mai", "Chiang Mai"),
        full_event("2026-02-01", "RCA Plaza", "Bangkok", "Bangkok"),
    ])
}

#[test]
fn normalize_date_accepts_iso_and_numeric_forms() {
    assert_eq!(normalize_date("2026-01-05", None), Some(ymd(2026, 1, 5)));
    assert_eq!(normalize_date("05/01/2026", None), Some(ymd(2026, 1, 5)));
    assert_eq!(normalize_date("5.1.26", None), Some(ymd(2026, 1, 5)));
    assert_eq!(normalize_date("05/01", Some(2026)), Some(ymd(2026, 1, 5)));
    assert_eq!(normalize_date("05/01", None), None);
}

#[test]
fn normalize_date_accepts_month_names() {
    assert_eq!(normalize_date("Jan 5, 2026", None), Some(ymd(2026, 1, 5)));
    assert_eq!(normalize_date("5th January 2026", None), Some(ymd(2026, 1, 5)));
    assert_eq!(normalize_date("Saturday 5 Jan", Some(2026)), Some(ymd(2026, 1, 5)));
    assert_eq!(normalize_date("14 Sept 2026", None), Some(ymd(2026, 9, 14)));
}

#[test]
fn normalize_date_accepts_thai_months_digits_and_buddhist_years() {
    assert_eq!(normalize_date("5 มกราคม 2569", None), Some(ymd(2026, 1, 5)));
    assert_eq!(normalize_date("๕ ม.ค. ๖๙", None), Some(ymd(2026, 1, 5)));
    assert_eq!(normalize_date("17 ก.พ.", Some(2026)), Some(ymd(2026, 2, 17)));
    assert_eq!(normalize_date("วันเสาร์ที่ 7 มีนาคม 2569", None), Some(ymd(2026, 3, 7)));
    assert_eq!(normalize_date("2569-01-05", None), Some(ymd(2026, 1, 5)));
}

#[test]
fn normalize_date_rejects_impossible_or_free_text() {
    assert_eq!(normalize_date("31/02/2026", None), None);
    assert_eq!(normalize_date("sometime soon", Some(2026)), None);
    assert_eq!(normalize_date("", Some(2026)), None);
}

#[test]
fn month_and_year_without_a_day_is_not_a_date() {
    assert_eq!(normalize_date("Jan 2026", None), None);
    assert_eq!(normalize_date("January 2026", None), None);
    assert_eq!(normalize_date("Jan 20, 2026", None), Some(ymd(2026, 1, 20)));
    assert_eq!(normalize_date("Jan 20 26", None), Some(ymd(2026, 1, 20)));

    let mut month_only = document(three_events());
    month_only["events"][0]["date"] = json!("Jan 2026");
    let result = validate_raw(&month_only.to_string());
    assert!(result.schema_ok);
    assert!(!result.schema_valid);
}

#[test]
fn numeric_fields_accept_only_ascii_and_thai_digits() {
    assert_eq!(normalize_date("٢٠٢٦-٠١-٠٥", None), None);
    assert_eq!(normalize_date("٥ Jan 2026", None), None);
    assert_eq!(normalize_time("١٩:٣٠"), None);
    assert_eq!(normalize_time("١٩:٣٠ / 20:00"), Some(hm(20, 0)));

    let mut arabic_month = document(three_events());
    arabic_month["source_month"] = json!("٢٠٢٦-٠١");
    let result = validate_raw(&arabic_month.to_string());
    assert!(result.schema_ok);
    assert!(!result.schema_valid);
    assert!(
        result
            .errors
            .iter()
            .any(|error| error.starts_with("source_month: expected YYYY-MM")),
        "unexpected errors: {:?}",
        result.errors
    );
}

#[test]
fn normalize_time_handles_common_poster_forms() {
    assert_eq!(normalize_time("19:30"), Some(hm(19, 30)));
    assert_eq!(normalize_time("19.30"), Some(hm(19, 30)));
    assert_eq!(normalize_time("7:30 PM"), Some(hm(19, 30)));
    assert_eq!(normalize_time("8pm"), Some(hm(20, 0)));
    assert_eq!(normalize_time("12am"), Some(hm(0, 0)));
    assert_eq!(normalize_time("19.00-22.00"), Some(hm(19, 0)));
    assert_eq!(normalize_time("๑๙:๓๐ น."), Some(hm(19, 30)));
    assert_eq!(normalize_time("TBA"), None);
}

#[test]
fn text_normalization_folds_case_whitespace_and_latin_accents() {
    assert_eq!(normalize_text("  Café   DEL Mar "), "cafe del mar");
    assert_eq!(normalize_text("เชียงใหม่"), "เชียงใหม่");
}

#[test]
fn string_similarity_treats_absence_and_blank_alike() {
    assert_eq!(string_similarity(None, Some("  ")), 1.0);
    assert_eq!(string_similarity(Some("RCA"), None), 0.0);
    assert_eq!(string_similarity(Some("Warehouse 30"), Some("warehouse  30")), 1.0);

    let partial = string_similarity(Some("kitten"), Some("sitting"));
    assert!((partial - (1.0 - 3.0 / 7.0)).abs() < 1e-12);
}

#[test]
fn handle_similarity_ignores_at_sign_and_case() {
    assert_eq!(handle_similarity(Some("@Polycat"), Some("polycat")), 1.0);
    assert_eq!(handle_similarity(Some("@polycat"), Some("polycat_official")), 0.0);
}

#[test]
fn unparseable_prediction_short_circuits_validation() {
    let result = validate_raw("not json");
    assert!(!result.parsed);
    assert!(!result.schema_ok);
    assert!(!result.schema_valid);
    assert!(!result.schema_strict);
    assert!(!result.errors.is_empty());

    let string_document = validate_raw("\"not json\"");
    assert!(!string_document.parsed);
}

#[test]
fn conforming_document_is_strict() {
    let result = validate_raw(&document(three_events()).to_string());
    assert_eq!(
        result,
        ValidationResult {
            parsed: true,
            schema_ok: true,
            schema_valid: true,
            schema_strict: true,
            errors: Vec::new(),
        }
    );
}

#[test]
fn undeclared_keys_only_break_strictness() {
    let mut top_level_extra = document(three_events());
    top_level_extra["notes"] = json!("scraped from story");
    let result = validate_raw(&top_level_extra.to_string());
    assert!(result.schema_valid);
    assert!(!result.schema_strict);

    let mut event_extra = document(three_events());
    event_extra["events"][1]["price"] = json!(1200);
    let result = validate_raw(&event_extra.to_string());
    assert!(result.schema_valid);
    assert!(!result.schema_strict);
    assert!(
        result.errors.iter().any(|error| error == "events[1].price: undeclared key"),
        "unexpected errors: {:?}",
        result.errors
    );
}

#[test]
fn missing_top_level_key_fails_schema_ok() {
    let mut value = document(three_events());
    value
        .as_object_mut()
        .expect("document is an object")
        .remove("events");
    let result = validate_raw(&value.to_string());
    assert!(result.parsed);
    assert!(!result.schema_ok);
    assert!(!result.schema_valid);
}

#[test]
fn event_content_problems_fail_schema_valid() {
    let mut bad_date = document(three_events());
    bad_date["events"][0]["date"] = json!("someday");
    let result = validate_raw(&bad_date.to_string());
    assert!(result.schema_ok);
    assert!(!result.schema_valid);

    let mut bad_status = document(three_events());
    bad_status["events"][2]["status"] = json!("sold out");
    assert!(!validate_raw(&bad_status.to_string()).schema_valid);

    let mut missing_city = document(three_events());
    missing_city["events"][0]
        .as_object_mut()
        .expect("event is an object")
        .remove("city");
    assert!(!validate_raw(&missing_city.to_string()).schema_valid);

    let mut bad_month = document(three_events());
    bad_month["source_month"] = json!("January 2026");
    assert!(!validate_raw(&bad_month.to_string()).schema_valid);
}

#[test]
fn loader_keeps_raw_date_when_it_cannot_normalize() {
    let mut value = document(three_events());
    value["events"][0]["date"] = json!("ทุกวันศุกร์");
    value["events"][1]["venue"] = json!("");
    let loaded = record(&value);

    let first = loaded.events[0].date.as_ref().expect("date kept");
    assert_eq!(first.raw, "ทุกวันศุกร์");
    assert_eq!(first.canonical, None);
    assert_eq!(loaded.events[1].venue.as_deref(), Some(""));
    assert_eq!(loaded.events[1].event_name, None);
}

#[test]
fn loader_uses_source_month_year_for_yearless_dates() {
    let value = json!({
        "artist_name": "Polycat",
        "source_month": "2026-03",
        "events": [
            { "date": "14/03", "venue": "Lido", "city": "Bangkok", "province": "Bangkok" },
            "junk"
        ]
    });
    let loaded = record(&value);
    assert_eq!(loaded.events.len(), 1);
    assert_eq!(
        loaded.events[0].date.as_ref().and_then(|date| date.canonical),
        Some(ymd(2026, 3, 14))
    );
}

#[test]
fn single_matching_prediction_against_two_gold_events_scores_half() {
    let gold = record(&json!({
        "events": [
            { "date": "2026-01-05", "venue": "Warehouse 30" },
            { "date": "2026-02-01", "venue": "RCA" }
        ]
    }));
    let predicted = record(&json!({
        "events": [{ "date": "2026-01-05", "venue": "Warehouse 30" }]
    }));

    let assignment = match_events(
        &gold.events,
        &predicted.events,
        &EventFieldWeights::full(),
    );
    assert_eq!(assignment.event_match_score, 0.5);
    assert_eq!(assignment.pairs.len(), 1);
    assert_eq!(assignment.pairs[0].gold_index, 0);
    assert_eq!(assignment.pairs[0].pair_score, 1.0);
    assert_eq!(assignment.missing_gold, vec![1]);
    assert!(assignment.extra_predicted.is_empty());
    assert_eq!(event_count_score(gold.events.len(), predicted.events.len()), 0.5);
}

#[test]
fn exact_prediction_matches_perfectly() {
    let gold = record(&document(three_events()));
    let predicted = record(&document(three_events()));

    let assignment = match_events(&gold.events, &predicted.events, &EventFieldWeights::full());
    assert_eq!(assignment.event_match_score, 1.0);
    assert!(assignment.pairs.iter().all(|pair| pair.pair_score == 1.0));
    assert_eq!(missing_field_rate(&assignment, &predicted.events), 0.0);
}

#[test]
fn matching_is_invariant_to_event_order() {
    let gold = record(&document(three_events()));
    let mut reversed = three_events()
        .as_array()
        .expect("events array")
        .clone();
    reversed.reverse();
    reversed[0]["venue"] = json!("RCA Plaza Bkk");
    let predicted = record(&document(Value::Array(reversed)));

    let forward = match_events(&gold.events, &predicted.events, &EventFieldWeights::full());
    let backward = match_events(&predicted.events, &gold.events, &EventFieldWeights::full());

    for pair in &forward.pairs {
        assert_eq!(pair.predicted_index, 2 - pair.gold_index);
    }
    assert!((forward.event_match_score - backward.event_match_score).abs() < 1e-12);
    assert!(forward.event_match_score < 1.0);
}

#[test]
fn assignment_beats_greedy_pairing() {
    // Greedy takes (0, 0) first and is left with the 1.0-cost pair.
    let cost = vec![vec![0.1, 0.2], vec![0.3, 1.0]];
    assert_eq!(solve_assignment(&cost), vec![1, 0]);
}

#[test]
fn assignment_handles_rectangular_costs() {
    let cost = vec![vec![0.5, 0.1, 0.9], vec![0.2, 0.05, 0.8]];
    assert_eq!(solve_assignment(&cost), vec![1, 0]);
    assert!(solve_assignment(&[]).is_empty());
}

#[test]
fn surplus_gold_events_are_reported_missing() {
    let gold = record(&document(three_events()));
    let only_last = json!([full_event("2026-02-01", "RCA Plaza", "Bangkok", "Bangkok")]);
    let predicted = record(&document(only_last));

    let assignment = match_events(&gold.events, &predicted.events, &EventFieldWeights::full());
    assert_eq!(assignment.pairs.len(), 1);
    assert_eq!(assignment.pairs[0].gold_index, 2);
    assert_eq!(assignment.missing_gold, vec![0, 1]);
    assert!((assignment.event_match_score - 1.0 / 3.0).abs() < 1e-12);
}

#[test]
fn degenerate_event_lists_follow_edge_rules() {
    let empty = record(&document(json!([])));
    let some = record(&document(three_events()));
    let weights = EventFieldWeights::full();

    assert_eq!(match_events(&empty.events, &empty.events, &weights).event_match_score, 1.0);

    let hallucinated = match_events(&empty.events, &some.events, &weights);
    assert_eq!(hallucinated.event_match_score, 0.0);
    assert_eq!(hallucinated.extra_predicted, vec![0, 1, 2]);

    let silent = match_events(&some.events, &empty.events, &weights);
    assert_eq!(silent.event_match_score, 0.0);
    assert_eq!(silent.missing_gold, vec![0, 1, 2]);
}

#[test]
fn core_variant_ignores_non_core_fields() {
    let gold = record(&document(three_events()));
    let mut altered = three_events();
    for event in altered.as_array_mut().expect("events array") {
        event["time"] = json!("21:00");
        event["status"] = json!("postponed");
    }
    let predicted = record(&document(altered));

    let full = match_events(&gold.events, &predicted.events, &EventFieldWeights::full());
    let core = match_events(&gold.events, &predicted.events, &EventFieldWeights::core());
    assert_eq!(core.event_match_score, 1.0);
    assert!((full.event_match_score - 0.9).abs() < 1e-9);
}

#[test]
fn unnormalized_dates_earn_no_date_credit() {
    let gold_event = full_event("2026-01-05", "Lido", "Bangkok", "Bangkok");
    let predicted_event = full_event("early January", "Lido", "Bangkok", "Bangkok");
    let gold = record(&document(json!([gold_event])));
    let predicted = record(&document(json!([predicted_event])));

    let assignment = match_events(&gold.events, &predicted.events, &EventFieldWeights::full());
    assert_eq!(assignment.pairs[0].field_scores.date, 0.0);
    assert!((assignment.event_match_score - 0.7).abs() < 1e-9);
}

#[test]
fn event_count_score_is_symmetric() {
    assert_eq!(event_count_score(5, 3), event_count_score(3, 5));
    assert!((event_count_score(5, 3) - 0.6).abs() < 1e-12);
    assert_eq!(event_count_score(0, 0), 1.0);
    assert_eq!(event_count_score(0, 3), 0.0);
    assert_eq!(event_count_score(4, 4), 1.0);
}

#[test]
fn top_level_score_counts_fields_above_threshold() {
    let gold = record(&document(json!([])));
    let predicted = record(&json!({
        "artist_name": "polycat",
        "instagram_handle": "POLYCAT",
        "tour_name": "Another Show",
        "contact_info": null,
        "source_month": "2026-01",
        "events": []
    }));
    assert!((top_level_score(&gold, &predicted, 0.8) - 0.6).abs() < 1e-12);
}

#[test]
fn structured_score_follows_ladder() {
    let config = ScoringConfig::default();
    let strict = ValidationResult {
        parsed: true,
        schema_ok: true,
        schema_valid: true,
        schema_strict: true,
        errors: Vec::new(),
    };
    let loose = ValidationResult {
        schema_strict: false,
        ..strict.clone()
    };
    let invalid = ValidationResult {
        schema_valid: false,
        ..loose.clone()
    };

    assert_eq!(structured_score(&strict, &config), 1.0);
    assert_eq!(structured_score(&loose, &config), 0.5);
    assert_eq!(structured_score(&invalid, &config), 0.0);
    assert_eq!(structured_score(&ValidationResult::unparsed("x"), &config), 0.0);
}

#[test]
fn missing_field_rate_counts_incomplete_matched_events() {
    let gold = record(&document(json!([
        full_event("2026-01-05", "Lido", "Bangkok", "Bangkok"),
        full_event("2026-01-06", "Lido", "Bangkok", "Bangkok"),
    ])));
    let predicted = record(&document(json!([
        full_event("2026-01-05", "Lido", "Bangkok", "Bangkok"),
        { "date": "2026-01-06", "venue": "Lido", "city": " ", "province": "Bangkok" },
        full_event("2026-03-01", "", "", ""),
    ])));

    let assignment = match_events(&gold.events, &predicted.events, &EventFieldWeights::full());
    assert_eq!(assignment.extra_predicted, vec![2]);
    assert_eq!(missing_field_rate(&assignment, &predicted.events), 0.5);

    let nothing = record(&document(json!([])));
    let unmatched = match_events(&gold.events, &nothing.events, &EventFieldWeights::full());
    assert_eq!(missing_field_rate(&unmatched, &nothing.events), 1.0);
}

#[test]
fn app_score_applies_weights_then_penalty_with_floor() {
    let config = ScoringConfig::default();
    let score = app_score(1.0, 0.5, 0.6, 0.5, 0.5, &config);
    assert!((score - 66.5).abs() < 1e-9, "unexpected score: {score}");
    assert_eq!(app_score(0.0, 0.0, 0.0, 0.0, 1.0, &config), 0.0);
}

#[test]
fn date_f1_compares_canonical_date_multisets() {
    let gold = record(&document(json!([
        full_event("2026-01-05", "A", "B", "C"),
        full_event("2026-01-06", "A", "B", "C"),
    ])));
    let predicted = record(&document(json!([full_event("5/1/2026", "A", "B", "C")])));
    assert!((date_f1(&gold.events, &predicted.events) - 2.0 / 3.0).abs() < 1e-12);
}

#[test]
fn unparseable_prediction_scores_zero_without_panicking() {
    let config = ScoringConfig::default();
    let gold = record(&document(three_events()));
    let scored = score_poster(&gold, Some("not json"), &config);

    assert_eq!(scored.status, PredictionStatus::ParseFailure);
    assert!(!scored.validation.parsed);
    assert!(!scored.validation.schema_strict);
    assert_eq!(scored.breakdown.structured_score, 0.0);
    assert_eq!(scored.breakdown.app_quality_score, 0.0);
    assert_eq!(scored.breakdown.app_core_score, 0.0);
}

#[test]
fn non_utf8_prediction_bytes_are_a_parse_failure() {
    let config = ScoringConfig::default();
    let gold = record(&document(three_events()));
    let scored = score_poster_bytes(&gold, Some([0xff, 0xfe, 0x7b].as_slice()), &config);

    assert_eq!(scored.status, PredictionStatus::ParseFailure);
    assert!(!scored.validation.parsed);
    assert!(scored.validation.errors[0].starts_with("invalid utf-8"));
    assert_eq!(scored.breakdown.app_quality_score, 0.0);
    assert_eq!(scored.breakdown.event_count_diff, 3);

    let raw = document(three_events()).to_string();
    let scored = score_poster_bytes(&gold, Some(raw.as_bytes()), &config);
    assert_eq!(scored.status, PredictionStatus::Scored);
    assert_eq!(scored.breakdown.structured_score, 1.0);
}

#[test]
fn missing_prediction_is_zero_scored_and_flagged() {
    let config = ScoringConfig::default();
    let gold = record(&document(three_events()));
    let scored = score_poster(&gold, None, &config);

    assert_eq!(scored.status, PredictionStatus::Missing);
    assert_eq!(scored.breakdown.event_match_score, 0.0);
    assert_eq!(scored.breakdown.missing_field_rate, 1.0);
    assert_eq!(scored.breakdown.event_count_diff, 3);
}

#[test]
fn perfect_prediction_reaches_full_marks() {
    let config = ScoringConfig::default();
    let gold = record(&document(three_events()));
    let raw = document(three_events()).to_string();
    let scored = score_poster(&gold, Some(&raw), &config);

    assert_eq!(scored.status, PredictionStatus::Scored);
    assert_eq!(scored.breakdown.structured_score, 1.0);
    assert_eq!(scored.breakdown.top_level_score, 1.0);
    assert_eq!(scored.breakdown.event_match_score, 1.0);
    assert_eq!(scored.breakdown.core_event_match_score, 1.0);
    assert_eq!(scored.breakdown.missing_field_rate, 0.0);
    assert_eq!(scored.breakdown.date_f1, 1.0);
    assert!((scored.breakdown.app_quality_score - 100.0).abs() < 1e-9);
    assert!((scored.breakdown.app_core_score - 100.0).abs() < 1e-9);
}

#[test]
fn empty_gold_and_prediction_event_lists_match_fully() {
    let config = ScoringConfig::default();
    let gold = record(&document(json!([])));
    let raw = document(json!([])).to_string();
    let scored = score_poster(&gold, Some(&raw), &config);

    assert_eq!(scored.breakdown.event_match_score, 1.0);
    assert_eq!(scored.breakdown.event_count_score, 1.0);
    assert_eq!(scored.breakdown.missing_field_rate, 0.0);
}
