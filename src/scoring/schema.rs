use std::sync::LazyLock;

use chrono::Datelike;
use regex::Regex;
use serde_json::Value;

use super::dates::{normalize_date, normalize_time, year_of_month};
use super::loader::{JsonObject, decode_document, json_kind};
use crate::model::ValidationResult;

pub const REQUIRED_TOP_LEVEL_KEYS: [&str; 6] = [
    "artist_name",
    "instagram_handle",
    "tour_name",
    "contact_info",
    "source_month",
    "events",
];
const OPTIONAL_TOP_LEVEL_KEYS: [&str; 1] = ["poster_confidence"];
pub const REQUIRED_EVENT_KEYS: [&str; 4] = ["date", "venue", "city", "province"];
const OPTIONAL_EVENT_KEYS: [&str; 6] = [
    "time",
    "country",
    "event_name",
    "ticket_info",
    "status",
    "confidence",
];
const NULLABLE_EVENT_TEXT_KEYS: [&str; 6] = [
    "venue",
    "city",
    "province",
    "country",
    "event_name",
    "ticket_info",
];
const EVENT_STATUSES: [&str; 3] = ["active", "cancelled", "postponed"];
const PLAUSIBLE_YEARS: std::ops::RangeInclusive<i32> = 2000..=2100;

static SOURCE_MONTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}$").expect("valid source month regex"));

pub fn validate_raw(raw: &str) -> ValidationResult {
    match decode_document(raw) {
        Ok(object) => validate_document(&object),
        Err(failure) => failure,
    }
}

pub fn validate_document(object: &JsonObject) -> ValidationResult {
    let mut errors = Vec::<String>::new();

    let shape_ok = check_top_level_shape(object, &mut errors);
    let content_ok = check_content(object, &mut errors);
    let keys_ok = check_declared_keys(object, &mut errors);

    let schema_ok = shape_ok;
    let schema_valid = schema_ok && content_ok;
    let schema_strict = schema_valid && keys_ok;

    ValidationResult {
        parsed: true,
        schema_ok,
        schema_valid,
        schema_strict,
        errors,
    }
}

fn check_top_level_shape(object: &JsonObject, errors: &mut Vec<String>) -> bool {
    let mut ok = true;

    for key in REQUIRED_TOP_LEVEL_KEYS {
        if !object.contains_key(key) {
            errors.push(format!("{key}: missing required key"));
            ok = false;
        }
    }

    for key in ["artist_name", "source_month"] {
        if let Some(value) = object.get(key).filter(|value| !value.is_string()) {
            errors.push(format!("{key}: expected string, got {}", json_kind(value)));
            ok = false;
        }
    }

    for key in ["instagram_handle", "tour_name", "contact_info"] {
        if let Some(value) = object
            .get(key)
            .filter(|value| !(value.is_string() || value.is_null()))
        {
            errors.push(format!(
                "{key}: expected string or null, got {}",
                json_kind(value)
            ));
            ok = false;
        }
    }

    match object.get("events") {
        Some(Value::Array(items)) => {
            for (index, item) in items.iter().enumerate() {
                if !item.is_object() {
                    errors.push(format!(
                        "events[{index}]: expected object, got {}",
                        json_kind(item)
                    ));
                    ok = false;
                }
            }
        }
        Some(other) => {
            errors.push(format!("events: expected array, got {}", json_kind(other)));
            ok = false;
        }
        None => {}
    }

    ok
}

fn check_content(object: &JsonObject, errors: &mut Vec<String>) -> bool {
    let mut ok = true;

    let source_month = object.get("source_month").and_then(Value::as_str);
    if let Some(month) = source_month.filter(|month| !SOURCE_MONTH.is_match(month)) {
        errors.push(format!("source_month: expected YYYY-MM, got {month:?}"));
        ok = false;
    }

    if object
        .get("poster_confidence")
        .is_some_and(|value| !is_unit_interval_or_null(value))
    {
        errors.push("poster_confidence: expected number in [0, 1] or null".to_string());
        ok = false;
    }

    let default_year = source_month.and_then(year_of_month);
    if let Some(Value::Array(items)) = object.get("events") {
        for (index, item) in items.iter().enumerate() {
            if let Some(event) = item.as_object() {
                ok &= check_event(index, event, default_year, errors);
            }
        }
    }

    ok
}

fn check_event(
    index: usize,
    event: &JsonObject,
    default_year: Option<i32>,
    errors: &mut Vec<String>,
) -> bool {
    let mut ok = true;

    for key in REQUIRED_EVENT_KEYS {
        if !event.contains_key(key) {
            errors.push(format!("events[{index}].{key}: missing required key"));
            ok = false;
        }
    }

    match event.get("date") {
        Some(Value::String(raw)) => match normalize_date(raw, default_year) {
            Some(date) if PLAUSIBLE_YEARS.contains(&date.year()) => {}
            Some(date) => {
                errors.push(format!(
                    "events[{index}].date: implausible year {}",
                    date.year()
                ));
                ok = false;
            }
            None => {
                errors.push(format!("events[{index}].date: unparseable date {raw:?}"));
                ok = false;
            }
        },
        Some(other) => {
            errors.push(format!(
                "events[{index}].date: expected string, got {}",
                json_kind(other)
            ));
            ok = false;
        }
        None => {}
    }

    for key in NULLABLE_EVENT_TEXT_KEYS {
        if let Some(value) = event
            .get(key)
            .filter(|value| !(value.is_string() || value.is_null()))
        {
            errors.push(format!(
                "events[{index}].{key}: expected string or null, got {}",
                json_kind(value)
            ));
            ok = false;
        }
    }

    match event.get("time") {
        None | Some(Value::Null) => {}
        Some(Value::String(raw)) if normalize_time(raw).is_some() => {}
        Some(other) => {
            errors.push(format!("events[{index}].time: expected HH:MM, got {other}"));
            ok = false;
        }
    }

    match event.get("status") {
        None | Some(Value::Null) => {}
        Some(Value::String(status)) if EVENT_STATUSES.contains(&status.as_str()) => {}
        Some(other) => {
            errors.push(format!(
                "events[{index}].status: expected one of {}, got {other}",
                EVENT_STATUSES.join("/")
            ));
            ok = false;
        }
    }

    if event
        .get("confidence")
        .is_some_and(|value| !is_unit_interval_or_null(value))
    {
        errors.push(format!(
            "events[{index}].confidence: expected number in [0, 1] or null"
        ));
        ok = false;
    }

    ok
}

fn check_declared_keys(object: &JsonObject, errors: &mut Vec<String>) -> bool {
    let mut ok = true;

    for key in object.keys() {
        let declared = REQUIRED_TOP_LEVEL_KEYS.contains(&key.as_str())
            || OPTIONAL_TOP_LEVEL_KEYS.contains(&key.as_str());
        if !declared {
            errors.push(format!("{key}: undeclared key"));
            ok = false;
        }
    }

    if let Some(Value::Array(items)) = object.get("events") {
        for (index, item) in items.iter().enumerate() {
            let Some(event) = item.as_object() else {
                continue;
            };
            for key in event.keys() {
                let declared = REQUIRED_EVENT_KEYS.contains(&key.as_str())
                    || OPTIONAL_EVENT_KEYS.contains(&key.as_str());
                if !declared {
                    errors.push(format!("events[{index}].{key}: undeclared key"));
                    ok = false;
                }
            }
        }
    }

    ok
}

fn is_unit_interval_or_null(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Number(number) => number
            .as_f64()
            .map(|score| (0.0..=1.0).contains(&score))
            .unwrap_or(false),
        _ => false,
    }
}
