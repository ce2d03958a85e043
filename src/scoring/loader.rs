use serde_json::{Map, Value};

use super::dates::{normalize_date, normalize_time, year_of_month};
use crate::model::{EventDate, EventRecord, EventTime, ExtractionRecord, ValidationResult};

pub type JsonObject = Map<String, Value>;

/// Decodes raw prediction text. Anything other than a JSON object is a
/// parse failure.
pub fn decode_document(raw: &str) -> Result<JsonObject, ValidationResult> {
    let value = serde_json::from_str::<Value>(raw)
        .map_err(|err| ValidationResult::unparsed(format!("invalid json: {err}")))?;

    match value {
        Value::Object(object) => Ok(object),
        other => Err(ValidationResult::unparsed(format!(
            "top-level value is {}, expected object",
            json_kind(&other)
        ))),
    }
}

/// Text that is not UTF-8 is a parse failure, same as malformed JSON.
pub fn decode_text(bytes: &[u8]) -> Result<&str, ValidationResult> {
    std::str::from_utf8(bytes)
        .map_err(|err| ValidationResult::unparsed(format!("invalid utf-8: {err}")))
}

pub fn load_record(poster_id: &str, raw: &str) -> Result<ExtractionRecord, ValidationResult> {
    decode_document(raw).map(|object| record_from_object(poster_id, &object))
}

/// Builds a typed record from a decoded document without judging its shape;
/// shape problems are reported by the schema validator.
pub fn record_from_object(poster_id: &str, object: &JsonObject) -> ExtractionRecord {
    let source_month = text_field(object, "source_month");
    let default_year = source_month.as_deref().and_then(year_of_month);

    let events = match object.get("events") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_object)
            .map(|event| event_from_object(event, default_year))
            .collect::<Vec<EventRecord>>(),
        _ => Vec::new(),
    };

    ExtractionRecord {
        poster_id: poster_id.to_string(),
        artist_name: text_field(object, "artist_name"),
        instagram_handle: text_field(object, "instagram_handle"),
        tour_name: text_field(object, "tour_name"),
        contact_info: text_field(object, "contact_info"),
        source_month,
        poster_confidence: object.get("poster_confidence").and_then(Value::as_f64),
        events,
    }
}

fn event_from_object(object: &JsonObject, default_year: Option<i32>) -> EventRecord {
    let date = text_field(object, "date").map(|raw| EventDate {
        canonical: normalize_date(&raw, default_year),
        raw,
    });
    let time = text_field(object, "time").map(|raw| EventTime {
        canonical: normalize_time(&raw),
        raw,
    });

    EventRecord {
        date,
        time,
        venue: text_field(object, "venue"),
        city: text_field(object, "city"),
        province: text_field(object, "province"),
        country: text_field(object, "country"),
        event_name: text_field(object, "event_name"),
        ticket_info: text_field(object, "ticket_info"),
        status: text_field(object, "status"),
        confidence: object.get("confidence").and_then(Value::as_f64),
    }
}

fn text_field(object: &JsonObject, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
