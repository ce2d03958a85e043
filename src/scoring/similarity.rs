use strsim::normalized_levenshtein;
use unicode_normalization::UnicodeNormalization;

const LATIN_COMBINING_MARKS: std::ops::RangeInclusive<char> = '\u{0300}'..='\u{036F}';

/// Case-folded, whitespace-collapsed text with Latin diacritics removed.
/// Thai vowel and tone marks are kept since they change the word.
pub fn normalize_text(value: &str) -> String {
    let folded = value
        .nfd()
        .filter(|character| !LATIN_COMBINING_MARKS.contains(character))
        .collect::<String>()
        .to_lowercase();
    folded.split_whitespace().collect::<Vec<&str>>().join(" ")
}

pub fn normalize_handle(value: &str) -> String {
    let text = normalize_text(value);
    text.trim_start_matches('@').replace(' ', "")
}

pub fn is_blank(value: Option<&str>) -> bool {
    value.map(|text| text.trim().is_empty()).unwrap_or(true)
}

/// Character-level normalized edit similarity in [0, 1]. Two blank values
/// agree; a blank against a non-blank value scores zero.
pub fn string_similarity(gold: Option<&str>, predicted: Option<&str>) -> f64 {
    let gold_norm = gold.map(normalize_text).unwrap_or_default();
    let predicted_norm = predicted.map(normalize_text).unwrap_or_default();
    match (gold_norm.is_empty(), predicted_norm.is_empty()) {
        (true, true) => 1.0,
        (true, false) | (false, true) => 0.0,
        (false, false) if gold_norm == predicted_norm => 1.0,
        (false, false) => normalized_levenshtein(&gold_norm, &predicted_norm),
    }
}

pub fn exact_similarity(gold: Option<&str>, predicted: Option<&str>) -> f64 {
    let gold_norm = gold.map(normalize_text).unwrap_or_default();
    let predicted_norm = predicted.map(normalize_text).unwrap_or_default();
    match (gold_norm.is_empty(), predicted_norm.is_empty()) {
        (true, true) => 1.0,
        (true, false) | (false, true) => 0.0,
        (false, false) => {
            if gold_norm == predicted_norm {
                1.0
            } else {
                0.0
            }
        }
    }
}

pub fn handle_similarity(gold: Option<&str>, predicted: Option<&str>) -> f64 {
    let gold_norm = gold.map(normalize_handle);
    let predicted_norm = predicted.map(normalize_handle);
    exact_similarity(gold_norm.as_deref(), predicted_norm.as_deref())
}
