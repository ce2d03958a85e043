use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;

const BUDDHIST_ERA_OFFSET: i32 = 543;
const BUDDHIST_ERA_THRESHOLD: i32 = 2400;

const ENGLISH_MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

const THAI_MONTHS: [&str; 12] = [
    "มกราคม",
    "กุมภาพันธ์",
    "มีนาคม",
    "เมษายน",
    "พฤษภาคม",
    "มิถุนายน",
    "กรกฎาคม",
    "สิงหาคม",
    "กันยายน",
    "ตุลาคม",
    "พฤศจิกายน",
    "ธันวาคม",
];

const THAI_MONTH_ABBREVIATIONS: [&str; 12] = [
    "ม.ค.", "ก.พ.", "มี.ค.", "เม.ย.", "พ.ค.", "มิ.ย.", "ก.ค.", "ส.ค.", "ก.ย.", "ต.ค.", "พ.ย.",
    "ธ.ค.",
];

static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{4})[-/.]([0-9]{1,2})[-/.]([0-9]{1,2})$").expect("valid iso date regex")
});

static NUMERIC_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{1,2})[-/.]([0-9]{1,2})(?:[-/.]([0-9]{4}|[0-9]{2}))?$")
        .expect("valid numeric date regex")
});

static DAY_FIRST_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?P<day>[0-9]{1,2})(?:st|nd|rd|th)?\s*(?P<month>[^0-9\s,]+?)",
        r"\s*,?\s*(?:พ\.ศ\.\s*)?(?P<year>[0-9]{4}|[0-9]{2})?$",
    ))
    .expect("valid day-first date regex")
});

// The year needs a separator after the day so "jan 2026" is not day 20 of '26.
static MONTH_FIRST_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?P<month>[a-z]+)\.?\s*(?P<day>[0-9]{1,2})(?:st|nd|rd|th)?",
        r"(?:(?:\s*,\s*|\s+)(?P<year>[0-9]{4}|[0-9]{2}))?$",
    ))
    .expect("valid month-first date regex")
});

static WEEKDAY_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?:[a-z]+day|mon|tues?|wed|thu(?:rs?)?|fri|sat|sun)\.?,?\s+",
        r"|^วัน[^0-9\s]*\s*",
    ))
    .expect("valid weekday prefix regex")
});

static CLOCK_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]{1,2})\s*[:.]\s*([0-9]{2})\s*(a\.?m\.?|p\.?m\.?)?")
        .expect("valid clock time regex")
});

static MERIDIEM_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]{1,2})\s*(a\.?m\.?|p\.?m\.?)").expect("valid meridiem time regex")
});

/// Resolves poster date text to a calendar date. `default_year` fills in
/// forms that carry no year (`05/01`, `5 ม.ค.`).
pub fn normalize_date(raw: &str, default_year: Option<i32>) -> Option<NaiveDate> {
    let lowered = ascii_digits(raw).trim().to_lowercase();
    if lowered.is_empty() {
        return None;
    }
    let text = WEEKDAY_PREFIX.replace(&lowered, "");
    let text = text.trim();

    if let Some(captures) = ISO_DATE.captures(text) {
        let year = expand_year(captures.get(1).map(|m| m.as_str()), false, default_year)?;
        return NaiveDate::from_ymd_opt(
            year,
            captures[2].parse().ok()?,
            captures[3].parse().ok()?,
        );
    }

    if let Some(captures) = NUMERIC_DATE.captures(text) {
        let year = expand_year(captures.get(3).map(|m| m.as_str()), false, default_year)?;
        return NaiveDate::from_ymd_opt(
            year,
            captures[2].parse().ok()?,
            captures[1].parse().ok()?,
        );
    }

    let captures = DAY_FIRST_DATE
        .captures(text)
        .or_else(|| MONTH_FIRST_DATE.captures(text))?;
    let (month, thai) = month_from_name(captures.name("month")?.as_str())?;
    let day = captures.name("day")?.as_str().parse().ok()?;
    let year = expand_year(
        captures.name("year").map(|m| m.as_str()),
        thai,
        default_year,
    )?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Resolves poster time text to a wall-clock time. Ranges resolve to their
/// start.
pub fn normalize_time(raw: &str) -> Option<NaiveTime> {
    let text = ascii_digits(raw).trim().to_lowercase();
    if text.is_empty() {
        return None;
    }

    let clock = CLOCK_TIME.captures(&text);
    let meridiem = MERIDIEM_TIME.captures(&text);
    let clock_start = clock.as_ref().and_then(|c| c.get(0)).map(|m| m.start());
    let meridiem_start = meridiem.as_ref().and_then(|c| c.get(0)).map(|m| m.start());

    let (hour, minute, suffix) = match (clock_start, meridiem_start) {
        (Some(clock_at), Some(meridiem_at)) if meridiem_at < clock_at => {
            meridiem_hour(meridiem?)?
        }
        (Some(_), _) => {
            let captures = clock?;
            (
                captures[1].parse::<u32>().ok()?,
                captures[2].parse::<u32>().ok()?,
                captures.get(3).map(|m| m.as_str().to_string()),
            )
        }
        (None, Some(_)) => meridiem_hour(meridiem?)?,
        (None, None) => return None,
    };

    let hour = match suffix.as_deref().map(|value| value.starts_with('p')) {
        Some(true) if hour < 12 => hour + 12,
        Some(false) if hour == 12 => 0,
        _ => hour,
    };
    NaiveTime::from_hms_opt(hour, minute, 0)
}

fn meridiem_hour(captures: regex::Captures<'_>) -> Option<(u32, u32, Option<String>)> {
    let hour = captures[1].parse::<u32>().ok()?;
    Some((hour, 0, captures.get(2).map(|m| m.as_str().to_string())))
}

pub fn year_of_month(source_month: &str) -> Option<i32> {
    let (year, _) = source_month.trim().split_once('-')?;
    if year.len() != 4 {
        return None;
    }
    year.parse().ok()
}

fn expand_year(text: Option<&str>, buddhist_hint: bool, default_year: Option<i32>) -> Option<i32> {
    let Some(text) = text else {
        return default_year;
    };
    let value = text.parse::<i32>().ok()?;
    let year = if text.len() == 2 {
        if buddhist_hint {
            2500 + value - BUDDHIST_ERA_OFFSET
        } else {
            2000 + value
        }
    } else if value >= BUDDHIST_ERA_THRESHOLD {
        value - BUDDHIST_ERA_OFFSET
    } else {
        value
    };
    Some(year)
}

fn month_from_name(name: &str) -> Option<(u32, bool)> {
    let trimmed = name.trim();
    let bare = trimmed.trim_end_matches('.');

    if bare.len() >= 3 && bare.chars().all(|character| character.is_ascii_alphabetic()) {
        return ENGLISH_MONTHS
            .iter()
            .position(|month| month.starts_with(bare))
            .map(|index| (index as u32 + 1, false));
    }

    if let Some(index) = THAI_MONTHS.iter().position(|month| *month == trimmed) {
        return Some((index as u32 + 1, true));
    }

    let undotted = trimmed.replace('.', "");
    THAI_MONTH_ABBREVIATIONS
        .iter()
        .position(|month| month.replace('.', "") == undotted)
        .map(|index| (index as u32 + 1, true))
}

fn ascii_digits(raw: &str) -> String {
    raw.chars()
        .map(|character| match character {
            '\u{0E50}'..='\u{0E59}' => {
                char::from_digit(character as u32 - 0x0E50, 10).unwrap_or(character)
            }
            _ => character,
        })
        .collect()
}
