use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Local, NaiveDate, Utc};
use regex::Regex;

static RE_TRAILING_PAREN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*\([^()]*\)\s*$").expect("invalid regex: trailing parenthetical")
});

static RE_ORDINAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)\b").expect("invalid regex: ordinal"));

static RE_ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("invalid regex: iso date"));

static RE_ISO_DATETIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2})[T ]\d{2}:\d{2}").expect("invalid regex: iso datetime")
});

static RE_LEADING_WEEKDAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:mon|tue|tues|wed|thu|thur|thurs|fri|sat|sun)[a-z]*\.?,?\s*")
        .expect("invalid regex: leading weekday")
});

static RE_MONTH_DAY_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z]+)\.?\s+(\d{1,2}),?(?:\s+(\d{4}))?\b").expect("invalid regex: month day")
});

static RE_DAY_MONTH_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})[\s-]+([A-Za-z]+)\.?(?:[\s,-]+(\d{4}))?\b")
        .expect("invalid regex: day month")
});

static RE_CLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d{1,2})(?::(\d{2}))?\s*(AM|PM)?").expect("invalid regex: clock")
});

const MONTHS: [&str; 12] = [
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

/// Full names and any prefix of three letters or more ("Aug", "Sept", "Sept.").
fn parse_month(token: &str) -> Option<u32> {
    let token = token.trim_end_matches('.').to_lowercase();
    if token.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|name| name.starts_with(&token))
        .map(|i| i as u32 + 1)
}

fn strip_annotations(label: &str) -> String {
    let mut cleaned = crate::text::normalize(label);
    while RE_TRAILING_PAREN.is_match(&cleaned) {
        cleaned = RE_TRAILING_PAREN.replace(&cleaned, "").into_owned();
    }
    RE_ORDINAL.replace_all(&cleaned, "$1").into_owned()
}

/// "12-Aug-2025 • Tuesday" keeps whichever bullet segment carries the date.
fn date_segment(cleaned: &str) -> &str {
    cleaned
        .split('•')
        .map(str::trim)
        .find(|segment| segment.chars().any(|c| c.is_ascii_digit()))
        .unwrap_or(cleaned)
}

/// Resolves a schedule date label into `YYYY-MM-DD`.
///
/// Accepts ISO dates (returned unchanged), ISO timestamps, "Tuesday, August 12",
/// "Aug. 12, 2025", "12th August 2025" and "12-Aug-2025 • Tuesday". A label
/// without a year takes `fallback_year`, or the current local year when none is
/// given. Returns `None` for anything that does not name a real calendar day.
pub fn resolve_date(label: &str, fallback_year: Option<i32>) -> Option<String> {
    let cleaned = strip_annotations(label);
    if cleaned.is_empty() {
        return None;
    }
    if RE_ISO_DATE.is_match(&cleaned) {
        return Some(cleaned);
    }
    if let Some(caps) = RE_ISO_DATETIME.captures(&cleaned) {
        return Some(caps[1].to_string());
    }

    let segment = RE_LEADING_WEEKDAY.replace(date_segment(&cleaned), "");

    let (month, day, year) = if let Some(caps) = RE_MONTH_DAY_YEAR.captures(&segment) {
        (
            parse_month(&caps[1])?,
            caps[2].parse::<u32>().ok()?,
            caps.get(3).and_then(|m| m.as_str().parse::<i32>().ok()),
        )
    } else if let Some(caps) = RE_DAY_MONTH_YEAR.captures(&segment) {
        (
            parse_month(&caps[2])?,
            caps[1].parse::<u32>().ok()?,
            caps.get(3).and_then(|m| m.as_str().parse::<i32>().ok()),
        )
    } else {
        log::debug!("Unrecognized date label: {:?}", label);
        return None;
    };

    let year = year
        .or(fallback_year)
        .unwrap_or_else(|| Local::now().year());

    NaiveDate::from_ymd_opt(year, month, day).map(|d| d.format("%Y-%m-%d").to_string())
}

/// Picks the year to assume for a year-less label on an already captured record:
/// the year of its resolved `iso_date`, else the year of the first capture
/// timestamp available.
pub fn infer_fallback_year(iso_date: &str, captured_at: &[Option<DateTime<Utc>>]) -> Option<i32> {
    iso_date
        .get(..4)
        .filter(|_| iso_date.as_bytes().get(4) == Some(&b'-'))
        .and_then(|y| y.parse::<i32>().ok())
        .or_else(|| captured_at.iter().flatten().next().map(|ts| ts.year()))
}

/// Combines a resolved date and a canonical clock string into a local
/// `YYYY-MM-DDTHH:MM:SS` timestamp.
///
/// An empty or unrecognizable time yields midnight. Returns `None` when `date`
/// is not `YYYY-MM-DD`.
pub fn to_iso_timestamp(date: &str, time: &str) -> Option<String> {
    if !RE_ISO_DATE.is_match(date) {
        return None;
    }

    let (hour, minute) = RE_CLOCK
        .captures(time.trim())
        .and_then(|caps| {
            let mut hour: u32 = caps[1].parse().ok()?;
            let minute: u32 = caps.get(2).map_or(Some(0), |m| m.as_str().parse().ok())?;
            match caps.get(3).map(|m| m.as_str().to_uppercase()).as_deref() {
                Some("PM") if hour < 12 => hour += 12,
                Some("AM") if hour == 12 => hour = 0,
                _ => {}
            }
            (hour < 24 && minute < 60).then_some((hour, minute))
        })
        .unwrap_or((0, 0));

    Some(format!("{}T{:02}:{:02}:00", date, hour, minute))
}
