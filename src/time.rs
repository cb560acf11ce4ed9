use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::error::{TplotError, TplotResult};

// ---------------------------------------------------------------------------
// Time-coordinate conversion
// ---------------------------------------------------------------------------

/// Offset unit of a raw time coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    /// Length of one unit in seconds.
    pub fn seconds(self) -> f64 {
        match self {
            TimeUnit::Seconds => 1.0,
            TimeUnit::Minutes => 60.0,
            TimeUnit::Hours => 3600.0,
            TimeUnit::Days => 86_400.0,
        }
    }

    fn from_word(word: &str) -> Option<Self> {
        match word {
            "s" | "sec" | "secs" | "second" | "seconds" => Some(TimeUnit::Seconds),
            "min" | "mins" | "minute" | "minutes" => Some(TimeUnit::Minutes),
            "h" | "hr" | "hrs" | "hour" | "hours" => Some(TimeUnit::Hours),
            "d" | "day" | "days" => Some(TimeUnit::Days),
            _ => None,
        }
    }
}

/// A parsed `<unit> since <reference>` specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBase {
    pub unit: TimeUnit,
    pub reference: DateTime<Utc>,
}

impl TimeBase {
    /// Map one raw offset to whole seconds since the unix epoch.
    pub fn to_unix(&self, offset: f64) -> i64 {
        (self.reference.timestamp() as f64 + offset * self.unit.seconds()).floor() as i64
    }
}

/// Parse a units string of the form `<unit> since <reference>`, e.g.
/// `"seconds since 2000-01-01 12:00:00"` or `"hours since 2024-01-01"`.
///
/// The reference instant is always read as UTC; there is no timezone or
/// daylight-saving adjustment anywhere in the conversion.
pub fn parse_units(spec: &str) -> TplotResult<TimeBase> {
    let trimmed = spec.trim();
    let lower = trimmed.to_ascii_lowercase();
    let idx = lower
        .find(" since ")
        .ok_or_else(|| TplotError::MalformedTimeSpec(spec.to_string()))?;

    let unit_word = trimmed[..idx].trim().to_ascii_lowercase();
    let unit = TimeUnit::from_word(&unit_word)
        .ok_or_else(|| TplotError::MalformedTimeSpec(spec.to_string()))?;
    let reference = parse_reference(trimmed[idx + " since ".len()..].trim())
        .ok_or_else(|| TplotError::MalformedTimeSpec(spec.to_string()))?;

    Ok(TimeBase { unit, reference })
}

/// Convert raw offsets to whole unix seconds using a units string.
///
/// Pure function: the offsets are neither sorted nor validated, so an
/// already non-decreasing, finite input yields a non-decreasing output.
pub fn to_unix_seconds(offsets: &[f64], spec: &str) -> TplotResult<Vec<i64>> {
    let base = parse_units(spec)?;
    Ok(offsets.iter().map(|&o| base.to_unix(o)).collect())
}

/// Parse a reference instant, trying the formats instrument files actually
/// contain: RFC 3339, `YYYY-MM-DD HH:MM:SS[.fff]` with a space or a `T`,
/// and a bare date. A trailing `Z` or ` UTC` marker is accepted.
fn parse_reference(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    let s = s
        .trim_end_matches(" UTC")
        .trim_end_matches(" utc")
        .trim_end_matches(['Z', 'z'])
        .trim();

    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&ndt));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }

    None
}
