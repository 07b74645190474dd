//! Timestamp normalization.
//!
//! Records arrive with dates encoded either as ISO-8601 strings or as
//! positional tuples `[year, month, day, hour?, minute?, second?]`.
//! Everything is funnelled through [`normalize`] so that every chart
//! shares one calendar interpretation.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A date value exactly as it appeared on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    /// ISO-8601 date or date-time string.
    Text(String),
    /// Positional tuple, month 1-based.
    Parts(Vec<i64>),
    /// Anything else (numbers, objects, booleans). Never normalizes.
    Other(serde_json::Value),
}

impl RawTimestamp {
    /// Normalize this value. See [`normalize`].
    pub fn normalize(&self) -> Option<NaiveDateTime> {
        normalize(self)
    }
}

impl From<&str> for RawTimestamp {
    fn from(s: &str) -> Self {
        RawTimestamp::Text(s.to_string())
    }
}

impl From<Vec<i64>> for RawTimestamp {
    fn from(parts: Vec<i64>) -> Self {
        RawTimestamp::Parts(parts)
    }
}

/// Convert a raw timestamp into a comparable instant.
///
/// Returns `None` for anything that does not describe a real calendar
/// instant. Callers treat `None` as "exclude from time-based views".
pub fn normalize(raw: &RawTimestamp) -> Option<NaiveDateTime> {
    match raw {
        RawTimestamp::Text(text) => parse_text(text),
        RawTimestamp::Parts(parts) => from_parts(parts),
        RawTimestamp::Other(_) => None,
    }
}

/// Normalize an optional raw timestamp; missing values are invalid.
pub fn normalize_opt(raw: Option<&RawTimestamp>) -> Option<NaiveDateTime> {
    raw.and_then(normalize)
}

const TEXT_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

fn parse_text(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    // Offset-bearing strings are pinned to UTC wall time.
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }

    for format in TEXT_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn from_parts(parts: &[i64]) -> Option<NaiveDateTime> {
    if parts.len() < 3 {
        return None;
    }

    let component = |idx: usize| -> Option<u32> {
        match parts.get(idx) {
            Some(v) => u32::try_from(*v).ok(),
            None => Some(0),
        }
    };

    let year = i32::try_from(parts[0]).ok()?;
    let month = u32::try_from(parts[1]).ok()?;
    let day = u32::try_from(parts[2]).ok()?;

    NaiveDate::from_ymd_opt(year, month, day)?
        .and_hms_opt(component(3)?, component(4)?, component(5)?)
}
