//! Analysis period resolution and month bucketing.

use crate::error::AnalyticsError;
use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The user-selected analysis window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "7d")]
    Last7Days,
    #[default]
    #[serde(rename = "30d")]
    Last30Days,
    #[serde(rename = "90d")]
    Last90Days,
    #[serde(rename = "1y")]
    LastYear,
    #[serde(rename = "all")]
    All,
}

impl Period {
    /// The token used on the command line and in config files.
    pub fn token(&self) -> &'static str {
        match self {
            Period::Last7Days => "7d",
            Period::Last30Days => "30d",
            Period::Last90Days => "90d",
            Period::LastYear => "1y",
            Period::All => "all",
        }
    }

    /// Human-readable description.
    pub fn describe(&self) -> &'static str {
        match self {
            Period::Last7Days => "Last 7 days",
            Period::Last30Days => "Last 30 days",
            Period::Last90Days => "Last 90 days",
            Period::LastYear => "Last year",
            Period::All => "All time",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

impl FromStr for Period {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "7d" => Ok(Period::Last7Days),
            "30d" => Ok(Period::Last30Days),
            "90d" => Ok(Period::Last90Days),
            "1y" => Ok(Period::LastYear),
            "all" => Ok(Period::All),
            other => Err(AnalyticsError::InvalidPeriod(other.to_string())),
        }
    }
}

/// Half-open time window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Window {
    /// Resolve a period relative to `now`. `all` starts at the Unix epoch.
    pub fn resolve(period: Period, now: NaiveDateTime) -> Self {
        let start = match period {
            Period::Last7Days => now - Duration::days(7),
            Period::Last30Days => months_before(now, 1),
            Period::Last90Days => months_before(now, 3),
            Period::LastYear => months_before(now, 12),
            Period::All => unix_epoch(),
        };

        Self { start, end: now }
    }

    /// Resolve a period, anchoring `all` at the earliest supplied timestamp.
    ///
    /// With no timestamps, `all` falls back to the one-year window.
    pub fn resolve_anchored<I>(period: Period, now: NaiveDateTime, timestamps: I) -> Self
    where
        I: IntoIterator<Item = NaiveDateTime>,
    {
        if period != Period::All {
            return Self::resolve(period, now);
        }

        match timestamps.into_iter().min() {
            Some(earliest) if earliest < now => Self {
                start: earliest,
                end: now,
            },
            _ => Self::resolve(Period::LastYear, now),
        }
    }

    /// Whether `t` lies inside `[start, end)`.
    pub fn contains(&self, t: NaiveDateTime) -> bool {
        self.start <= t && t < self.end
    }

    /// Same window with a later start. Never moves the start backwards.
    pub fn starting_no_earlier_than(&self, start: NaiveDateTime) -> Self {
        Self {
            start: self.start.max(start),
            end: self.end,
        }
    }
}

fn months_before(now: NaiveDateTime, months: u32) -> NaiveDateTime {
    now.checked_sub_months(Months::new(months))
        .unwrap_or_else(unix_epoch)
}

/// `NaiveDateTime::default()` is 1970-01-01 00:00:00.
fn unix_epoch() -> NaiveDateTime {
    NaiveDateTime::default()
}

/// One calendar month used to group records on a time axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeBucket {
    /// Display label, e.g. `Jan 2024`.
    pub label: String,
    /// First instant of the month (inclusive).
    pub start: NaiveDateTime,
    /// First instant of the following month (exclusive).
    pub end: NaiveDateTime,
}

impl TimeBucket {
    fn for_month(start: NaiveDateTime) -> Option<Self> {
        let end = start.checked_add_months(Months::new(1))?;
        Some(Self {
            label: start.format("%b %Y").to_string(),
            start,
            end,
        })
    }

    /// Whether `t` falls inside this month.
    pub fn contains(&self, t: NaiveDateTime) -> bool {
        self.start <= t && t < self.end
    }
}

fn first_of_month(t: NaiveDateTime) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(t.year(), t.month(), 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or(t)
}

/// Build the ordered month buckets covering a window.
///
/// Starts at the first of `start`'s month and keeps adding months until a
/// bucket would begin after `end`, so the month containing `end` is always
/// present.
pub fn month_buckets(window: &Window) -> Vec<TimeBucket> {
    let mut buckets = Vec::new();
    if window.end < window.start {
        return buckets;
    }

    let mut cursor = first_of_month(window.start);
    while cursor <= window.end {
        match TimeBucket::for_month(cursor) {
            Some(bucket) => {
                cursor = bucket.end;
                buckets.push(bucket);
            }
            None => break,
        }
    }

    buckets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_period_tokens() {
        for token in ["7d", "30d", "90d", "1y", "all"] {
            let period: Period = token.parse().unwrap();
            assert_eq!(period.token(), token);
        }
        assert_eq!("1Y".parse::<Period>().unwrap(), Period::LastYear);
        assert!("2w".parse::<Period>().is_err());
    }

    #[test]
    fn test_resolve_windows() {
        let now = at(2024, 3, 31);
        assert_eq!(Window::resolve(Period::Last7Days, now).start, at(2024, 3, 24));
        // Calendar months clamp to the last valid day.
        assert_eq!(Window::resolve(Period::Last30Days, now).start, at(2024, 2, 29));
        assert_eq!(Window::resolve(Period::Last90Days, now).start, at(2023, 12, 31));
        assert_eq!(Window::resolve(Period::LastYear, now).start, at(2023, 3, 31));
        assert_eq!(Window::resolve(Period::All, now).start, at(1970, 1, 1));
        assert_eq!(Window::resolve(Period::All, now).end, now);
    }

    #[test]
    fn test_resolve_anchored_all() {
        let now = at(2024, 3, 1);
        let window =
            Window::resolve_anchored(Period::All, now, vec![at(2023, 6, 5), at(2022, 1, 9)]);
        assert_eq!(window.start, at(2022, 1, 9));

        let empty = Window::resolve_anchored(Period::All, now, Vec::new());
        assert_eq!(empty.start, at(2023, 3, 1));

        let other = Window::resolve_anchored(Period::Last7Days, now, vec![at(2000, 1, 1)]);
        assert_eq!(other.start, at(2024, 2, 23));
    }

    #[test]
    fn test_window_is_half_open() {
        let window = Window {
            start: at(2024, 1, 1),
            end: at(2024, 2, 1),
        };
        assert!(window.contains(at(2024, 1, 1)));
        assert!(window.contains(at(2024, 1, 31)));
        assert!(!window.contains(at(2024, 2, 1)));
        assert!(!window.contains(at(2023, 12, 31)));
    }

    #[test]
    fn test_month_buckets_include_final_partial_month() {
        let window = Window {
            start: at(2024, 1, 15),
            end: at(2024, 3, 1),
        };
        let labels: Vec<_> = month_buckets(&window).into_iter().map(|b| b.label).collect();
        assert_eq!(labels, vec!["Jan 2024", "Feb 2024", "Mar 2024"]);
    }

    #[test]
    fn test_month_buckets_contiguous_for_all_periods() {
        let now = NaiveDate::from_ymd_opt(2024, 5, 17)
            .unwrap()
            .and_hms_opt(13, 45, 0)
            .unwrap();

        for period in [
            Period::Last7Days,
            Period::Last30Days,
            Period::Last90Days,
            Period::LastYear,
        ] {
            let window = Window::resolve(period, now);
            let buckets = month_buckets(&window);

            assert!(!buckets.is_empty());
            assert!(buckets[0].start <= window.start);
            assert!(buckets.last().unwrap().contains(window.end));
            for pair in buckets.windows(2) {
                assert_eq!(pair[0].end, pair[1].start);
                assert_ne!(pair[0].label, pair[1].label);
            }
        }
    }

    #[test]
    fn test_year_window_bucket_count() {
        let window = Window::resolve(Period::LastYear, at(2024, 3, 1));
        // Mar 2023 through Mar 2024 inclusive.
        assert_eq!(month_buckets(&window).len(), 13);
    }

    #[test]
    fn test_starting_no_earlier_than() {
        let window = Window::resolve(Period::LastYear, at(2024, 3, 1));
        assert_eq!(window.starting_no_earlier_than(at(2024, 1, 15)).start, at(2024, 1, 15));
        assert_eq!(window.starting_no_earlier_than(at(2020, 1, 1)).start, at(2023, 3, 1));
    }
}
