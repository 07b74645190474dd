//! Derived metrics.
//!
//! Every function here is pure and total: a zero denominator yields `0`,
//! never NaN, infinity or a panic.

use crate::analysis::aggregator::{CategoryAggregate, Distribution};
use crate::models::Claim;
use serde::Serialize;

/// Replace NaN and infinities with zero.
pub fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    sanitize((value * factor).round() / factor)
}

/// Whole-percent share of `count` in `total`; 0 when `total` is 0.
pub fn percentage_share(count: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    let share = (count as f64 / total as f64 * 100.0).round();
    share.clamp(0.0, 100.0) as u32
}

/// Ratio of two quantities as a whole percentage in `[0, 100]`.
///
/// A zero (or non-positive) denominator yields 0.
pub fn rate(numerator: f64, denominator: f64) -> f64 {
    if denominator.is_nan() || denominator <= 0.0 || !numerator.is_finite() {
        return 0.0;
    }
    round_to(numerator / denominator * 100.0, 0).clamp(0.0, 100.0)
}

/// [`rate`] over record counts.
pub fn count_rate(numerator: u64, denominator: u64) -> f64 {
    rate(numerator as f64, denominator as f64)
}

/// Premium revenue minus paid claims for one bucket.
pub fn net_revenue(premium: f64, paid_claims: f64) -> f64 {
    sanitize(premium - paid_claims)
}

/// Running total across ordered buckets. Never decreases.
pub fn cumulative(counts: &[u64]) -> Vec<u64> {
    counts
        .iter()
        .scan(0u64, |running, &count| {
            *running = running.saturating_add(count);
            Some(*running)
        })
        .collect()
}

/// Mean value, 0 for an empty set. Rounded to cents.
pub fn average(total: f64, count: u64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    round_to(total / count as f64, 2)
}

/// Mean processing time over claims flagged as processed.
///
/// Claims that are unprocessed, or processed without a usable duration,
/// are left out. An empty set yields 0.
pub fn average_processing_days<'a, I>(claims: I) -> f64
where
    I: IntoIterator<Item = &'a Claim>,
{
    let (total, count) = claims
        .into_iter()
        .filter(|c| c.is_processed == Some(true))
        .filter_map(|c| c.processing_days.filter(|d| d.is_finite() && *d >= 0.0))
        .fold((0.0, 0u64), |(total, count), days| (total + days, count + 1));

    round_to(if count == 0 { 0.0 } else { total / count as f64 }, 1)
}

/// Signed percentage change from `previous` to `current`.
///
/// Rounded to one decimal; a zero `previous` yields 0.
pub fn growth_rate(previous: f64, current: f64) -> f64 {
    if previous == 0.0 || !previous.is_finite() || !current.is_finite() {
        return 0.0;
    }
    round_to((current - previous) / previous.abs() * 100.0, 1)
}

/// A category slice ready for a chart legend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Share {
    pub category: String,
    pub count: u64,
    pub amount: f64,
    pub percentage: u32,
    pub color: &'static str,
}

/// Attach percentage shares and colours to a distribution.
pub fn shares(distribution: &Distribution) -> Vec<Share> {
    distribution
        .slices
        .iter()
        .map(|slice| Share {
            category: slice.category.clone(),
            count: slice.count,
            amount: sanitize(slice.amount),
            percentage: percentage_share(slice.count, distribution.total_count),
            color: crate::analysis::classifier::category_color(&slice.category),
        })
        .collect()
}

/// Keep the `n` largest shares, folding the rest into one `Other` share.
pub fn top_shares(all: &[Share], n: usize) -> Vec<Share> {
    let distribution = Distribution {
        slices: all
            .iter()
            .map(|s| CategoryAggregate {
                category: s.category.clone(),
                count: s.count,
                amount: s.amount,
            })
            .collect(),
        total_count: all.iter().map(|s| s.count).sum(),
        total_amount: all.iter().map(|s| s.amount).sum(),
    };
    shares(&distribution.top(n))
}
