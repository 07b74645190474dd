//! Record aggregation and per-bucket statistics.
//!
//! This module groups classified records either by category alone
//! (distribution views) or by month bucket and category (time-series
//! views), accumulating a count and a monetary sum for each cell.

use crate::analysis::period::{TimeBucket, Window};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Label of the slice that absorbs categories beyond a display limit.
pub const OTHER_LABEL: &str = "Other";

/// Count and summed amount for one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryAggregate {
    pub category: String,
    pub count: u64,
    pub amount: f64,
}

impl CategoryAggregate {
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            count: 0,
            amount: 0.0,
        }
    }

    fn add(&mut self, amount: f64) {
        self.count = self.count.saturating_add(1);
        self.amount += amount;
    }

    fn merge(&mut self, other: &CategoryAggregate) {
        self.count = self.count.saturating_add(other.count);
        self.amount += other.amount;
    }
}

/// Category totals for one dimension, with no time axis.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Distribution {
    /// Slices ordered by count (highest first), then by label.
    pub slices: Vec<CategoryAggregate>,
    pub total_count: u64,
    pub total_amount: f64,
}

impl Distribution {
    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }

    pub fn get(&self, category: &str) -> Option<&CategoryAggregate> {
        self.slices.iter().find(|s| s.category == category)
    }

    pub fn count_of(&self, category: &str) -> u64 {
        self.get(category).map_or(0, |s| s.count)
    }

    pub fn amount_of(&self, category: &str) -> f64 {
        self.get(category).map_or(0.0, |s| s.amount)
    }

    /// Keep the `n` largest slices and fold the rest into [`OTHER_LABEL`].
    ///
    /// Totals are unchanged, so shares computed afterwards still add up.
    pub fn top(&self, n: usize) -> Distribution {
        if self.slices.len() <= n {
            return self.clone();
        }

        let keep = n.saturating_sub(1);
        let mut slices: Vec<CategoryAggregate> = self.slices[..keep].to_vec();
        let mut rest = CategoryAggregate::new(OTHER_LABEL);
        for slice in &self.slices[keep..] {
            rest.merge(slice);
        }

        slices.push(rest);

        Distribution {
            slices,
            total_count: self.total_count,
            total_amount: self.total_amount,
        }
    }
}

fn sort_slices(slices: &mut [CategoryAggregate]) {
    slices.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.category.cmp(&b.category))
    });
}

/// Group records by category in a single pass.
pub fn distribute<I, R, C, A>(records: I, classify: C, amount: A) -> Distribution
where
    I: IntoIterator<Item = R>,
    C: Fn(&R) -> String,
    A: Fn(&R) -> f64,
{
    let mut grouped: BTreeMap<String, CategoryAggregate> = BTreeMap::new();
    let mut total_count = 0u64;
    let mut total_amount = 0.0;

    for record in records {
        let category = classify(&record);
        let value = amount(&record);

        grouped
            .entry(category.clone())
            .or_insert_with(|| CategoryAggregate::new(category))
            .add(value);

        total_count = total_count.saturating_add(1);
        total_amount += value;
    }

    let mut slices: Vec<CategoryAggregate> = grouped.into_values().collect();
    sort_slices(&mut slices);

    Distribution {
        slices,
        total_count,
        total_amount,
    }
}

/// How records with no usable timestamp are treated by a [`PeriodFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownDates {
    /// Drop them (time-series views).
    Exclude,
    /// Keep them (category-only views).
    Include,
}

/// Admits records whose timestamp lies in the analysis window.
#[derive(Debug, Clone, Copy)]
pub struct PeriodFilter {
    pub window: Window,
    pub unknown_dates: UnknownDates,
}

impl PeriodFilter {
    /// Filter for charts with a time axis.
    pub fn time_series(window: Window) -> Self {
        Self {
            window,
            unknown_dates: UnknownDates::Exclude,
        }
    }

    /// Filter for charts grouped by category only.
    pub fn distribution(window: Window) -> Self {
        Self {
            window,
            unknown_dates: UnknownDates::Include,
        }
    }

    pub fn admits(&self, timestamp: Option<NaiveDateTime>) -> bool {
        match timestamp {
            Some(t) => self.window.contains(t),
            None => self.unknown_dates == UnknownDates::Include,
        }
    }

    /// Records admitted by this filter, in input order.
    pub fn apply<'a, T, F>(&self, records: &'a [T], timestamp: F) -> Vec<&'a T>
    where
        F: Fn(&T) -> Option<NaiveDateTime>,
    {
        records
            .iter()
            .filter(|record| self.admits(timestamp(record)))
            .collect()
    }
}

/// One bucket of a time series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketRow {
    pub bucket: TimeBucket,
    pub categories: BTreeMap<String, CategoryAggregate>,
    pub count: u64,
    pub amount: f64,
}

impl BucketRow {
    fn new(bucket: TimeBucket) -> Self {
        Self {
            bucket,
            categories: BTreeMap::new(),
            count: 0,
            amount: 0.0,
        }
    }

    pub fn count_of(&self, category: &str) -> u64 {
        self.categories.get(category).map_or(0, |c| c.count)
    }

    pub fn amount_of(&self, category: &str) -> f64 {
        self.categories.get(category).map_or(0.0, |c| c.amount)
    }
}

/// Records grouped by month bucket and category.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BucketSeries {
    pub rows: Vec<BucketRow>,
    /// Records with no valid timestamp or outside every bucket.
    pub discarded: u64,
}

impl BucketSeries {
    pub fn labels(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.bucket.label.clone()).collect()
    }

    /// Record count per bucket.
    pub fn counts(&self) -> Vec<u64> {
        self.rows.iter().map(|r| r.count).collect()
    }

    /// Summed amount per bucket.
    pub fn amounts(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.amount).collect()
    }

    pub fn category_counts(&self, category: &str) -> Vec<u64> {
        self.rows.iter().map(|r| r.count_of(category)).collect()
    }

    pub fn category_amounts(&self, category: &str) -> Vec<f64> {
        self.rows.iter().map(|r| r.amount_of(category)).collect()
    }

    /// Total records placed into buckets.
    pub fn total_count(&self) -> u64 {
        self.rows.iter().map(|r| r.count).sum()
    }
}

/// Index of the bucket containing `t`, if any.
fn bucket_index(buckets: &[TimeBucket], t: NaiveDateTime) -> Option<usize> {
    let idx = buckets.partition_point(|b| b.start <= t);
    if idx == 0 {
        return None;
    }
    let candidate = idx - 1;
    buckets[candidate].contains(t).then_some(candidate)
}

/// Assign records to month buckets and categories in a single pass.
///
/// Records whose timestamp is missing or falls outside every bucket are
/// counted in [`BucketSeries::discarded`] and otherwise ignored.
pub fn bucketize<I, R, T, C, A>(
    buckets: &[TimeBucket],
    records: I,
    timestamp: T,
    classify: C,
    amount: A,
) -> BucketSeries
where
    I: IntoIterator<Item = R>,
    T: Fn(&R) -> Option<NaiveDateTime>,
    C: Fn(&R) -> String,
    A: Fn(&R) -> f64,
{
    let mut rows: Vec<BucketRow> = buckets.iter().cloned().map(BucketRow::new).collect();
    let mut discarded = 0u64;

    for record in records {
        let Some(idx) = timestamp(&record).and_then(|t| bucket_index(buckets, t)) else {
            discarded = discarded.saturating_add(1);
            continue;
        };

        let category = classify(&record);
        let value = amount(&record);
        let row = &mut rows[idx];

        row.categories
            .entry(category.clone())
            .or_insert_with(|| CategoryAggregate::new(category))
            .add(value);
        row.count = row.count.saturating_add(1);
        row.amount += value;
    }

    if discarded > 0 {
        debug!(
            "{} record(s) fell outside {} bucket(s)",
            discarded,
            buckets.len()
        );
    }

    BucketSeries { rows, discarded }
}
