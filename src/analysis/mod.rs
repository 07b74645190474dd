//! Analysis modules.
//!
//! Leaves first: timestamps are normalized, windows resolved, records
//! classified and aggregated, and metrics derived from the aggregates.

pub mod aggregator;
pub mod amount;
pub mod classifier;
pub mod metrics;
pub mod period;
pub mod timestamp;

pub use aggregator::*;
pub use period::{month_buckets, Period, TimeBucket, Window};
pub use timestamp::{normalize, RawTimestamp};
