//! Error types for the analytics library.
//!
//! Aggregation itself never fails on well-typed input; these errors only
//! surface at the edges (parsing a period token, loading a snapshot).

/// Errors raised by the analytics library boundary.
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    /// The requested period token is not one of `7d`, `30d`, `90d`, `1y`, `all`.
    #[error("invalid period '{0}': expected one of 7d, 30d, 90d, 1y, all")]
    InvalidPeriod(String),

    /// The requested chart name is not known.
    #[error("invalid chart '{0}': expected one of revenue, claims, policies, customers, payments")]
    InvalidChart(String),

    /// I/O error reading a snapshot file.
    #[error("failed to read snapshot: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot is not valid JSON or has the wrong shape.
    #[error("failed to parse snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, AnalyticsError>;
