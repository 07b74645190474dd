//! Portal Analytics - dashboard aggregation for insurance portal records.
//!
//! Turns raw claim, payment, policy and customer records into the
//! chart-ready series and headline KPIs an insurance portal dashboard
//! renders. Every computation is a pure function of the snapshot, the
//! selected [`Period`] and a reference instant.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod ingest;
pub mod models;
pub mod report;

pub use analysis::Period;
pub use dashboard::{recompute, Chart, Dashboard, DashboardOptions, MetricSummary};
pub use error::{AnalyticsError, Result};
pub use ingest::{load_snapshot, parse_snapshot};
pub use models::PortalSnapshot;
