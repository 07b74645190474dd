//! Snapshot loading.
//!
//! The retrieval layer hands over one JSON document holding every record
//! collection. Loading is the only fallible step; malformed values inside
//! well-typed records are left for the analysis modules to absorb.

use crate::error::Result;
use crate::models::PortalSnapshot;
use std::path::Path;
use tracing::{debug, info};

/// Parse a snapshot from a JSON string.
pub fn parse_snapshot(json: &str) -> Result<PortalSnapshot> {
    let snapshot: PortalSnapshot = serde_json::from_str(json)?;
    debug!(
        "Parsed snapshot: {} claims, {} payments, {} policies, {} customers",
        snapshot.claims.len(),
        snapshot.payments.len(),
        snapshot.policies.len(),
        snapshot.customers.len()
    );
    Ok(snapshot)
}

/// Read and parse a snapshot file.
pub fn load_snapshot(path: &Path) -> Result<PortalSnapshot> {
    info!("Loading snapshot from: {}", path.display());
    let content = std::fs::read_to_string(path)?;
    parse_snapshot(&content)
}
