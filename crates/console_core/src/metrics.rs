use serde::Deserialize;
use serde_json::Value;

use crate::{EventStatus, LogEvent};

/// Derived counters from the latest `progress` event. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ProgressSnapshot {
    pub fetched: u64,
    pub ingested: u64,
    pub errors: u64,
    pub elapsed: f64,
}

/// Scans the event sequence newest-to-oldest for the last `progress` event
/// and decodes its detail payload.
///
/// The detail may arrive already structured or as a JSON string needing one
/// decode step. Best effort: any failure yields `None`, and with no
/// `progress` event there is no snapshot (zeros are never synthesized).
pub fn derive_snapshot(events: &[LogEvent]) -> Option<ProgressSnapshot> {
    let latest = events
        .iter()
        .rev()
        .find(|event| event.status == EventStatus::Progress)?;
    match &latest.detail {
        Value::String(raw) => serde_json::from_str(raw).ok(),
        detail => serde_json::from_value(detail.clone()).ok(),
    }
}
