use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::{
    derive_snapshot, is_launchable_domain, ConsoleState, EventStatus, JobId, LogEvent,
    ProgressSnapshot, StreamPhase,
};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConsoleViewModel {
    pub active_job: Option<JobId>,
    pub phase: StreamPhase,
    pub events: Vec<EventRowView>,
    pub snapshot: Option<ProgressSnapshot>,
    pub can_launch: bool,
    pub can_stop: bool,
    pub notice: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventRowView {
    pub timestamp: DateTime<Utc>,
    pub status: EventStatus,
    pub url: String,
    pub detail: Option<String>,
}

impl EventRowView {
    fn from_event(event: &LogEvent) -> Self {
        let detail = match &event.detail {
            Value::Null => None,
            Value::String(text) if text.is_empty() => None,
            Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        };
        Self {
            timestamp: event.timestamp,
            status: event.status,
            url: event.url.clone(),
            detail,
        }
    }
}

impl ConsoleState {
    pub fn view(&self) -> ConsoleViewModel {
        ConsoleViewModel {
            active_job: self.active_job().map(str::to_owned),
            phase: self.phase(),
            events: self.events().iter().map(EventRowView::from_event).collect(),
            snapshot: derive_snapshot(self.events()),
            can_launch: !self.launch_in_flight() && is_launchable_domain(&self.form().domain),
            can_stop: self.active_job().is_some() && !self.stop_in_flight(),
            notice: self.notice().map(str::to_owned),
        }
    }
}
