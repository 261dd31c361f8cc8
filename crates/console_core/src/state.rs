use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::{EventStatus, JobId, LogEvent};

/// Unexpected closures tolerated before the stream gives up for good.
pub const MAX_STREAM_RETRIES: u32 = 3;

/// Fixed delay before a reconnect attempt after an unexpected closure.
pub const RECONNECT_BACKOFF: Duration = Duration::from_secs(2);

/// Tagged state of the log subscription for the active job id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamPhase {
    /// No job id set; no connection, empty event sequence.
    #[default]
    Idle,
    /// Subscription attempt in flight.
    Connecting,
    /// Subscription established, no message received yet.
    Open,
    /// Steady state; inbound messages are being appended.
    Receiving,
    /// Dropped unexpectedly; a reconnect attempt is scheduled.
    ClosedRetry,
    /// Retry budget exhausted. Terminal until the job id changes.
    ClosedFinal,
}

/// Crawl parameters submitted to the backend. Immutable once launched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrawlConfig {
    pub domain: String,
    pub depth: u32,
    pub concurrency: u32,
    pub delay: f64,
    pub use_proxies: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            domain: String::new(),
            depth: 1,
            concurrency: 2,
            delay: 1.0,
            use_proxies: false,
            limit: None,
        }
    }
}

/// Client-side launch gate: only absolute http(s) URLs may be submitted.
pub fn is_launchable_domain(domain: &str) -> bool {
    match url::Url::parse(domain) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

/// Full state of the monitoring view: the crawl form, the active job slot,
/// the in-memory event sequence and the stream state machine.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConsoleState {
    form: CrawlConfig,
    launch_in_flight: bool,
    stop_in_flight: bool,
    active_job: Option<JobId>,
    events: Vec<LogEvent>,
    phase: StreamPhase,
    retries: u32,
    notice: Option<String>,
    dirty: bool,
}

impl ConsoleState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn form(&self) -> &CrawlConfig {
        &self.form
    }

    pub fn launch_in_flight(&self) -> bool {
        self.launch_in_flight
    }

    pub fn stop_in_flight(&self) -> bool {
        self.stop_in_flight
    }

    pub fn active_job(&self) -> Option<&str> {
        self.active_job.as_deref()
    }

    /// Whether `job_id` is the current subscription target. Stream messages
    /// for any other job id are stale and must be dropped.
    pub fn is_active(&self, job_id: &str) -> bool {
        self.active_job.as_deref() == Some(job_id)
    }

    pub fn phase(&self) -> StreamPhase {
        self.phase
    }

    pub fn events(&self) -> &[LogEvent] {
        &self.events
    }

    /// Returns whether the state changed since the last call, clearing the
    /// flag. The app loop renders only when this reports true.
    pub fn consume_dirty(&mut self) -> bool {
        let was_dirty = self.dirty;
        self.dirty = false;
        was_dirty
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_form(&mut self, form: CrawlConfig) {
        self.form = form;
        self.mark_dirty();
    }

    pub(crate) fn begin_launch(&mut self) {
        self.launch_in_flight = true;
        self.notice = None;
        self.mark_dirty();
    }

    pub(crate) fn finish_launch(&mut self) {
        self.launch_in_flight = false;
        self.mark_dirty();
    }

    pub(crate) fn begin_stop(&mut self) {
        self.stop_in_flight = true;
        self.notice = None;
        self.mark_dirty();
    }

    pub(crate) fn finish_stop(&mut self) {
        self.stop_in_flight = false;
        self.mark_dirty();
    }

    pub(crate) fn set_notice(&mut self, notice: String) {
        self.notice = Some(notice);
        self.mark_dirty();
    }

    pub(crate) fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Makes `job_id` the sole subscription target, discarding the previous
    /// event sequence and resetting the retry budget.
    pub(crate) fn adopt_job(&mut self, job_id: JobId) {
        self.active_job = Some(job_id);
        self.events.clear();
        self.retries = 0;
        self.phase = StreamPhase::Connecting;
        self.mark_dirty();
    }

    /// Clears the active job slot; the event sequence dies with it.
    pub(crate) fn clear_job(&mut self) {
        self.active_job = None;
        self.events.clear();
        self.retries = 0;
        self.phase = StreamPhase::Idle;
        self.mark_dirty();
    }

    pub(crate) fn stream_opened(&mut self, job_id: JobId, at: DateTime<Utc>) {
        self.phase = StreamPhase::Open;
        self.retries = 0;
        self.events
            .push(LogEvent::synthetic(job_id, EventStatus::Connected, Value::Null, at));
        self.mark_dirty();
    }

    /// Appends one inbound frame. Undecodable frames degrade to a synthetic
    /// error event so the sequence stays length-preserving.
    pub(crate) fn append_frame(&mut self, frame: &str, at: DateTime<Utc>) {
        let event = match crate::decode_frame(frame) {
            Ok(event) => event,
            Err(err) => LogEvent::synthetic(
                self.active_job.clone().unwrap_or_default(),
                EventStatus::Error,
                json!({
                    "decode_error": err.to_string(),
                    "frame": truncate_frame(frame),
                }),
                at,
            ),
        };
        self.events.push(event);
        self.phase = StreamPhase::Receiving;
        self.mark_dirty();
    }

    /// Records an unexpected closure. Transitions to `ClosedRetry` while the
    /// retry budget lasts, `ClosedFinal` once it is spent.
    pub(crate) fn stream_closed(&mut self, job_id: JobId, at: DateTime<Utc>) {
        self.events
            .push(LogEvent::synthetic(job_id, EventStatus::Closed, Value::Null, at));
        if self.retries < MAX_STREAM_RETRIES {
            self.retries += 1;
            self.phase = StreamPhase::ClosedRetry;
        } else {
            self.phase = StreamPhase::ClosedFinal;
        }
        self.mark_dirty();
    }

    pub(crate) fn reconnecting(&mut self) {
        self.phase = StreamPhase::Connecting;
        self.mark_dirty();
    }
}

fn truncate_frame(frame: &str) -> String {
    frame.chars().take(120).collect()
}
