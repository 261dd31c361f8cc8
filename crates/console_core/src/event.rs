use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque token identifying one crawl run, minted by the backend.
pub type JobId = String;

/// Status tag carried by every log event.
///
/// `Connected` and `Closed` never come off the wire; the stream client
/// synthesizes them to make connection transitions visible in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Started,
    Fetched,
    Ingested,
    Progress,
    Error,
    Stopped,
    Completed,
    Connected,
    Closed,
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            EventStatus::Started => "started",
            EventStatus::Fetched => "fetched",
            EventStatus::Ingested => "ingested",
            EventStatus::Progress => "progress",
            EventStatus::Error => "error",
            EventStatus::Stopped => "stopped",
            EventStatus::Completed => "completed",
            EventStatus::Connected => "connected",
            EventStatus::Closed => "closed",
        };
        write!(f, "{text}")
    }
}

/// One timestamped record of crawl progress or lifecycle.
///
/// `url` is empty for connection-lifecycle events and `detail` may be a
/// structured value, a string, or absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    pub job_id: JobId,
    #[serde(default)]
    pub url: String,
    pub status: EventStatus,
    #[serde(default)]
    pub detail: Value,
    pub timestamp: DateTime<Utc>,
}

impl LogEvent {
    pub(crate) fn synthetic(
        job_id: JobId,
        status: EventStatus,
        detail: Value,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            job_id,
            url: String::new(),
            status,
            detail,
            timestamp: at,
        }
    }
}

/// Decodes one wire frame into a [`LogEvent`].
pub fn decode_frame(text: &str) -> Result<LogEvent, serde_json::Error> {
    serde_json::from_str(text)
}
