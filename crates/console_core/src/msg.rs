use chrono::{DateTime, Utc};

use crate::{CrawlConfig, JobId};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Operator edited the crawl form (debounced).
    FormEdited(CrawlConfig),
    /// Operator asked to launch a job with the current form.
    LaunchClicked,
    /// Launch request finished; carries the new job id on success.
    LaunchFinished { result: Result<JobId, String> },
    /// Operator asked to stop the active job.
    StopClicked,
    /// Stop request finished for the job id captured at request time.
    StopFinished {
        job_id: JobId,
        result: Result<(), String>,
    },
    /// Subscription established for a job.
    StreamOpened { job_id: JobId, at: DateTime<Utc> },
    /// One raw frame arrived on the subscription.
    StreamMessage {
        job_id: JobId,
        frame: String,
        at: DateTime<Utc>,
    },
    /// Subscription dropped without the console asking for it.
    StreamClosed { job_id: JobId, at: DateTime<Utc> },
    /// Reconnect backoff elapsed for a job in `ClosedRetry`.
    ReconnectDue { job_id: JobId },
    /// Fallback for placeholder wiring.
    NoOp,
}
