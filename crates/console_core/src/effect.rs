use crate::{CrawlConfig, JobId};

/// IO requested by [`crate::update`]; executed outside the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Issue exactly one launch request with this configuration.
    SubmitLaunch { config: CrawlConfig },
    /// Issue exactly one advisory cancellation request.
    SubmitStop { job_id: JobId },
    /// Open the log subscription for this job id.
    OpenStream { job_id: JobId },
    /// Cancel the live subscription and any pending reconnect timer.
    CloseStream,
    /// Arm the fixed-backoff reconnect timer for this job id.
    ScheduleReconnect { job_id: JobId },
}
