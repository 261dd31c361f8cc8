//! Console core: pure job-monitoring state machine and view-model helpers.
mod effect;
mod event;
mod metrics;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use event::{decode_frame, EventStatus, JobId, LogEvent};
pub use metrics::{derive_snapshot, ProgressSnapshot};
pub use msg::Msg;
pub use state::{
    is_launchable_domain, ConsoleState, CrawlConfig, StreamPhase, MAX_STREAM_RETRIES,
    RECONNECT_BACKOFF,
};
pub use update::update;
pub use view_model::{ConsoleViewModel, EventRowView};
