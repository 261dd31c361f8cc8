//! Console client: REST calls to the crawl backend and the live log
//! stream transport, bridged to the sync state machine by [`ConsoleHandle`].
mod api;
mod handle;
mod stream;

pub use api::{
    ApiClient, ApiError, ApiSettings, CleanupOut, DocumentItem, JobAck, Page, ProductItem,
};
pub use handle::{ClientEvent, ConsoleHandle, ConsoleSender};
pub use stream::{SignalSink, StreamError, StreamSignal, StreamTransport, WebSocketTransport};
