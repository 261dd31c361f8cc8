use async_trait::async_trait;
use chrono::{DateTime, Utc};
use console_logging::console_warn;
use futures_util::StreamExt;
use thiserror::Error;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use url::Url;

/// One signal from a live subscription, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamSignal {
    Opened { at: DateTime<Utc> },
    Frame { text: String, at: DateTime<Utc> },
    Closed { at: DateTime<Utc> },
}

/// Receives subscription signals as they happen.
pub trait SignalSink: Send + Sync {
    fn emit(&self, signal: StreamSignal);
}

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("invalid stream address: {0}")]
    BadAddress(String),
}

/// Transport behind the log subscription; swapped for a fake in tests.
#[async_trait]
pub trait StreamTransport: Send + Sync {
    /// Runs one subscription until the connection ends or `cancel` fires.
    ///
    /// Every exit path except cancellation finishes with a `Closed` signal,
    /// including a failed connect attempt. Cancellation emits nothing:
    /// the caller asked for teardown and has already moved on.
    async fn subscribe(&self, job_id: &str, sink: &dyn SignalSink, cancel: CancellationToken);
}

/// Production transport over a per-job WebSocket.
#[derive(Debug, Clone)]
pub struct WebSocketTransport {
    base: Url,
}

impl WebSocketTransport {
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    /// Maps the backend base address onto the job-scoped stream endpoint;
    /// http becomes ws and https becomes wss.
    fn stream_url(&self, job_id: &str) -> Result<Url, StreamError> {
        let mut url = self
            .base
            .join(&format!("logs/ws/{job_id}/"))
            .map_err(|err| StreamError::BadAddress(err.to_string()))?;
        let scheme = match url.scheme() {
            "https" | "wss" => "wss",
            _ => "ws",
        };
        url.set_scheme(scheme)
            .map_err(|_| StreamError::BadAddress(format!("cannot use scheme {scheme}")))?;
        Ok(url)
    }
}

#[async_trait]
impl StreamTransport for WebSocketTransport {
    async fn subscribe(&self, job_id: &str, sink: &dyn SignalSink, cancel: CancellationToken) {
        let url = match self.stream_url(job_id) {
            Ok(url) => url,
            Err(err) => {
                console_warn!("stream address rejected for job {job_id}: {err}");
                sink.emit(StreamSignal::Closed { at: Utc::now() });
                return;
            }
        };

        let connect = tokio::select! {
            result = connect_async(url.as_str()) => result,
            _ = cancel.cancelled() => return,
        };
        let mut socket = match connect {
            Ok((socket, _response)) => socket,
            Err(err) => {
                console_warn!("stream connect failed for job {job_id}: {err}");
                sink.emit(StreamSignal::Closed { at: Utc::now() });
                return;
            }
        };

        sink.emit(StreamSignal::Opened { at: Utc::now() });

        loop {
            let message = tokio::select! {
                message = socket.next() => message,
                _ = cancel.cancelled() => return,
            };
            match message {
                Some(Ok(Message::Text(text))) => {
                    sink.emit(StreamSignal::Frame {
                        text: text.to_string(),
                        at: Utc::now(),
                    });
                }
                // Control frames carry nothing worth appending.
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Binary(_))) => {}
                Some(Ok(_)) | None => {
                    sink.emit(StreamSignal::Closed { at: Utc::now() });
                    return;
                }
                Some(Err(err)) => {
                    console_warn!("stream read failed for job {job_id}: {err}");
                    sink.emit(StreamSignal::Closed { at: Utc::now() });
                    return;
                }
            }
        }
    }
}
