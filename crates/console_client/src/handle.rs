use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use console_core::{CrawlConfig, JobId};
use console_logging::console_warn;
use tokio_util::sync::CancellationToken;

use crate::api::{ApiClient, CleanupOut, DocumentItem, JobAck, Page, ProductItem};
use crate::stream::{SignalSink, StreamSignal, StreamTransport};

enum Command {
    Launch { config: CrawlConfig },
    Stop { job_id: JobId },
    OpenStream { job_id: JobId },
    CloseStream,
    ScheduleReconnect { job_id: JobId, backoff: Duration },
    Products { skip: u64, limit: u64 },
    Documents { offset: u64, limit: u64 },
    Cleanup,
}

/// Everything the IO side reports back to the state machine and the
/// surrounding list views. Errors cross as strings; the full error has
/// already been logged here.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    LaunchFinished {
        result: Result<JobAck, String>,
    },
    StopFinished {
        job_id: JobId,
        result: Result<JobAck, String>,
    },
    StreamOpened {
        job_id: JobId,
        at: DateTime<Utc>,
    },
    StreamFrame {
        job_id: JobId,
        text: String,
        at: DateTime<Utc>,
    },
    StreamClosed {
        job_id: JobId,
        at: DateTime<Utc>,
    },
    ReconnectDue {
        job_id: JobId,
    },
    ProductsLoaded {
        result: Result<Page<ProductItem>, String>,
    },
    DocumentsLoaded {
        result: Result<Page<DocumentItem>, String>,
    },
    CleanupFinished {
        result: Result<CleanupOut, String>,
    },
}

/// Command side of a [`ConsoleHandle`]; cheap to clone.
#[derive(Debug, Clone)]
pub struct ConsoleSender {
    cmd_tx: mpsc::Sender<Command>,
}

impl ConsoleSender {
    pub fn launch(&self, config: CrawlConfig) {
        let _ = self.cmd_tx.send(Command::Launch { config });
    }

    pub fn stop(&self, job_id: JobId) {
        let _ = self.cmd_tx.send(Command::Stop { job_id });
    }

    pub fn open_stream(&self, job_id: JobId) {
        let _ = self.cmd_tx.send(Command::OpenStream { job_id });
    }

    pub fn close_stream(&self) {
        let _ = self.cmd_tx.send(Command::CloseStream);
    }

    pub fn schedule_reconnect(&self, job_id: JobId, backoff: Duration) {
        let _ = self.cmd_tx.send(Command::ScheduleReconnect { job_id, backoff });
    }

    pub fn products(&self, skip: u64, limit: u64) {
        let _ = self.cmd_tx.send(Command::Products { skip, limit });
    }

    pub fn documents(&self, offset: u64, limit: u64) {
        let _ = self.cmd_tx.send(Command::Documents { offset, limit });
    }

    pub fn cleanup(&self) {
        let _ = self.cmd_tx.send(Command::Cleanup);
    }
}

struct Subscription {
    job_id: JobId,
    guard: CancellationToken,
}

/// Bridge between the sync state machine and the tokio IO side.
///
/// Owns a background thread with its own runtime. At most one live
/// subscription exists at a time: opening a stream replaces the previous
/// one, and closing cancels both the socket and any pending reconnect
/// timer through the same guard token.
pub struct ConsoleHandle {
    cmd_tx: mpsc::Sender<Command>,
    event_rx: mpsc::Receiver<ClientEvent>,
}

impl ConsoleHandle {
    pub fn new(api: ApiClient, transport: Arc<dyn StreamTransport>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            let mut subscription: Option<Subscription> = None;
            while let Ok(command) = cmd_rx.recv() {
                handle_command(
                    &runtime,
                    &api,
                    &transport,
                    &event_tx,
                    &mut subscription,
                    command,
                );
            }
            // Handle dropped: tear down whatever is still live.
            if let Some(live) = subscription.take() {
                live.guard.cancel();
            }
        });

        Self { cmd_tx, event_rx }
    }

    pub fn sender(&self) -> ConsoleSender {
        ConsoleSender {
            cmd_tx: self.cmd_tx.clone(),
        }
    }

    pub fn try_recv(&self) -> Option<ClientEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<ClientEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

fn handle_command(
    runtime: &tokio::runtime::Runtime,
    api: &ApiClient,
    transport: &Arc<dyn StreamTransport>,
    event_tx: &mpsc::Sender<ClientEvent>,
    subscription: &mut Option<Subscription>,
    command: Command,
) {
    match command {
        Command::Launch { config } => {
            let api = api.clone();
            let event_tx = event_tx.clone();
            runtime.spawn(async move {
                let result = api.launch(&config).await.map_err(|err| {
                    console_warn!("launch failed for {}: {err}", config.domain);
                    err.to_string()
                });
                let _ = event_tx.send(ClientEvent::LaunchFinished { result });
            });
        }
        Command::Stop { job_id } => {
            let api = api.clone();
            let event_tx = event_tx.clone();
            runtime.spawn(async move {
                let result = api.stop(&job_id).await.map_err(|err| {
                    console_warn!("stop failed for job {job_id}: {err}");
                    err.to_string()
                });
                let _ = event_tx.send(ClientEvent::StopFinished { job_id, result });
            });
        }
        Command::OpenStream { job_id } => {
            // Single subscription by construction: opening replaces
            // whatever is running.
            if let Some(previous) = subscription.take() {
                previous.guard.cancel();
            }
            let guard = CancellationToken::new();
            *subscription = Some(Subscription {
                job_id: job_id.clone(),
                guard: guard.clone(),
            });
            let transport = transport.clone();
            let event_tx = event_tx.clone();
            runtime.spawn(async move {
                let sink = ChannelSignalSink {
                    job_id: job_id.clone(),
                    tx: event_tx,
                };
                transport.subscribe(&job_id, &sink, guard).await;
            });
        }
        Command::CloseStream => {
            if let Some(live) = subscription.take() {
                live.guard.cancel();
            }
        }
        Command::ScheduleReconnect { job_id, backoff } => {
            // The timer shares the subscription's guard, so closing the
            // stream or switching jobs discards it as well.
            let Some(guard) = subscription
                .as_ref()
                .filter(|live| live.job_id == job_id)
                .map(|live| live.guard.clone())
            else {
                return;
            };
            let event_tx = event_tx.clone();
            runtime.spawn(async move {
                tokio::select! {
                    _ = tokio::time::sleep(backoff) => {
                        let _ = event_tx.send(ClientEvent::ReconnectDue { job_id });
                    }
                    _ = guard.cancelled() => {}
                }
            });
        }
        Command::Products { skip, limit } => {
            let api = api.clone();
            let event_tx = event_tx.clone();
            runtime.spawn(async move {
                let result = api
                    .products(skip, limit)
                    .await
                    .map_err(|err| err.to_string());
                let _ = event_tx.send(ClientEvent::ProductsLoaded { result });
            });
        }
        Command::Documents { offset, limit } => {
            let api = api.clone();
            let event_tx = event_tx.clone();
            runtime.spawn(async move {
                let result = api
                    .documents(offset, limit)
                    .await
                    .map_err(|err| err.to_string());
                let _ = event_tx.send(ClientEvent::DocumentsLoaded { result });
            });
        }
        Command::Cleanup => {
            let api = api.clone();
            let event_tx = event_tx.clone();
            runtime.spawn(async move {
                let result = api.cleanup().await.map_err(|err| err.to_string());
                let _ = event_tx.send(ClientEvent::CleanupFinished { result });
            });
        }
    }
}

struct ChannelSignalSink {
    job_id: JobId,
    tx: mpsc::Sender<ClientEvent>,
}

impl SignalSink for ChannelSignalSink {
    fn emit(&self, signal: StreamSignal) {
        let event = match signal {
            StreamSignal::Opened { at } => ClientEvent::StreamOpened {
                job_id: self.job_id.clone(),
                at,
            },
            StreamSignal::Frame { text, at } => ClientEvent::StreamFrame {
                job_id: self.job_id.clone(),
                text,
                at,
            },
            StreamSignal::Closed { at } => ClientEvent::StreamClosed {
                job_id: self.job_id.clone(),
                at,
            },
        };
        let _ = self.tx.send(event);
    }
}
