use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use console_client::{
    ApiClient, ApiSettings, ClientEvent, ConsoleHandle, SignalSink, StreamSignal, StreamTransport,
};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Transport that replays a fixed script, optionally holding the
/// subscription open until it is cancelled.
struct ScriptedTransport {
    script: Vec<StreamSignal>,
    hold_until_cancel: bool,
    cancellations: Arc<AtomicUsize>,
}

impl ScriptedTransport {
    fn new(script: Vec<StreamSignal>, hold_until_cancel: bool) -> Self {
        Self {
            script,
            hold_until_cancel,
            cancellations: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl StreamTransport for ScriptedTransport {
    async fn subscribe(&self, _job_id: &str, sink: &dyn SignalSink, cancel: CancellationToken) {
        for signal in &self.script {
            sink.emit(signal.clone());
        }
        if self.hold_until_cancel {
            cancel.cancelled().await;
            self.cancellations.fetch_add(1, Ordering::SeqCst);
        }
    }
}

fn handle_with(transport: Arc<dyn StreamTransport>) -> ConsoleHandle {
    // The REST side is unused in these tests.
    let base = Url::parse("http://127.0.0.1:9/").expect("base");
    let api = ApiClient::new(base, ApiSettings::default()).expect("api client");
    ConsoleHandle::new(api, transport)
}

fn wait_for(
    handle: &ConsoleHandle,
    deadline: Duration,
    mut pred: impl FnMut(&ClientEvent) -> bool,
) -> Option<ClientEvent> {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if let Some(event) = handle.recv_timeout(Duration::from_millis(20)) {
            if pred(&event) {
                return Some(event);
            }
        }
    }
    None
}

#[test]
fn subscription_signals_arrive_in_order_tagged_with_job_id() {
    let at = Utc::now();
    let transport = Arc::new(ScriptedTransport::new(
        vec![
            StreamSignal::Opened { at },
            StreamSignal::Frame {
                text: "first".to_string(),
                at,
            },
            StreamSignal::Frame {
                text: "second".to_string(),
                at,
            },
            StreamSignal::Closed { at },
        ],
        false,
    ));
    let handle = handle_with(transport);
    handle.sender().open_stream("job-1".to_string());

    let mut events = Vec::new();
    let start = Instant::now();
    while events.len() < 4 && start.elapsed() < Duration::from_secs(2) {
        if let Some(event) = handle.recv_timeout(Duration::from_millis(20)) {
            events.push(event);
        }
    }

    assert_eq!(
        events,
        vec![
            ClientEvent::StreamOpened {
                job_id: "job-1".to_string(),
                at,
            },
            ClientEvent::StreamFrame {
                job_id: "job-1".to_string(),
                text: "first".to_string(),
                at,
            },
            ClientEvent::StreamFrame {
                job_id: "job-1".to_string(),
                text: "second".to_string(),
                at,
            },
            ClientEvent::StreamClosed {
                job_id: "job-1".to_string(),
                at,
            },
        ]
    );
}

#[test]
fn opening_a_stream_cancels_the_previous_subscription() {
    let transport = Arc::new(ScriptedTransport::new(
        vec![StreamSignal::Opened { at: Utc::now() }],
        true,
    ));
    let cancellations = transport.cancellations.clone();
    let handle = handle_with(transport);
    let sender = handle.sender();

    sender.open_stream("job-a".to_string());
    assert!(wait_for(&handle, Duration::from_secs(2), |event| {
        matches!(event, ClientEvent::StreamOpened { job_id, .. } if job_id == "job-a")
    })
    .is_some());

    sender.open_stream("job-b".to_string());
    assert!(wait_for(&handle, Duration::from_secs(2), |event| {
        matches!(event, ClientEvent::StreamOpened { job_id, .. } if job_id == "job-b")
    })
    .is_some());

    let start = Instant::now();
    while cancellations.load(Ordering::SeqCst) == 0 && start.elapsed() < Duration::from_secs(2) {
        std::thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(cancellations.load(Ordering::SeqCst), 1);
}

#[test]
fn close_stream_discards_pending_reconnect_timer() {
    let transport = Arc::new(ScriptedTransport::new(Vec::new(), true));
    let handle = handle_with(transport);
    let sender = handle.sender();

    sender.open_stream("job-a".to_string());
    sender.schedule_reconnect("job-a".to_string(), Duration::from_millis(100));
    sender.close_stream();

    // The timer died with the subscription guard.
    assert!(wait_for(&handle, Duration::from_millis(400), |event| {
        matches!(event, ClientEvent::ReconnectDue { .. })
    })
    .is_none());
}

#[test]
fn reconnect_timer_fires_after_backoff() {
    let transport = Arc::new(ScriptedTransport::new(Vec::new(), true));
    let handle = handle_with(transport);
    let sender = handle.sender();

    sender.open_stream("job-a".to_string());
    sender.schedule_reconnect("job-a".to_string(), Duration::from_millis(20));

    let event = wait_for(&handle, Duration::from_secs(2), |event| {
        matches!(event, ClientEvent::ReconnectDue { .. })
    });
    assert_eq!(
        event,
        Some(ClientEvent::ReconnectDue {
            job_id: "job-a".to_string(),
        })
    );
}

#[test]
fn reconnect_for_a_stale_job_id_is_dropped() {
    let transport = Arc::new(ScriptedTransport::new(Vec::new(), true));
    let handle = handle_with(transport);
    let sender = handle.sender();

    sender.open_stream("job-b".to_string());
    // Scheduled against a job that no longer owns the subscription.
    sender.schedule_reconnect("job-a".to_string(), Duration::from_millis(20));

    assert!(wait_for(&handle, Duration::from_millis(300), |event| {
        matches!(event, ClientEvent::ReconnectDue { .. })
    })
    .is_none());
}
