use std::sync::Once;

use chrono::{DateTime, Utc};
use console_core::{
    update, ConsoleState, CrawlConfig, Effect, EventStatus, Msg, StreamPhase, MAX_STREAM_RETRIES,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(console_logging::initialize_for_tests);
}

fn at() -> DateTime<Utc> {
    Utc::now()
}

/// State with `job-1` adopted as the active subscription target.
fn monitoring(job_id: &str) -> ConsoleState {
    let state = ConsoleState::new();
    let (state, _) = update(
        state,
        Msg::FormEdited(CrawlConfig {
            domain: "https://example.com".to_string(),
            ..CrawlConfig::default()
        }),
    );
    let (state, _) = update(state, Msg::LaunchClicked);
    let (state, _) = update(
        state,
        Msg::LaunchFinished {
            result: Ok(job_id.to_string()),
        },
    );
    state
}

fn frame(job_id: &str, status: &str, detail: serde_json::Value) -> String {
    serde_json::json!({
        "job_id": job_id,
        "url": "https://example.com/page",
        "status": status,
        "detail": detail,
        "timestamp": at(),
    })
    .to_string()
}

fn opened(state: ConsoleState, job_id: &str) -> ConsoleState {
    let (state, _) = update(
        state,
        Msg::StreamOpened {
            job_id: job_id.to_string(),
            at: at(),
        },
    );
    state
}

fn closed(state: ConsoleState, job_id: &str) -> (ConsoleState, Vec<Effect>) {
    update(
        state,
        Msg::StreamClosed {
            job_id: job_id.to_string(),
            at: at(),
        },
    )
}

#[test]
fn open_appends_synthetic_connected_event() {
    init_logging();
    let state = opened(monitoring("job-1"), "job-1");

    assert_eq!(state.phase(), StreamPhase::Open);
    let statuses: Vec<_> = state.events().iter().map(|e| e.status).collect();
    assert_eq!(statuses, vec![EventStatus::Connected]);
    assert!(state.events()[0].url.is_empty());
}

#[test]
fn messages_append_in_arrival_order_length_preserving() {
    init_logging();
    let mut state = opened(monitoring("job-1"), "job-1");

    let frames = vec![
        frame("job-1", "started", serde_json::Value::Null),
        "this is not json".to_string(),
        frame("job-1", "fetched", serde_json::json!("https://example.com/a")),
    ];
    for text in &frames {
        let (next, effects) = update(
            state,
            Msg::StreamMessage {
                job_id: "job-1".to_string(),
                frame: text.clone(),
                at: at(),
            },
        );
        assert!(effects.is_empty());
        state = next;
    }

    // connected + one event per inbound frame, in arrival order.
    let statuses: Vec<_> = state.events().iter().map(|e| e.status).collect();
    assert_eq!(
        statuses,
        vec![
            EventStatus::Connected,
            EventStatus::Started,
            EventStatus::Error,
            EventStatus::Fetched,
        ]
    );
    assert_eq!(state.events().len(), frames.len() + 1);
    assert_eq!(state.phase(), StreamPhase::Receiving);

    // The synthetic error carries a diagnostic, not a silent drop.
    let diagnostic = state.events()[2].detail.to_string();
    assert!(diagnostic.contains("decode_error"));
    assert!(diagnostic.contains("this is not json"));
}

#[test]
fn frames_for_other_job_ids_are_dropped() {
    init_logging();
    let state = opened(monitoring("job-1"), "job-1");

    let (state, effects) = update(
        state,
        Msg::StreamMessage {
            job_id: "job-0".to_string(),
            frame: frame("job-0", "started", serde_json::Value::Null),
            at: at(),
        },
    );

    assert!(effects.is_empty());
    assert_eq!(state.events().len(), 1); // connected only
}

#[test]
fn unexpected_closure_schedules_bounded_reconnects() {
    init_logging();
    let mut state = monitoring("job-1");

    for attempt in 1..=MAX_STREAM_RETRIES {
        let (next, effects) = closed(state, "job-1");
        assert_eq!(
            effects,
            vec![Effect::ScheduleReconnect {
                job_id: "job-1".to_string(),
            }],
            "closure {attempt} should schedule a retry"
        );
        assert_eq!(next.phase(), StreamPhase::ClosedRetry);

        let (next, effects) = update(
            next,
            Msg::ReconnectDue {
                job_id: "job-1".to_string(),
            },
        );
        assert_eq!(
            effects,
            vec![Effect::OpenStream {
                job_id: "job-1".to_string(),
            }]
        );
        assert_eq!(next.phase(), StreamPhase::Connecting);
        state = next;
    }

    // Fourth consecutive closure with no successful open in between:
    // terminal, nothing further is scheduled.
    let (state, effects) = closed(state, "job-1");
    assert!(effects.is_empty());
    assert_eq!(state.phase(), StreamPhase::ClosedFinal);

    let (_state, effects) = update(
        state,
        Msg::ReconnectDue {
            job_id: "job-1".to_string(),
        },
    );
    assert!(effects.is_empty());
}

#[test]
fn successful_open_resets_retry_budget() {
    init_logging();
    let state = monitoring("job-1");

    // One failure, then a successful reopen.
    let (state, _effects) = closed(state, "job-1");
    let (state, _effects) = update(
        state,
        Msg::ReconnectDue {
            job_id: "job-1".to_string(),
        },
    );
    let mut state = opened(state, "job-1");

    // The counter was reset, so the full budget is available again.
    for _ in 1..=MAX_STREAM_RETRIES {
        let (next, effects) = closed(state, "job-1");
        assert!(!effects.is_empty());
        let (next, _effects) = update(
            next,
            Msg::ReconnectDue {
                job_id: "job-1".to_string(),
            },
        );
        state = next;
    }
    let (state, effects) = closed(state, "job-1");
    assert!(effects.is_empty());
    assert_eq!(state.phase(), StreamPhase::ClosedFinal);
}

#[test]
fn closure_for_other_job_id_is_ignored() {
    init_logging();
    let state = opened(monitoring("job-2"), "job-2");

    let (state, effects) = closed(state, "job-1");
    assert!(effects.is_empty());
    assert_eq!(state.phase(), StreamPhase::Open);
    assert_eq!(state.events().len(), 1);
}

#[test]
fn messages_after_stop_are_not_appended() {
    init_logging();
    let state = opened(monitoring("job-1"), "job-1");
    let (state, _effects) = update(state, Msg::StopClicked);
    let (state, _effects) = update(
        state,
        Msg::StopFinished {
            job_id: "job-1".to_string(),
            result: Ok(()),
        },
    );
    assert!(state.events().is_empty());

    // A straggler frame off the now-closed socket.
    let (state, effects) = update(
        state,
        Msg::StreamMessage {
            job_id: "job-1".to_string(),
            frame: frame("job-1", "fetched", serde_json::Value::Null),
            at: at(),
        },
    );
    assert!(effects.is_empty());
    assert!(state.events().is_empty());
}

#[test]
fn job_switch_isolates_event_sequences() {
    init_logging();
    let state = opened(monitoring("job-1"), "job-1");
    let (state, _effects) = update(state, Msg::LaunchClicked);
    let (state, _effects) = update(
        state,
        Msg::LaunchFinished {
            result: Ok("job-2".to_string()),
        },
    );

    // Late traffic from the old subscription never lands in the new log.
    let (state, _effects) = update(
        state,
        Msg::StreamMessage {
            job_id: "job-1".to_string(),
            frame: frame("job-1", "fetched", serde_json::Value::Null),
            at: at(),
        },
    );
    assert!(state.events().is_empty());

    let state = opened(state, "job-2");
    assert_eq!(state.events().len(), 1);
    assert_eq!(state.events()[0].job_id, "job-2");
}

#[test]
fn reconnect_due_after_job_cleared_is_ignored() {
    init_logging();
    let state = monitoring("job-1");
    let (state, _effects) = closed(state, "job-1");
    let (state, _effects) = update(state, Msg::StopClicked);
    let (state, _effects) = update(
        state,
        Msg::StopFinished {
            job_id: "job-1".to_string(),
            result: Ok(()),
        },
    );

    let (state, effects) = update(
        state,
        Msg::ReconnectDue {
            job_id: "job-1".to_string(),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.phase(), StreamPhase::Idle);
}
