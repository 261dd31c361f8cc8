use crate::{is_launchable_domain, ConsoleState, Effect, Msg, StreamPhase};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: ConsoleState, msg: Msg) -> (ConsoleState, Vec<Effect>) {
    let effects = match msg {
        Msg::FormEdited(form) => {
            state.set_form(form);
            Vec::new()
        }
        Msg::LaunchClicked => {
            // Validation gate: a malformed domain never produces a request,
            // and a launch already in flight blocks duplicates.
            if state.launch_in_flight() || !is_launchable_domain(&state.form().domain) {
                return (state, Vec::new());
            }
            let config = state.form().clone();
            state.begin_launch();
            vec![Effect::SubmitLaunch { config }]
        }
        Msg::LaunchFinished { result } => {
            state.finish_launch();
            match result {
                Ok(job_id) => {
                    let mut effects = Vec::new();
                    if state.active_job().is_some() {
                        effects.push(Effect::CloseStream);
                    }
                    state.adopt_job(job_id.clone());
                    effects.push(Effect::OpenStream { job_id });
                    effects
                }
                Err(reason) => {
                    // Surfaced once; the operator must resubmit explicitly.
                    state.set_notice(format!("launch failed: {reason}"));
                    Vec::new()
                }
            }
        }
        Msg::StopClicked => {
            if state.stop_in_flight() {
                Vec::new()
            } else if let Some(job_id) = state.active_job().map(str::to_owned) {
                state.begin_stop();
                vec![Effect::SubmitStop { job_id }]
            } else {
                Vec::new()
            }
        }
        Msg::StopFinished { job_id, result } => {
            state.finish_stop();
            match result {
                // Job id was captured at request time; if the view has moved
                // on since, the acknowledgement is ignored.
                Ok(()) if state.is_active(&job_id) => {
                    state.clear_job();
                    vec![Effect::CloseStream]
                }
                Ok(()) => Vec::new(),
                Err(reason) => {
                    state.set_notice(format!("stop failed: {reason}"));
                    Vec::new()
                }
            }
        }
        Msg::StreamOpened { job_id, at } => {
            if state.is_active(&job_id) {
                state.stream_opened(job_id, at);
            }
            Vec::new()
        }
        Msg::StreamMessage { job_id, frame, at } => {
            if state.is_active(&job_id) {
                state.append_frame(&frame, at);
            }
            Vec::new()
        }
        Msg::StreamClosed { job_id, at } => {
            if !state.is_active(&job_id) {
                return (state, Vec::new());
            }
            state.stream_closed(job_id.clone(), at);
            if state.phase() == StreamPhase::ClosedRetry {
                vec![Effect::ScheduleReconnect { job_id }]
            } else {
                // Budget spent: give up silently until the job id changes.
                Vec::new()
            }
        }
        Msg::ReconnectDue { job_id } => {
            if state.is_active(&job_id) && state.phase() == StreamPhase::ClosedRetry {
                state.reconnecting();
                vec![Effect::OpenStream { job_id }]
            } else {
                Vec::new()
            }
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
