use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use console_client::{ClientEvent, ConsoleHandle, ConsoleSender};
use console_core::{Effect, Msg, RECONNECT_BACKOFF};
use console_logging::console_info;

use crate::app::Input;

/// Executes the effects the state machine asks for and pumps IO events
/// back into the app loop as messages.
pub struct EffectRunner {
    commands: ConsoleSender,
}

impl EffectRunner {
    pub fn new(handle: ConsoleHandle, input_tx: mpsc::Sender<Input>) -> Self {
        let commands = handle.sender();
        spawn_event_pump(handle, input_tx);
        Self { commands }
    }

    pub fn commands(&self) -> ConsoleSender {
        self.commands.clone()
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::SubmitLaunch { config } => {
                    console_info!("launch requested domain={}", config.domain);
                    self.commands.launch(config);
                }
                Effect::SubmitStop { job_id } => {
                    console_info!("stop requested job={job_id}");
                    self.commands.stop(job_id);
                }
                Effect::OpenStream { job_id } => {
                    self.commands.open_stream(job_id);
                }
                Effect::CloseStream => {
                    self.commands.close_stream();
                }
                Effect::ScheduleReconnect { job_id } => {
                    self.commands.schedule_reconnect(job_id, RECONNECT_BACKOFF);
                }
            }
        }
    }
}

fn spawn_event_pump(handle: ConsoleHandle, input_tx: mpsc::Sender<Input>) {
    thread::spawn(move || loop {
        if let Some(event) = handle.recv_timeout(Duration::from_millis(20)) {
            if input_tx.send(map_event(event)).is_err() {
                break;
            }
        }
    });
}

fn map_event(event: ClientEvent) -> Input {
    match event {
        ClientEvent::LaunchFinished { result } => Input::Core(Msg::LaunchFinished {
            result: result.map(|ack| ack.job_id),
        }),
        ClientEvent::StopFinished { job_id, result } => Input::Core(Msg::StopFinished {
            job_id,
            result: result.map(|_ack| ()),
        }),
        ClientEvent::StreamOpened { job_id, at } => Input::Core(Msg::StreamOpened { job_id, at }),
        ClientEvent::StreamFrame { job_id, text, at } => Input::Core(Msg::StreamMessage {
            job_id,
            frame: text,
            at,
        }),
        ClientEvent::StreamClosed { job_id, at } => Input::Core(Msg::StreamClosed { job_id, at }),
        ClientEvent::ReconnectDue { job_id } => Input::Core(Msg::ReconnectDue { job_id }),
        listing @ (ClientEvent::ProductsLoaded { .. }
        | ClientEvent::DocumentsLoaded { .. }
        | ClientEvent::CleanupFinished { .. }) => Input::Listing(listing),
    }
}
