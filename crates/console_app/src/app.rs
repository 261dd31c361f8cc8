use std::io::{self, BufRead};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use console_client::{
    ApiClient, ApiSettings, ClientEvent, ConsoleHandle, ConsoleSender, WebSocketTransport,
};
use console_core::{update, ConsoleState, CrawlConfig, Msg};
use console_logging::console_info;

use crate::config;
use crate::effects::EffectRunner;
use crate::render;

/// One unit of work for the app loop.
pub enum Input {
    /// A message for the pure state machine.
    Core(Msg),
    /// A finished listing request, rendered directly.
    Listing(ClientEvent),
    Quit,
}

pub fn run() -> anyhow::Result<()> {
    let base = config::backend_base()?;
    console_info!("crawl console targeting {base}");

    let api = ApiClient::new(base.clone(), ApiSettings::default())?;
    let transport = Arc::new(WebSocketTransport::new(base));
    let handle = ConsoleHandle::new(api, transport);

    let (input_tx, input_rx) = mpsc::channel();
    let runner = EffectRunner::new(handle, input_tx.clone());

    render::usage();
    spawn_stdin_reader(input_tx, runner.commands());

    let mut state = ConsoleState::new();
    loop {
        match input_rx.recv_timeout(Duration::from_millis(100)) {
            Ok(Input::Core(msg)) => {
                let (next, effects) = update(std::mem::take(&mut state), msg);
                state = next;
                runner.run(effects);
                if state.consume_dirty() {
                    render::draw(&state.view());
                }
            }
            Ok(Input::Listing(event)) => render::draw_listing(&event),
            Ok(Input::Quit) => break,
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    console_info!("crawl console shutting down");
    Ok(())
}

fn spawn_stdin_reader(input_tx: mpsc::Sender<Input>, commands: ConsoleSender) {
    thread::spawn(move || {
        let mut form = CrawlConfig::default();
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if !handle_line(&line, &mut form, &input_tx, &commands) {
                return;
            }
        }
        let _ = input_tx.send(Input::Quit);
    });
}

/// Parses one operator command. Returns false once the loop should stop.
fn handle_line(
    line: &str,
    form: &mut CrawlConfig,
    input_tx: &mpsc::Sender<Input>,
    commands: &ConsoleSender,
) -> bool {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.as_slice() {
        [] => {}
        ["start", domain, rest @ ..] => {
            form.domain = domain.to_string();
            if let Some(depth) = rest.first().and_then(|raw| raw.parse().ok()) {
                form.depth = depth;
            }
            if let Some(concurrency) = rest.get(1).and_then(|raw| raw.parse().ok()) {
                form.concurrency = concurrency;
            }
            if let Some(delay) = rest.get(2).and_then(|raw| raw.parse().ok()) {
                form.delay = delay;
            }
            let _ = input_tx.send(Input::Core(Msg::FormEdited(form.clone())));
            let _ = input_tx.send(Input::Core(Msg::LaunchClicked));
        }
        ["proxies", toggle @ ("on" | "off")] => {
            form.use_proxies = *toggle == "on";
            let _ = input_tx.send(Input::Core(Msg::FormEdited(form.clone())));
        }
        ["limit", "off"] => {
            form.limit = None;
            let _ = input_tx.send(Input::Core(Msg::FormEdited(form.clone())));
        }
        ["limit", raw] => {
            if let Ok(limit) = raw.parse() {
                form.limit = Some(limit);
                let _ = input_tx.send(Input::Core(Msg::FormEdited(form.clone())));
            } else {
                println!("limit expects a positive integer or 'off'");
            }
        }
        ["stop"] => {
            let _ = input_tx.send(Input::Core(Msg::StopClicked));
        }
        ["products", rest @ ..] => {
            let skip = rest.first().and_then(|raw| raw.parse().ok()).unwrap_or(0);
            let limit = rest.get(1).and_then(|raw| raw.parse().ok()).unwrap_or(10);
            commands.products(skip, limit);
        }
        ["documents", rest @ ..] => {
            let offset = rest.first().and_then(|raw| raw.parse().ok()).unwrap_or(0);
            let limit = rest.get(1).and_then(|raw| raw.parse().ok()).unwrap_or(10);
            commands.documents(offset, limit);
        }
        ["cleanup"] => {
            commands.cleanup();
        }
        ["quit" | "exit"] => {
            let _ = input_tx.send(Input::Quit);
            return false;
        }
        _ => render::usage(),
    }
    true
}
