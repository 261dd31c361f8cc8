//! Terminal rendering of the monitoring view and the listing pages.

use console_client::ClientEvent;
use console_core::{ConsoleViewModel, StreamPhase};

/// Event rows shown per redraw; the full sequence stays in state.
const EVENT_WINDOW: usize = 12;

pub fn usage() {
    println!("commands:");
    println!("  start <url> [depth] [concurrency] [delay]   launch a crawl job");
    println!("  proxies on|off / limit <n>|off              adjust the crawl form");
    println!("  stop                                        stop the active job");
    println!("  products [skip] [limit]                     list extracted products");
    println!("  documents [offset] [limit]                  list stored documents");
    println!("  cleanup                                     deduplicate products");
    println!("  quit");
}

pub fn draw(view: &ConsoleViewModel) {
    println!("----------------------------------------------------------------");
    match &view.active_job {
        Some(job_id) => println!("job {job_id} [{}]", phase_label(view.phase)),
        None => println!("no active job"),
    }

    if let Some(notice) = &view.notice {
        println!("! {notice}");
    }

    for row in view.events.iter().rev().take(EVENT_WINDOW).rev() {
        let mut line = format!(
            "[{}] {:9}",
            row.timestamp.format("%H:%M:%S"),
            row.status.to_string()
        );
        if !row.url.is_empty() {
            line.push_str(&format!(" {}", row.url));
        }
        println!("{line}");
        if let Some(detail) = &row.detail {
            println!("        {detail}");
        }
    }

    if let Some(snapshot) = &view.snapshot {
        println!(
            "fetched {} | ingested {} | errors {} | elapsed {:.1}s",
            snapshot.fetched, snapshot.ingested, snapshot.errors, snapshot.elapsed
        );
    }
}

pub fn draw_listing(event: &ClientEvent) {
    match event {
        ClientEvent::ProductsLoaded { result } => match result {
            Ok(page) => {
                println!("products ({} total)", page.total);
                for item in &page.items {
                    println!(
                        "  #{:<6} {:24} {:16} {}",
                        item.id,
                        item.model,
                        item.brand.as_deref().unwrap_or("-"),
                        item.name.as_deref().unwrap_or("-"),
                    );
                }
            }
            Err(reason) => println!("! products failed: {reason}"),
        },
        ClientEvent::DocumentsLoaded { result } => match result {
            Ok(page) => {
                println!("documents ({} total)", page.total);
                for item in &page.items {
                    println!("  #{:<6} {}", item.id, item.url);
                }
            }
            Err(reason) => println!("! documents failed: {reason}"),
        },
        ClientEvent::CleanupFinished { result } => match result {
            Ok(out) => println!("cleanup removed {} duplicates", out.removed),
            Err(reason) => println!("! cleanup failed: {reason}"),
        },
        _ => {}
    }
}

fn phase_label(phase: StreamPhase) -> &'static str {
    match phase {
        StreamPhase::Idle => "idle",
        StreamPhase::Connecting => "connecting",
        StreamPhase::Open => "connected",
        StreamPhase::Receiving => "receiving",
        StreamPhase::ClosedRetry => "reconnecting",
        StreamPhase::ClosedFinal => "disconnected",
    }
}
