//! Line-driven driver for the search engine.
//!
//! Every stdin line is either text typed into the search box or a `:command`.
//! Snapshots and events are printed to stdout as JSON lines.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use pinmap_search_core::NavKey;
use pinmap_search_core::SearchEngine;
use pinmap_search_core::SearchEvent;
use pinmap_search_core::SearchEventSender;
use pinmap_search_core::SearchHandle;
use pinmap_search_core::SearchSnapshot;
use pinmap_search_core::SuggestionSource;
use serde::Serialize;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::watch;
use tokio::time::sleep;
use tokio::time::timeout;
use tracing::warn;

use crate::config::AppConfig;

#[derive(Debug, Parser)]
pub struct InteractiveArgs {
    /// Print only events, not every snapshot
    #[arg(long)]
    pub events_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCommand {
    Type(String),
    Set(String),
    Key(NavKey),
    Click(usize),
    Focus,
    Outside,
}

/// Parses one stdin line. Lines starting with `::` type a literal `:`.
pub fn parse_line(line: &str) -> Result<DriverCommand, String> {
    if let Some(rest) = line.strip_prefix("::") {
        return Ok(DriverCommand::Type(format!(":{rest}")));
    }
    let Some(command) = line.strip_prefix(':') else {
        return Ok(DriverCommand::Type(line.to_string()));
    };
    let (name, arg) = match command.split_once(' ') {
        Some((name, arg)) => (name, Some(arg)),
        None => (command, None),
    };
    match (name, arg) {
        ("up", None) => Ok(DriverCommand::Key(NavKey::Up)),
        ("down", None) => Ok(DriverCommand::Key(NavKey::Down)),
        ("enter", None) => Ok(DriverCommand::Key(NavKey::Enter)),
        ("esc", None) => Ok(DriverCommand::Key(NavKey::Escape)),
        ("focus", None) => Ok(DriverCommand::Focus),
        ("outside", None) => Ok(DriverCommand::Outside),
        ("click", Some(index)) => index
            .trim()
            .parse()
            .map(DriverCommand::Click)
            .map_err(|_| format!("invalid row index: {index}")),
        ("set", arg) => Ok(DriverCommand::Set(arg.unwrap_or_default().to_string())),
        _ => Err(format!("unknown command: {line}")),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
enum OutputLine<'a> {
    Snapshot(&'a SearchSnapshot),
    Event(&'a SearchEvent),
}

fn print_line(line: &OutputLine<'_>) {
    match serde_json::to_string(line) {
        Ok(json) => {
            let mut stdout = std::io::stdout().lock();
            if let Err(e) = writeln!(stdout, "{json}") {
                warn!("failed to write output: {e}");
            }
        }
        Err(e) => warn!("failed to encode output: {e}"),
    }
}

async fn print_output(
    mut events: UnboundedReceiver<SearchEvent>,
    mut snapshots: watch::Receiver<SearchSnapshot>,
    events_only: bool,
) {
    let mut snapshots_open = !events_only;
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => print_line(&OutputLine::Event(&event)),
                None => break,
            },
            changed = snapshots.changed(), if snapshots_open => {
                if changed.is_err() {
                    snapshots_open = false;
                    continue;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                print_line(&OutputLine::Snapshot(&snapshot));
            }
        }
    }
}

fn apply(search: &SearchHandle, command: DriverCommand) {
    match command {
        DriverCommand::Type(text) => search.type_text(text),
        DriverCommand::Set(text) => search.set_text(text),
        DriverCommand::Key(key) => search.key(key),
        DriverCommand::Click(index) => search.click(index),
        DriverCommand::Focus => search.focus(),
        DriverCommand::Outside => search.pointer_down_outside(),
    }
}

pub async fn run(
    args: InteractiveArgs,
    config: AppConfig,
    sources: Vec<Arc<dyn SuggestionSource>>,
) -> Result<()> {
    let settle_grace = config.search.debounce() + Duration::from_millis(50);
    let request_timeout = config.sources.request_timeout();
    let viewer = config.viewer();
    let (events, events_rx) = SearchEventSender::channel();
    let search = SearchEngine::spawn(config.search, viewer, sources, events)?;
    let printer = tokio::spawn(print_output(
        events_rx,
        search.subscribe(),
        args.events_only,
    ));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_line(&line) {
            Ok(command) => apply(&search, command),
            Err(e) => eprintln!("{e}"),
        }
    }

    // Let a trailing keystroke's debounce fire and its fan-out settle.
    sleep(settle_grace).await;
    if timeout(request_timeout, search.wait_for(|s| !s.pending))
        .await
        .is_err()
    {
        warn!("sources still pending at end of input");
    }

    drop(search);
    printer.await?;
    Ok(())
}
