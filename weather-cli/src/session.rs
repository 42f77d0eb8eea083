//! Interactive session: one line per event.
//!
//! Plain text searches for a city; lines starting with `:` are commands. Fetches run in
//! the background, so a new line can be entered while earlier lookups are pending.

use anyhow::Context;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, BufReader},
    task::{JoinError, JoinSet},
};
use weather_core::{FetchOrchestrator, Geolocator, MeasurementUnit, presentation};

use crate::render;

const HELP: &str = "\
Type a city name to search, or:
  :unit <metric|imperial>   switch units and refresh every city
  :select <city>            show the detail chart for a city
  :close                    close the detail chart
  :list                     show all cities
  :map                      show map pins
  :help                     show this help
  :quit                     leave";

#[derive(Debug, PartialEq)]
enum Input {
    Search(String),
    Unit(MeasurementUnit),
    Select(String),
    Close,
    List,
    Map,
    Help,
    Quit,
    Invalid(String),
}

fn parse(line: &str) -> Input {
    let Some(rest) = line.trim_start().strip_prefix(':') else {
        return Input::Search(line.to_string());
    };

    let (cmd, arg) = match rest.split_once(char::is_whitespace) {
        Some((cmd, arg)) => (cmd, arg.trim()),
        None => (rest.trim(), ""),
    };

    match cmd {
        "unit" | "units" => match MeasurementUnit::try_from(arg) {
            Ok(unit) => Input::Unit(unit),
            Err(e) => Input::Invalid(e.to_string()),
        },
        "select" if !arg.is_empty() => Input::Select(arg.to_string()),
        "select" => Input::Invalid("Usage: :select <city>".to_string()),
        "close" => Input::Close,
        "list" => Input::List,
        "map" => Input::Map,
        "help" => Input::Help,
        "quit" | "q" | "exit" => Input::Quit,
        other => Input::Invalid(format!("Unknown command ':{other}'. Type :help.")),
    }
}

pub async fn run(
    orchestrator: FetchOrchestrator,
    geolocator: &dyn Geolocator,
) -> anyhow::Result<()> {
    println!("{HELP}");
    println!();

    if orchestrator.startup(geolocator).await.is_err() {
        render::print_error(&orchestrator.snapshot().await, None);
    }
    render::print_cards(&presentation::cards(&orchestrator.snapshot().await));

    drive(&orchestrator, BufReader::new(tokio::io::stdin())).await
}

/// Read events from `input` until `:quit` or end of input.
///
/// Searches and unit changes run as background tasks, so the next line is read while
/// their fetches are still in flight. Each task prints its own result when it lands.
/// Pending tasks are awaited before returning.
async fn drive<R>(orchestrator: &FetchOrchestrator, input: R) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut pending: JoinSet<()> = JoinSet::new();

    loop {
        tokio::select! {
            Some(done) = pending.join_next(), if !pending.is_empty() => log_join(done),
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read from stdin")? else {
                    break;
                };
                if !handle(orchestrator, parse(&line), &mut pending).await {
                    break;
                }
            }
        }
    }

    while let Some(done) = pending.join_next().await {
        log_join(done);
    }

    Ok(())
}

/// Returns false when the session should end.
async fn handle(
    orchestrator: &FetchOrchestrator,
    input: Input,
    pending: &mut JoinSet<()>,
) -> bool {
    match input {
        Input::Search(city) => {
            let orchestrator = orchestrator.clone();
            pending.spawn(async move {
                if orchestrator.search(&city).await.is_err() {
                    render::print_error(&orchestrator.snapshot().await, Some(city.trim()));
                } else {
                    render::print_cards(&presentation::cards(&orchestrator.snapshot().await));
                }
            });
        }
        Input::Unit(unit) => {
            let orchestrator = orchestrator.clone();
            pending.spawn(async move {
                let summary = orchestrator.change_unit(unit).await;
                tracing::debug!(?summary, "unit refresh finished");
                let state = orchestrator.snapshot().await;
                if summary.failed > 0 {
                    render::print_error(&state, None);
                }
                render::print_cards(&presentation::cards(&state));
            });
        }
        Input::Select(name) => {
            if orchestrator.select(&name).await {
                if let Some(chart) = presentation::detail(&orchestrator.snapshot().await) {
                    render::print_detail(&chart);
                }
            } else {
                eprintln!("No weather loaded for '{name}'.");
            }
        }
        Input::Close => orchestrator.clear_selection().await,
        Input::List => {
            let state = orchestrator.snapshot().await;
            render::print_error(&state, None);
            render::print_cards(&presentation::cards(&state));
        }
        Input::Map => {
            let state = orchestrator.snapshot().await;
            render::print_map(&presentation::map_pins(state.records.all(), state.unit));
        }
        Input::Help => println!("{HELP}"),
        Input::Quit => return false,
        Input::Invalid(msg) => eprintln!("{msg}"),
    }

    true
}

fn log_join(done: Result<(), JoinError>) {
    if let Err(e) = done {
        tracing::error!(error = %e, "session task failed");
    }
}
