//! CLI interface for Helpline.
//!
//! With no subcommand, Helpline opens the TUI. Subcommands are
//! non-interactive apart from the permission question, which is asked
//! on the terminal when the policy is `ask`.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;

use crate::config::Config;
use crate::location::flow::{FlowState, PERMISSION_DENIED_NOTICE};
use crate::location::{LocationTracker, PermissionPrompt, PermissionStatus};
use crate::map::{MapRenderer, TextFormat, TextMap};
use crate::navigator::Route;

/// Helpline: post a help request and share where you are.
#[derive(Debug, Parser)]
#[command(name = "helpline", version)]
pub struct Cli {
    /// Config file to use instead of `~/.helpline/config.toml`.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Screen to open the TUI on, overriding `initial-route`.
    #[arg(long, value_parser = parse_route)]
    pub route: Option<Route>,

    /// Log at debug level (`RUST_LOG` overrides).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the current position once and exit.
    ///
    /// Runs the same permission-then-fetch flow as the map screen.
    /// Exits non-zero when permission is denied or no fix arrives in time.
    Locate {
        /// Print the map view as JSON.
        #[arg(long)]
        json: bool,
    },
}

/// Run a subcommand, returning an error message on failure.
pub fn run(command: Command, config: &Config, runtime: &Runtime) -> Result<(), String> {
    match command {
        Command::Locate { json } => {
            let format = if json {
                TextFormat::Json
            } else {
                TextFormat::Plain
            };
            locate(config, runtime, format, io::stdout().lock()).map(drop)
        }
    }
}

/// Acquire one fix and write its map view to `out`.
fn locate<W: Write>(
    config: &Config,
    runtime: &Runtime,
    format: TextFormat,
    out: W,
) -> Result<W, String> {
    let (prompt_tx, prompts) = mpsc::unbounded_channel();
    let provider = config
        .location
        .provider(Some(prompt_tx))
        .map_err(|e| e.to_string())?;
    runtime.spawn(answer_prompts(prompts));

    let mut tracker = LocationTracker::new(
        provider,
        runtime.handle().clone(),
        config.location.timeout(),
    );
    tracker.start();
    runtime.block_on(tracker.settle());

    match tracker.state() {
        FlowState::Ready { .. } => {}
        FlowState::PermissionDenied => return Err(PERMISSION_DENIED_NOTICE.to_string()),
        FlowState::Unavailable(e) => return Err(format!("location unavailable: {e}")),
        state => return Err(format!("location flow stopped early: {state:?}")),
    }

    let view = tracker
        .flow()
        .map_view(config.map.latitude_delta, config.map.longitude_delta)
        .ok_or("no position to show")?;
    let mut map = TextMap::new(out, format);
    map.show(&view)
        .map_err(|e| format!("failed to write map view: {e}"))?;
    Ok(map.into_inner())
}

/// Answer permission prompts on the terminal.
async fn answer_prompts(mut prompts: mpsc::UnboundedReceiver<PermissionPrompt>) {
    while let Some(prompt) = prompts.recv().await {
        let status = tokio::task::spawn_blocking(ask_on_terminal)
            .await
            .unwrap_or(PermissionStatus::Denied);
        prompt.answer(status);
    }
}

fn ask_on_terminal() -> PermissionStatus {
    eprint!("Allow Helpline to access this device's location? [y/N] ");
    let mut answer = String::new();
    match io::stdin().read_line(&mut answer) {
        Ok(_) => parse_answer(&answer),
        Err(_) => PermissionStatus::Denied,
    }
}

fn parse_route(name: &str) -> Result<Route, String> {
    Route::from_name(name).ok_or_else(|| {
        let names: Vec<_> = Route::ALL.iter().map(|r| r.name()).collect();
        format!("unknown route `{name}` (expected one of: {})", names.join(", "))
    })
}

fn parse_answer(answer: &str) -> PermissionStatus {
    match answer.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => PermissionStatus::Granted,
        _ => PermissionStatus::Denied,
    }
}
