//! # Console Replay
//!
//! Replays a recorded action log through the console store and prints the
//! resulting device slice and gateway overview props.
//!
//! ## Usage
//! ```text
//! console-replay [--config console.toml] [--log debug] \
//!                [--collaborators shared|gateway-scoped] actions.jsonl
//! ```
//!
//! Each non-blank line of the log is one action envelope:
//! ```text
//! {"type":"GET_GTW","payload":{"id":"gtw-1"}}
//! {"type":"GET_API_KEYS_LIST_SUCCESS","payload":{"parentType":"gateway","id":"gtw-1","totalCount":2}}
//! ```
//!
//! Fetch intents are logged at `info` on stderr; stdout carries only the
//! JSON report.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use console_core::devices::DevicesView;
use console_store::{
    CollaboratorSource, ConsoleConfig, GatewayOverviewBinding, GatewayOverviewProps, Store,
};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "console-replay",
    version,
    about = "Replay console actions and print the resulting state"
)]
struct Cli {
    /// Config file (defaults to CONSOLE_CONFIG, then the platform config dir).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log filter, overriding RUST_LOG and the configured filter.
    #[arg(long)]
    log: Option<String>,

    /// Collaborator endpoint the gateway overview reads.
    #[arg(long)]
    collaborators: Option<CollaboratorSource>,

    /// JSON-lines file of action envelopes.
    actions: PathBuf,
}

/// Printed to stdout after the replay.
#[derive(Serialize)]
struct Report<'a> {
    devices: DevicesView<'a>,
    overview: &'a GatewayOverviewProps,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConsoleConfig::load(cli.config.clone()).context("loading console config")?;
    init_tracing(cli.log.as_deref(), &config.logging.filter)?;

    let store = Store::from_config(&config)?;
    let source = cli.collaborators.unwrap_or(config.collaborator_source());
    let binding = GatewayOverviewBinding::new(source);
    info!(source = %binding.source(), actions = ?cli.actions, "Replaying action log");

    let mut intents = store.subscribe_intents();
    let intent_logger = tokio::spawn(async move {
        loop {
            match intents.recv().await {
                Ok(intent) => info!(intent = %intent.type_name(), ?intent, "Fetch intent"),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Intent logger lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let file = File::open(&cli.actions)
        .with_context(|| format!("opening action log {}", cli.actions.display()))?;
    let dispatched = replay(&store, &binding, BufReader::new(file))?;
    debug!(dispatched, "Replay finished");

    let state = store.state();
    let overview = binding.props(&state);
    let report = Report {
        devices: DevicesView::from(state.devices.as_ref()),
        overview: &overview,
    };

    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &report)?;
    writeln!(stdout)?;

    drop(store);
    intent_logger.await?;

    Ok(())
}

/// Dispatches every envelope in `input`, giving the binding a chance to
/// initialize after each one. Returns the number of envelopes dispatched.
fn replay(store: &Store, binding: &GatewayOverviewBinding, input: impl BufRead) -> Result<usize> {
    let mut dispatched = 0;

    for (index, line) in input.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        store
            .dispatch_json(&line)
            .with_context(|| format!("line {}", index + 1))?;
        dispatched += 1;

        binding.init(store, &store.state());
    }

    Ok(dispatched)
}

/// Initializes tracing on stderr.
///
/// Precedence: `--log`, then `RUST_LOG`, then the configured filter.
fn init_tracing(cli_filter: Option<&str>, config_filter: &str) -> Result<()> {
    let filter = match cli_filter {
        Some(directives) => EnvFilter::try_new(directives).context("parsing --log filter")?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config_filter)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    Ok(())
}
