//! # homecircuit-cli — interactive circuit shell
//!
//! Composition root that wires the engine, event bus, and JSON storage
//! together behind a line-oriented shell.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Construct the snapshot store adapter and the in-process event bus
//! - Construct the engine, injecting the bus via its port trait
//! - Restore the persisted installation, if any
//! - Log engine events and drive the read-eval-print loop
//! - Persist the installation on exit (quit, EOF, or Ctrl-C)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod commands;
mod config;

use std::error::Error as _;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

use homecircuit_adapter_storage_json::JsonSnapshotStore;
use homecircuit_app::engine::CircuitEngine;
use homecircuit_app::event_bus::InProcessEventBus;
use homecircuit_app::ports::SnapshotStore;
use homecircuit_domain::error::CircuitError;

use crate::commands::Command;
use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    let store = JsonSnapshotStore::new(&config.storage.path);
    let bus = Arc::new(InProcessEventBus::new(config.events.bus_capacity));
    let engine = CircuitEngine::new(Arc::clone(&bus), config.engine_config());

    if let Some(snapshot) = store.load().await? {
        engine.load_snapshot(&snapshot).await?;
        tracing::info!(path = %store.path().display(), "installation restored");
    }

    spawn_event_logger(bus.subscribe());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("homecircuit ready — type 'help' for commands");
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match Command::parse(line) {
                    Ok(Command::Quit) => break,
                    Ok(command) => match commands::execute(&engine, &store, command).await {
                        Ok(report) => println!("{report}"),
                        Err(error) => println!("error: {}", render(&error)),
                    },
                    Err(error) => println!("error: {error}"),
                }
            }
        }
    }

    store.save(&engine.snapshot().await).await?;
    tracing::info!(path = %store.path().display(), "installation saved");
    Ok(())
}

fn spawn_event_logger(mut events: broadcast::Receiver<homecircuit_domain::event::Event>) {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => tracing::info!(event = ?event.data, "engine event"),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "event subscriber lagging");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

/// Render the full error chain on one line.
fn render(error: &CircuitError) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
