//! Vigil Daemon - escalation & dispatch engine
//!
//! Loads config and the escalation policy ladder, wires the engine over
//! its collaborators, and runs the worker loop until interrupted.

use anyhow::Result;
use std::path::PathBuf;
use tracing::{info, Level};

use vigil_common::{EngineConfig, EscalationPolicy};
use vigild::engine::Engine;
use vigild::worker;

const DEFAULT_CONFIG: &str = "/etc/vigil/config.toml";

fn config_path() -> PathBuf {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            if let Some(path) = args.next() {
                return PathBuf::from(path);
            }
        }
    }
    PathBuf::from(DEFAULT_CONFIG)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("Vigil Daemon v{} starting", env!("CARGO_PKG_VERSION"));

    let config = EngineConfig::load(&config_path())?;
    let policy = match &config.policy_path {
        Some(path) => EscalationPolicy::load_or_default(path)?,
        None => EscalationPolicy::default(),
    };
    info!("escalation policy loaded: {} rungs", policy.len());

    let tick = config.worker.tick();
    let engine = Engine::in_memory(config, policy);

    let worker = tokio::spawn(worker::run_worker(
        engine.queue.clone(),
        engine.executor.clone(),
        tick,
    ));

    info!("Vigil Daemon ready");

    tokio::signal::ctrl_c().await?;
    info!("Shutting down gracefully");
    worker.abort();

    Ok(())
}
