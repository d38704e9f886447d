//! Augmented sandbox master entry point.
//!
//! Loads the configuration, starts the control plane on the Tokio runtime and
//! runs the simulation loop on a dedicated blocking thread.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config()            -- TOML file or defaults
//!  └─ command_channel() / frame_channel()
//!  └─ start services
//!       ├─ ControlPlaneService  (Tokio tasks: accept loops + frame publisher)
//!       ├─ SimulationLoop       (spawn_blocking thread, owns the registry)
//!       └─ Ctrl-C handler       (clears the shared `running` flag)
//! ```
//!
//! # Usage
//!
//! ```text
//! sandbox-master [OPTIONS]
//!
//! Options:
//!   --config <PATH>        Config file [env: SANDBOX_CONFIG]
//!   --log-level <LEVEL>    Overrides [master] log_level [env: SANDBOX_LOG_LEVEL]
//! ```
//!
//! `RUST_LOG` takes precedence over both log-level settings.

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use sandbox_core::Frame;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use sandbox_master::application::simulation_loop::SimulationLoop;
use sandbox_master::infrastructure::channel::{command_channel, frame_channel};
use sandbox_master::infrastructure::engine::HeightMapEngine;
use sandbox_master::infrastructure::network::{ControlPlaneConfig, ControlPlaneService};
use sandbox_master::infrastructure::storage::config::load_config;

/// Augmented sandbox coordinator.
#[derive(Debug, Parser)]
#[command(
    name = "sandbox-master",
    about = "Coordinates kinects, beamers and the simulation loop of an augmented sandbox",
    version
)]
struct Cli {
    /// Path to the TOML configuration file.
    ///
    /// Defaults to `config.toml` in the platform config directory.  A missing
    /// file means built-in defaults.
    #[arg(long, env = "SANDBOX_CONFIG")]
    config: Option<PathBuf>,

    /// `tracing` level filter, e.g. `info` or `sandbox_master=debug`.
    #[arg(long, env = "SANDBOX_LOG_LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref()).context("failed to load configuration")?;

    let log_level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.master.log_level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)),
        )
        .init();

    info!("Augmented sandbox master starting");

    // Shutdown flag shared by the control plane and the simulation loop.
    let running = Arc::new(AtomicBool::new(true));

    let (command_tx, command_rx) = command_channel();
    let (frame_tx, frame_rx) = frame_channel();

    // ── Control plane ─────────────────────────────────────────────────────────
    let control_config = ControlPlaneConfig {
        control_addr: config.network.control_addr()?,
        frame_addr: config.network.frame_addr()?,
    };
    let control_plane = tokio::spawn(
        ControlPlaneService::new(control_config, command_tx, frame_rx).run(Arc::clone(&running)),
    );

    // ── Ctrl-C / SIGTERM handler ──────────────────────────────────────────────
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            running_clone.store(false, Ordering::Relaxed);
        }
    });

    // ── Simulation loop ───────────────────────────────────────────────────────
    let (width, height) = config.resolution();
    let frame = Frame::new(width, height).context("invalid screen resolution")?;
    let engine = HeightMapEngine::new(width, height);
    let initial = config.calibration_state();
    let poll_interval = config.poll_interval();
    let loop_running = Arc::clone(&running);

    let simulation = tokio::task::spawn_blocking(move || {
        let mut sim = SimulationLoop::new(engine, initial, frame, command_rx, frame_tx)
            .with_poll_interval(poll_interval);
        sim.run(&loop_running)
    });

    info!("Augmented sandbox master ready.  Press Ctrl-C to exit.");

    let loop_result = simulation.await.context("simulation loop panicked")?;
    running.store(false, Ordering::Relaxed);

    control_plane
        .await
        .context("control plane panicked")?
        .context("control plane failed")?;

    if let Err(e) = loop_result {
        warn!("simulation loop ended early: {e}");
        return Err(e).context("simulation loop terminated");
    }

    info!("Augmented sandbox master stopped");
    Ok(())
}
