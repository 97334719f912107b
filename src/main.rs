//! Flight Handoff Core - server entry point
//!
//! ```text
//! ┌──────────┐    ┌─────────────┐    ┌─────────────┐    ┌──────────┐
//! │  Config  │───▶│ FlightStore │───▶│ Coordinator │───▶│ Gateway  │
//! │  (YAML)  │    │ (snapshot)  │    │   (mutex)   │    │ (HTTP/WS)│
//! └──────────┘    └─────────────┘    └──────┬──────┘    └──────────┘
//!                                           │
//!                                           ▼
//!                                    ┌─────────────┐
//!                                    │ MirrorSync  │
//!                                    │  (worker)   │
//!                                    └─────────────┘
//! ```

use std::sync::Arc;

use anyhow::Context;

use flight_handoff::config::{AppConfig, MirrorBackend};
use flight_handoff::mirror::{MemoryMirror, MirrorStore, MirrorSync, TinyWebDbMirror};
use flight_handoff::{FlightError, FlightStore, HandoffCoordinator};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

fn build_mirror(config: &AppConfig) -> anyhow::Result<Arc<dyn MirrorStore>> {
    Ok(match config.mirror.backend {
        MirrorBackend::Memory => Arc::new(MemoryMirror::new()),
        MirrorBackend::Tinywebdb => Arc::new(
            TinyWebDbMirror::new(&config.mirror).context("Failed to create TinyWebDB client")?,
        ),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let app_config = AppConfig::load(&env)?;
    let _log_guard = flight_handoff::logging::init_logging(&app_config);

    tracing::info!("Starting Flight Handoff Core in {} mode", env);

    let store = match FlightStore::open(&app_config.store.snapshot_path) {
        Ok(store) => store,
        Err(e @ FlightError::CorruptSnapshot { .. }) => {
            tracing::error!(error = %e, "Refusing to start on a corrupt snapshot");
            return Err(e.into());
        }
        Err(e) => return Err(e).context("Failed to open flight store"),
    };
    tracing::info!(
        flights = store.len(),
        path = %store.snapshot_path().display(),
        "Flight store ready"
    );

    let mirror = MirrorSync::spawn(build_mirror(&app_config)?, &app_config.mirror);
    let coordinator = Arc::new(HandoffCoordinator::new(store, mirror));

    let port = get_port_override().unwrap_or(app_config.gateway.port);
    flight_handoff::gateway::run_server(&app_config.gateway.host, port, coordinator)
        .await
        .context("Gateway stopped")?;

    Ok(())
}
