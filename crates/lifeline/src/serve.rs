// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `lifeline serve` command implementation.
//!
//! Wires the call registry, event bus, stage adapters, and orchestrator
//! together, spawns the retention sweep, and runs the gateway until a
//! shutdown signal arrives.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use lifeline_adapters::{build_adapters, readiness_map};
use lifeline_bus::EventBus;
use lifeline_config::model::LifelineConfig;
use lifeline_core::LifelineError;
use lifeline_gateway::{start_server, GatewayState};
use lifeline_pipeline::{Orchestrator, OrchestratorOptions};
use lifeline_registry::CallRegistry;

use crate::shutdown;

/// Runs the `lifeline serve` command.
pub async fn run_serve(config: LifelineConfig) -> Result<(), LifelineError> {
    init_tracing(&config.server.log_level);

    info!("starting lifeline serve");

    // Select stage adapters once; unconfigured stages fall back to stubs
    // and report as "mock" in /health.
    let adapters = build_adapters(&config)?;
    let services: BTreeMap<String, &'static str> = readiness_map(&adapters)
        .into_iter()
        .map(|(service, readiness)| (service.to_string(), readiness))
        .collect();

    let registry = Arc::new(CallRegistry::new());
    let bus = Arc::new(EventBus::with_capacity(config.bus.subscriber_capacity));

    let orchestrator = Arc::new(Orchestrator::new(
        Arc::clone(&registry),
        Arc::clone(&bus),
        adapters,
        OrchestratorOptions {
            stage_timeout: Duration::from_secs(config.pipeline.stage_timeout_secs),
            supersede_in_flight: config.pipeline.supersede_in_flight,
        },
    ));
    info!(
        stage_timeout_secs = config.pipeline.stage_timeout_secs,
        supersede_in_flight = config.pipeline.supersede_in_flight,
        "pipeline orchestrator initialized"
    );

    // Install signal handler.
    let cancel = shutdown::install_signal_handler();

    // Spawn the retention sweep background task.
    spawn_retention_sweep(
        Arc::clone(&registry),
        config.pipeline.retention_secs,
        config.pipeline.sweep_interval_secs,
        cancel.clone(),
    );

    let state = GatewayState {
        orchestrator,
        registry,
        bus,
        services: Arc::new(services),
        telephony_configured: config.telephony.is_configured(),
        start_time: Instant::now(),
    };

    start_server(&config.server.host, config.server.port, state, cancel).await?;

    info!("lifeline serve shutdown complete");
    Ok(())
}

/// Periodically removes terminal call records older than the retention
/// window.
fn spawn_retention_sweep(
    registry: Arc<CallRegistry>,
    retention_secs: u64,
    sweep_interval_secs: u64,
    cancel: CancellationToken,
) {
    let retention = chrono::Duration::seconds(retention_secs as i64);

    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(Duration::from_secs(sweep_interval_secs));
        // Skip the first immediate tick.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let removed = registry.sweep_terminal(retention);
                    if removed > 0 {
                        info!(removed, tracked = registry.len(), "retention sweep");
                    } else {
                        debug!(tracked = registry.len(), "retention sweep found nothing to remove");
                    }
                }
                _ = cancel.cancelled() => {
                    info!("retention sweep shutting down");
                    break;
                }
            }
        }
    });

    info!(
        retention_secs,
        sweep_interval_secs, "retention sweep started"
    );
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("lifeline={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
