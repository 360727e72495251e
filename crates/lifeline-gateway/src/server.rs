// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    routing::{get, post},
    Router,
};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;

use lifeline_bus::EventBus;
use lifeline_core::LifelineError;
use lifeline_pipeline::Orchestrator;
use lifeline_registry::CallRegistry;

use crate::handlers;
use crate::ws;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Pipeline orchestrator webhooks dispatch into.
    pub orchestrator: Arc<Orchestrator>,
    /// Call registry, read by the status endpoint.
    pub registry: Arc<CallRegistry>,
    /// Event bus the `/ws` fan-out subscribes to.
    pub bus: Arc<EventBus>,
    /// Stage name -> "ready" | "mock", fixed at startup adapter selection.
    pub services: Arc<BTreeMap<String, &'static str>>,
    /// Whether telephony credentials are configured (never dialed).
    pub telephony_configured: bool,
    /// Process start time for uptime reporting.
    pub start_time: Instant,
}

/// Builds the gateway router over the shared state.
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(handlers::get_root))
        .route("/health", get(handlers::get_health))
        .route("/twilio/call", post(handlers::post_call))
        .route("/twilio/recording", post(handlers::post_recording))
        .route("/twilio/response", post(handlers::post_response))
        .route("/calls/{call_sid}", get(handlers::get_call))
        .route("/ws", get(ws::ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Starts the gateway HTTP/WebSocket server and serves until `shutdown`
/// fires, then drains gracefully.
pub async fn start_server(
    host: &str,
    port: u16,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), LifelineError> {
    let app = build_router(state);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| LifelineError::Gateway {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| LifelineError::Gateway {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    Ok(())
}
