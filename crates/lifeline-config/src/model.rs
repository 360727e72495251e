// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Lifeline triage pipeline.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Lifeline configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LifelineConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Pipeline orchestration settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Event bus settings.
    #[serde(default)]
    pub bus: BusConfig,

    /// Transcription stage adapter settings.
    #[serde(default)]
    pub transcription: StageEndpointConfig,

    /// Triage stage adapter settings.
    #[serde(default)]
    pub triage: StageEndpointConfig,

    /// Emotion analysis stage adapter settings.
    #[serde(default)]
    pub emotion: StageEndpointConfig,

    /// Telephony provider credentials (reported in /health, never dialed).
    #[serde(default)]
    pub telephony: TelephonyConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Pipeline orchestration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Deadline for a single stage adapter invocation, in seconds.
    #[serde(default = "default_stage_timeout_secs")]
    pub stage_timeout_secs: u64,

    /// When a run is already in flight for a call: `true` cancels it at the
    /// next stage boundary and starts the new run; `false` rejects the new
    /// dispatch with AlreadyProcessing.
    #[serde(default = "default_supersede_in_flight")]
    pub supersede_in_flight: bool,

    /// How long completed/failed records are retained before the sweep
    /// removes them, in seconds.
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,

    /// Interval between retention sweeps, in seconds.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stage_timeout_secs: default_stage_timeout_secs(),
            supersede_in_flight: default_supersede_in_flight(),
            retention_secs: default_retention_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_stage_timeout_secs() -> u64 {
    30
}

fn default_supersede_in_flight() -> bool {
    true
}

fn default_retention_secs() -> u64 {
    3600
}

fn default_sweep_interval_secs() -> u64 {
    60
}

/// Event bus configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BusConfig {
    /// Bounded per-subscriber queue depth. A subscriber that falls further
    /// behind than this loses its oldest undelivered events.
    #[serde(default = "default_subscriber_capacity")]
    pub subscriber_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            subscriber_capacity: default_subscriber_capacity(),
        }
    }
}

fn default_subscriber_capacity() -> usize {
    256
}

/// Per-stage engine endpoint configuration.
///
/// An unset `endpoint` selects the stub adapter for that stage at startup;
/// the selection is logged and reported as `mock` in /health.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StageEndpointConfig {
    /// Base URL of the stage's backing engine. `None` selects the stub.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Bearer token sent to the engine, if it requires one.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl StageEndpointConfig {
    /// Whether a real engine is configured for this stage.
    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }
}

/// Telephony provider credentials.
///
/// Lifeline never calls the provider; these only drive the
/// `configured`/`missing` flag on the health endpoint.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelephonyConfig {
    #[serde(default)]
    pub account_sid: Option<String>,

    #[serde(default)]
    pub auth_token: Option<String>,
}

impl TelephonyConfig {
    /// Both credentials present.
    pub fn is_configured(&self) -> bool {
        self.account_sid.is_some() && self.auth_token.is_some()
    }
}
