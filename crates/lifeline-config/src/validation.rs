// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as bind addresses, timeout bounds, and endpoint URLs.

use crate::diagnostic::ConfigError;
use crate::model::{LifelineConfig, StageEndpointConfig};

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &LifelineConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // Validate host is not empty and looks like a valid IP or hostname.
    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!(
                    "server.host `{host}` is not a valid IP address or hostname"
                ),
            });
        }
    }

    if config.pipeline.stage_timeout_secs < 1 {
        errors.push(ConfigError::Validation {
            message: format!(
                "pipeline.stage_timeout_secs must be at least 1, got {}",
                config.pipeline.stage_timeout_secs
            ),
        });
    }

    if config.pipeline.sweep_interval_secs < 1 {
        errors.push(ConfigError::Validation {
            message: format!(
                "pipeline.sweep_interval_secs must be at least 1, got {}",
                config.pipeline.sweep_interval_secs
            ),
        });
    }

    if config.pipeline.retention_secs < config.pipeline.sweep_interval_secs {
        errors.push(ConfigError::Validation {
            message: format!(
                "pipeline.retention_secs ({}) must be at least pipeline.sweep_interval_secs ({})",
                config.pipeline.retention_secs, config.pipeline.sweep_interval_secs
            ),
        });
    }

    if config.bus.subscriber_capacity < 8 {
        errors.push(ConfigError::Validation {
            message: format!(
                "bus.subscriber_capacity must be at least 8, got {}",
                config.bus.subscriber_capacity
            ),
        });
    }

    validate_endpoint(&config.transcription, "transcription", &mut errors);
    validate_endpoint(&config.triage, "triage", &mut errors);
    validate_endpoint(&config.emotion, "emotion", &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Stage endpoints, when set, must parse as http(s) URLs.
fn validate_endpoint(
    stage: &StageEndpointConfig,
    section: &str,
    errors: &mut Vec<ConfigError>,
) {
    let Some(ref endpoint) = stage.endpoint else {
        return;
    };

    match url::Url::parse(endpoint) {
        Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => {}
        Ok(parsed) => errors.push(ConfigError::Validation {
            message: format!(
                "{section}.endpoint must be an http(s) URL, got scheme `{}`",
                parsed.scheme()
            ),
        }),
        Err(e) => errors.push(ConfigError::Validation {
            message: format!("{section}.endpoint `{endpoint}` is not a valid URL: {e}"),
        }),
    }
}
