// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./lifeline.toml` > `~/.config/lifeline/lifeline.toml`
//! > `/etc/lifeline/lifeline.toml` with environment variable overrides via
//! `LIFELINE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::LifelineConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/lifeline/lifeline.toml` (system-wide)
/// 3. `~/.config/lifeline/lifeline.toml` (user XDG config)
/// 4. `./lifeline.toml` (local directory)
/// 5. `LIFELINE_*` environment variables
pub fn load_config() -> Result<LifelineConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LifelineConfig::default()))
        .merge(Toml::file("/etc/lifeline/lifeline.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("lifeline/lifeline.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("lifeline.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<LifelineConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LifelineConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<LifelineConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LifelineConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The config sections an env var key may address. Must match the fields of
/// [`LifelineConfig`].
const SECTIONS: [&str; 7] = [
    "server",
    "pipeline",
    "bus",
    "transcription",
    "triage",
    "emotion",
    "telephony",
];

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `LIFELINE_PIPELINE_STAGE_TIMEOUT_SECS`
/// must map to `pipeline.stage_timeout_secs`, not `pipeline.stage.timeout.secs`.
fn env_provider() -> Env {
    Env::prefixed("LIFELINE_").map(|key| map_env_key(key.as_str()).into())
}

/// Maps a prefix-stripped env var key onto its `section.field` config path.
///
/// Only the leading section name is rewritten, and exactly once, so a field
/// name that happens to contain a section name (now or after a future
/// rename) can never be split a second time. Keys that address no known
/// section pass through unchanged and surface as unknown-key diagnostics.
fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(field) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{field}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_section_dot_field() {
        assert_eq!(map_env_key("server_port"), "server.port");
        assert_eq!(map_env_key("server_log_level"), "server.log_level");
        assert_eq!(
            map_env_key("pipeline_stage_timeout_secs"),
            "pipeline.stage_timeout_secs"
        );
        assert_eq!(
            map_env_key("bus_subscriber_capacity"),
            "bus.subscriber_capacity"
        );
        assert_eq!(map_env_key("transcription_endpoint"), "transcription.endpoint");
        assert_eq!(map_env_key("triage_api_key"), "triage.api_key");
        assert_eq!(map_env_key("telephony_account_sid"), "telephony.account_sid");
    }

    #[test]
    fn only_the_leading_section_is_rewritten() {
        // A field containing another section's name splits exactly once.
        assert_eq!(map_env_key("pipeline_bus_limit"), "pipeline.bus_limit");
        assert_eq!(
            map_env_key("server_triage_banner"),
            "server.triage_banner"
        );
    }

    #[test]
    fn unknown_sections_pass_through_unchanged() {
        assert_eq!(map_env_key("unknown_key"), "unknown_key");
        assert_eq!(map_env_key("server"), "server");
    }
}
