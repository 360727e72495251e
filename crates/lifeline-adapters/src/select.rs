// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-time adapter selection at startup.
//!
//! Each stage independently gets its HTTP adapter when an engine endpoint is
//! configured, and the deterministic stub otherwise. The choice is logged
//! per stage and never revisited at runtime; the health endpoint surfaces it
//! through each adapter's readiness.

use std::sync::Arc;

use tracing::info;

use lifeline_config::model::{LifelineConfig, StageEndpointConfig};
use lifeline_core::{LifelineError, StageAdapter};
use lifeline_pipeline::StageAdapters;

use crate::http::{HttpEmotion, HttpTranscription, HttpTriage};
use crate::stub::{StubEmotion, StubTranscription, StubTriage};

fn log_selection(adapter: &dyn StageAdapter) {
    info!(
        stage = %adapter.stage(),
        adapter = adapter.name(),
        readiness = adapter.readiness().as_str(),
        "stage adapter selected"
    );
}

fn endpoint_of(config: &StageEndpointConfig) -> Option<(&str, Option<&str>)> {
    config
        .endpoint
        .as_deref()
        .map(|endpoint| (endpoint, config.api_key.as_deref()))
}

/// Builds the three stage adapters from configuration.
pub fn build_adapters(config: &LifelineConfig) -> Result<StageAdapters, LifelineError> {
    let transcription: Arc<dyn lifeline_core::TranscriptionAdapter> =
        match endpoint_of(&config.transcription) {
            Some((endpoint, api_key)) => {
                Arc::new(HttpTranscription::new(endpoint.to_string(), api_key)?)
            }
            None => Arc::new(StubTranscription),
        };
    log_selection(transcription.as_ref());

    let triage: Arc<dyn lifeline_core::TriageAdapter> = match endpoint_of(&config.triage) {
        Some((endpoint, api_key)) => Arc::new(HttpTriage::new(endpoint.to_string(), api_key)?),
        None => Arc::new(StubTriage),
    };
    log_selection(triage.as_ref());

    let emotion: Arc<dyn lifeline_core::EmotionAdapter> = match endpoint_of(&config.emotion) {
        Some((endpoint, api_key)) => Arc::new(HttpEmotion::new(endpoint.to_string(), api_key)?),
        None => Arc::new(StubEmotion),
    };
    log_selection(emotion.as_ref());

    Ok(StageAdapters {
        transcription,
        triage,
        emotion,
    })
}

/// Convenience used by the health endpoint wiring: service name paired with
/// the selected adapter's readiness string.
pub fn readiness_map(adapters: &StageAdapters) -> Vec<(&'static str, &'static str)> {
    vec![
        ("transcription", adapters.transcription.readiness().as_str()),
        ("triage", adapters.triage.readiness().as_str()),
        ("emotion", adapters.emotion.readiness().as_str()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifeline_core::AdapterReadiness;

    #[test]
    fn unconfigured_stages_fall_back_to_stubs() {
        let config = LifelineConfig::default();
        let adapters = build_adapters(&config).unwrap();
        assert_eq!(adapters.transcription.readiness(), AdapterReadiness::Stub);
        assert_eq!(adapters.triage.readiness(), AdapterReadiness::Stub);
        assert_eq!(adapters.emotion.readiness(), AdapterReadiness::Stub);
    }

    #[test]
    fn configured_stages_use_the_http_adapter() {
        let mut config = LifelineConfig::default();
        config.triage.endpoint = Some("https://triage.example.com/classify".into());
        config.triage.api_key = Some("key".into());

        let adapters = build_adapters(&config).unwrap();
        assert_eq!(adapters.triage.readiness(), AdapterReadiness::Ready);
        assert_eq!(adapters.triage.name(), "http-triage");
        // Stages are selected independently.
        assert_eq!(adapters.transcription.readiness(), AdapterReadiness::Stub);
        assert_eq!(adapters.emotion.readiness(), AdapterReadiness::Stub);
    }

    #[test]
    fn readiness_map_covers_every_stage() {
        let adapters = build_adapters(&LifelineConfig::default()).unwrap();
        let map = readiness_map(&adapters);
        assert_eq!(map.len(), 3);
        assert!(map.iter().all(|(_, readiness)| *readiness == "mock"));
    }
}
