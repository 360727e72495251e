// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pre-wired registry + bus + orchestrator over the mock adapters.

use std::sync::Arc;
use std::time::Duration;

use lifeline_bus::{BusSubscription, EventBus};
use lifeline_pipeline::{Orchestrator, OrchestratorOptions, StageAdapters};
use lifeline_registry::CallRegistry;

use crate::mock_adapters::{MockEmotion, MockTranscription, MockTriage};

/// Everything a pipeline-level test needs, wired together.
pub struct TestHarness {
    pub registry: Arc<CallRegistry>,
    pub bus: Arc<EventBus>,
    pub orchestrator: Arc<Orchestrator>,
    pub transcription: Arc<MockTranscription>,
    pub triage: Arc<MockTriage>,
    pub emotion: Arc<MockEmotion>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_options(OrchestratorOptions::default())
    }

    pub fn with_options(options: OrchestratorOptions) -> Self {
        let registry = Arc::new(CallRegistry::new());
        let bus = Arc::new(EventBus::new());
        let transcription = MockTranscription::new();
        let triage = MockTriage::new();
        let emotion = MockEmotion::new();

        let orchestrator = Arc::new(Orchestrator::new(
            Arc::clone(&registry),
            Arc::clone(&bus),
            StageAdapters {
                transcription: transcription.clone(),
                triage: triage.clone(),
                emotion: emotion.clone(),
            },
            options,
        ));

        Self {
            registry,
            bus,
            orchestrator,
            transcription,
            triage,
            emotion,
        }
    }

    /// Waits until no run is in flight for the call.
    pub async fn wait_until_idle(&self, call_id: &str) {
        while self.orchestrator.is_inflight(call_id) {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Receives the next `n` frames from a subscription, parsed as JSON.
/// Panics if a frame does not arrive within five seconds.
pub async fn collect_frames(
    subscription: &mut BusSubscription,
    n: usize,
) -> Vec<serde_json::Value> {
    let mut frames = Vec::with_capacity(n);
    for _ in 0..n {
        let frame = tokio::time::timeout(Duration::from_secs(5), subscription.recv())
            .await
            .expect("timed out waiting for a bus frame")
            .expect("bus closed while waiting for a frame");
        frames.push(serde_json::from_str(&frame).expect("bus frame is not valid JSON"));
    }
    frames
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifeline_core::{BusChannel, CallStatus, PipelineInput};

    #[tokio::test]
    async fn harness_runs_a_full_pipeline_with_defaults() {
        let harness = TestHarness::new();
        let mut responses = harness.bus.subscribe(BusChannel::Responses);

        harness
            .orchestrator
            .dispatch(
                "c1",
                PipelineInput::Recording {
                    recording_sid: "RE1".into(),
                    recording_url: "https://example.com/rec".into(),
                },
            )
            .await
            .unwrap();

        let frames = collect_frames(&mut responses, 2).await;
        assert_eq!(frames[0]["event"], "triage_ready");
        assert_eq!(frames[1]["event"], "emotion_ready");

        harness.wait_until_idle("c1").await;
        let record = harness.registry.get("c1").await.unwrap();
        assert_eq!(record.status, CallStatus::Completed);
    }
}
