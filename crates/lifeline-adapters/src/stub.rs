// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic stub adapters.
//!
//! Used whenever a stage's engine endpoint is not configured, so the whole
//! pipeline stays exercisable end to end without any external service. The
//! canned output is fixed and recognizable; stubs report as `mock` in the
//! health services map so dashboards can tell canned data from real output.

use std::collections::BTreeMap;

use async_trait::async_trait;

use lifeline_core::{
    AdapterReadiness, EmotionAdapter, LifelineError, StageAdapter, StageKind, TranscriptionAdapter,
    TriageAdapter, TriageReport,
};

const STUB_TRANSCRIPT: &str = "Hello, I need help. There has been a car accident on the highway \
and someone is injured. Please send an ambulance quickly.";

/// Stub speech-to-text: returns a fixed transcript for any recording.
#[derive(Debug, Default)]
pub struct StubTranscription;

impl StageAdapter for StubTranscription {
    fn name(&self) -> &str {
        "stub-transcription"
    }

    fn stage(&self) -> StageKind {
        StageKind::Transcribe
    }

    fn readiness(&self) -> AdapterReadiness {
        AdapterReadiness::Stub
    }
}

#[async_trait]
impl TranscriptionAdapter for StubTranscription {
    async fn transcribe(&self, _recording_url: &str) -> Result<String, LifelineError> {
        Ok(STUB_TRANSCRIPT.to_string())
    }
}

/// Stub triage: classifies everything as a high-priority medical emergency.
#[derive(Debug, Default)]
pub struct StubTriage;

impl StageAdapter for StubTriage {
    fn name(&self) -> &str {
        "stub-triage"
    }

    fn stage(&self) -> StageKind {
        StageKind::Triage
    }

    fn readiness(&self) -> AdapterReadiness {
        AdapterReadiness::Stub
    }
}

#[async_trait]
impl TriageAdapter for StubTriage {
    async fn triage(&self, _transcript: &str) -> Result<TriageReport, LifelineError> {
        Ok(TriageReport {
            emergency_type: "Medical".into(),
            priority: "High".into(),
            location: Some("123 Main St".into()),
            caller_name: Some("John Doe".into()),
            summary: "Caller reports a car accident with injuries".into(),
            recommended_actions: vec!["Dispatch ambulance".into(), "Notify hospital".into()],
        })
    }
}

/// Stub emotion analysis: a fixed high-distress profile.
#[derive(Debug, Default)]
pub struct StubEmotion;

impl StageAdapter for StubEmotion {
    fn name(&self) -> &str {
        "stub-emotion"
    }

    fn stage(&self) -> StageKind {
        StageKind::Emotion
    }

    fn readiness(&self) -> AdapterReadiness {
        AdapterReadiness::Stub
    }
}

#[async_trait]
impl EmotionAdapter for StubEmotion {
    async fn analyze(&self, _transcript: &str) -> Result<BTreeMap<String, f64>, LifelineError> {
        Ok([
            ("fear".to_string(), 0.7),
            ("distress".to_string(), 0.8),
            ("anxiety".to_string(), 0.6),
            ("calm".to_string(), 0.2),
        ]
        .into_iter()
        .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stubs_report_as_mock() {
        assert_eq!(StubTranscription.readiness(), AdapterReadiness::Stub);
        assert_eq!(StubTriage.readiness(), AdapterReadiness::Stub);
        assert_eq!(StubEmotion.readiness(), AdapterReadiness::Stub);
    }

    #[tokio::test]
    async fn stub_output_is_deterministic() {
        let first = StubTranscription.transcribe("https://a").await.unwrap();
        let second = StubTranscription.transcribe("https://b").await.unwrap();
        assert_eq!(first, second);

        let report = StubTriage.triage(&first).await.unwrap();
        assert_eq!(report.emergency_type, "Medical");
        assert_eq!(report.priority, "High");
        assert_eq!(
            report.recommended_actions,
            vec!["Dispatch ambulance", "Notify hospital"]
        );

        let emotions = StubEmotion.analyze(&first).await.unwrap();
        assert_eq!(emotions.get("distress"), Some(&0.8));
        assert_eq!(emotions.len(), 4);
    }
}
