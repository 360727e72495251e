// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock stage adapters with scripted results.
//!
//! Results are popped from a FIFO queue. When the queue is empty, a fixed
//! default is returned, so a test only scripts what it cares about.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use lifeline_core::{
    AdapterReadiness, EmotionAdapter, LifelineError, StageAdapter, StageKind, TranscriptionAdapter,
    TriageAdapter, TriageReport,
};

/// One scripted outcome: a value or a failure message.
enum Scripted<T> {
    Ok(T),
    Fail(String),
}

struct Script<T> {
    queue: Mutex<VecDeque<Scripted<T>>>,
    invocations: AtomicUsize,
    delay: Mutex<Duration>,
}

impl<T> Script<T> {
    fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            invocations: AtomicUsize::new(0),
            delay: Mutex::new(Duration::ZERO),
        }
    }

    async fn push_ok(&self, value: T) {
        self.queue.lock().await.push_back(Scripted::Ok(value));
    }

    async fn push_fail(&self, message: impl Into<String>) {
        self.queue
            .lock()
            .await
            .push_back(Scripted::Fail(message.into()));
    }

    async fn set_delay(&self, delay: Duration) {
        *self.delay.lock().await = delay;
    }

    /// Pops the next scripted outcome, applying the configured delay.
    async fn next(&self, stage: StageKind, default: impl FnOnce() -> T) -> Result<T, LifelineError> {
        self.invocations.fetch_add(1, Ordering::Relaxed);

        let delay = *self.delay.lock().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match self.queue.lock().await.pop_front() {
            Some(Scripted::Ok(value)) => Ok(value),
            Some(Scripted::Fail(message)) => Err(LifelineError::AdapterInvocation {
                stage,
                message,
                source: None,
            }),
            None => Ok(default()),
        }
    }
}

/// Mock speech-to-text adapter.
pub struct MockTranscription {
    script: Script<String>,
}

impl MockTranscription {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            script: Script::new(),
        })
    }

    /// Queues a transcript to return on a future invocation.
    pub async fn queue_transcript(&self, text: impl Into<String>) {
        self.script.push_ok(text.into()).await;
    }

    /// Queues a failure for a future invocation.
    pub async fn queue_failure(&self, message: impl Into<String>) {
        self.script.push_fail(message).await;
    }

    /// Adds latency to every subsequent invocation.
    pub async fn set_delay(&self, delay: Duration) {
        self.script.set_delay(delay).await;
    }

    pub fn invocations(&self) -> usize {
        self.script.invocations.load(Ordering::Relaxed)
    }
}

impl StageAdapter for MockTranscription {
    fn name(&self) -> &str {
        "mock-transcription"
    }

    fn stage(&self) -> StageKind {
        StageKind::Transcribe
    }

    fn readiness(&self) -> AdapterReadiness {
        AdapterReadiness::Stub
    }
}

#[async_trait]
impl TranscriptionAdapter for MockTranscription {
    async fn transcribe(&self, _recording_url: &str) -> Result<String, LifelineError> {
        self.script
            .next(StageKind::Transcribe, || "mock transcript".to_string())
            .await
    }
}

/// Mock triage adapter.
pub struct MockTriage {
    script: Script<TriageReport>,
}

/// The report returned when nothing is scripted.
pub fn default_report() -> TriageReport {
    TriageReport {
        emergency_type: "Medical".into(),
        priority: "High".into(),
        location: Some("123 Main St".into()),
        caller_name: Some("John Doe".into()),
        summary: "Caller reports a medical emergency".into(),
        recommended_actions: vec!["Dispatch ambulance".into(), "Notify hospital".into()],
    }
}

impl MockTriage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            script: Script::new(),
        })
    }

    pub async fn queue_report(&self, report: TriageReport) {
        self.script.push_ok(report).await;
    }

    pub async fn queue_failure(&self, message: impl Into<String>) {
        self.script.push_fail(message).await;
    }

    pub async fn set_delay(&self, delay: Duration) {
        self.script.set_delay(delay).await;
    }

    pub fn invocations(&self) -> usize {
        self.script.invocations.load(Ordering::Relaxed)
    }
}

impl StageAdapter for MockTriage {
    fn name(&self) -> &str {
        "mock-triage"
    }

    fn stage(&self) -> StageKind {
        StageKind::Triage
    }

    fn readiness(&self) -> AdapterReadiness {
        AdapterReadiness::Stub
    }
}

#[async_trait]
impl TriageAdapter for MockTriage {
    async fn triage(&self, _transcript: &str) -> Result<TriageReport, LifelineError> {
        self.script.next(StageKind::Triage, default_report).await
    }
}

/// Mock emotion analysis adapter.
pub struct MockEmotion {
    script: Script<BTreeMap<String, f64>>,
}

/// The emotion profile returned when nothing is scripted.
pub fn default_emotions() -> BTreeMap<String, f64> {
    [
        ("fear".to_string(), 0.7),
        ("distress".to_string(), 0.8),
        ("anxiety".to_string(), 0.6),
        ("calm".to_string(), 0.2),
    ]
    .into_iter()
    .collect()
}

impl MockEmotion {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            script: Script::new(),
        })
    }

    pub async fn queue_emotions(&self, emotions: BTreeMap<String, f64>) {
        self.script.push_ok(emotions).await;
    }

    pub async fn queue_failure(&self, message: impl Into<String>) {
        self.script.push_fail(message).await;
    }

    pub async fn set_delay(&self, delay: Duration) {
        self.script.set_delay(delay).await;
    }

    pub fn invocations(&self) -> usize {
        self.script.invocations.load(Ordering::Relaxed)
    }
}

impl StageAdapter for MockEmotion {
    fn name(&self) -> &str {
        "mock-emotion"
    }

    fn stage(&self) -> StageKind {
        StageKind::Emotion
    }

    fn readiness(&self) -> AdapterReadiness {
        AdapterReadiness::Stub
    }
}

#[async_trait]
impl EmotionAdapter for MockEmotion {
    async fn analyze(&self, _transcript: &str) -> Result<BTreeMap<String, f64>, LifelineError> {
        self.script.next(StageKind::Emotion, default_emotions).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn defaults_when_nothing_is_scripted() {
        let transcription = MockTranscription::new();
        assert_eq!(
            transcription.transcribe("https://x").await.unwrap(),
            "mock transcript"
        );
        assert_eq!(transcription.invocations(), 1);

        let triage = MockTriage::new();
        assert_eq!(triage.triage("help").await.unwrap(), default_report());

        let emotion = MockEmotion::new();
        assert_eq!(emotion.analyze("help").await.unwrap(), default_emotions());
    }

    #[tokio::test]
    async fn scripted_results_pop_in_order() {
        let transcription = MockTranscription::new();
        transcription.queue_transcript("first").await;
        transcription.queue_failure("engine down").await;

        assert_eq!(transcription.transcribe("https://x").await.unwrap(), "first");
        let err = transcription.transcribe("https://x").await.unwrap_err();
        assert!(matches!(
            err,
            LifelineError::AdapterInvocation {
                stage: StageKind::Transcribe,
                ..
            }
        ));
        // Queue exhausted, falls back to the default.
        assert_eq!(
            transcription.transcribe("https://x").await.unwrap(),
            "mock transcript"
        );
        assert_eq!(transcription.invocations(), 3);
    }
}
