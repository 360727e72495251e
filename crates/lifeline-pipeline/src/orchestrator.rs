// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The orchestrator: single-flight stage driver for one call's pipeline run.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use lifeline_bus::EventBus;
use lifeline_core::{
    CallRecord, CallStatus, EmotionAdapter, EventKind, EventPayload, LifelineError,
    PipelineEvent, PipelineInput, StageKind, TranscriptionAdapter, TriageAdapter,
};
use lifeline_registry::CallRegistry;

/// The three stage adapters a pipeline run invokes, real or stub.
#[derive(Clone)]
pub struct StageAdapters {
    pub transcription: Arc<dyn TranscriptionAdapter>,
    pub triage: Arc<dyn TriageAdapter>,
    pub emotion: Arc<dyn EmotionAdapter>,
}

/// Runtime knobs for the orchestrator, mapped from the `[pipeline]` config
/// section.
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Deadline applied to each adapter invocation individually.
    pub stage_timeout: Duration,
    /// When `true`, a new webhook for a call with a run already in flight
    /// cancels that run at its next stage boundary and takes over. When
    /// `false`, the new webhook is rejected with `AlreadyProcessing`.
    pub supersede_in_flight: bool,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            stage_timeout: Duration::from_secs(30),
            supersede_in_flight: true,
        }
    }
}

/// The in-flight run for a call: its cancellation token plus an identity so
/// cleanup by a finished run can never evict a successor's entry.
struct InflightRun {
    run_id: u64,
    token: CancellationToken,
}

/// How a run ended when it did not fail.
enum RunOutcome {
    Completed,
    Superseded,
}

/// Drives pipeline runs: one in flight per call, stages in order, results
/// committed to the registry and published on the bus after each stage.
pub struct Orchestrator {
    registry: Arc<CallRegistry>,
    bus: Arc<EventBus>,
    adapters: StageAdapters,
    options: OrchestratorOptions,
    inflight: DashMap<String, InflightRun>,
    run_counter: AtomicU64,
}

impl Orchestrator {
    pub fn new(
        registry: Arc<CallRegistry>,
        bus: Arc<EventBus>,
        adapters: StageAdapters,
        options: OrchestratorOptions,
    ) -> Self {
        Self {
            registry,
            bus,
            adapters,
            options,
            inflight: DashMap::new(),
            run_counter: AtomicU64::new(0),
        }
    }

    /// Registers a call (idempotently) and announces it on the `calls`
    /// channel. Returns the record and whether it was newly created.
    pub async fn call_started(
        &self,
        call_id: &str,
    ) -> Result<(CallRecord, bool), LifelineError> {
        let (record, created) = self.registry.get_or_create(call_id).await;
        self.emit(
            call_id,
            EventKind::CallStarted,
            EventPayload::CallStarted {
                status: "in-progress".into(),
            },
        )?;
        info!(call_sid = call_id, created, "call started");
        Ok((record, created))
    }

    /// Starts a pipeline run for the call in the background and returns once
    /// the run is admitted.
    ///
    /// If a run is already in flight for this call, the outcome depends on
    /// `supersede_in_flight`: the old run is cancelled at its next stage
    /// boundary and this one takes over, or this dispatch is rejected with
    /// `AlreadyProcessing`. Results and failures of the admitted run are
    /// reported through the event stream only.
    pub async fn dispatch(
        self: &Arc<Self>,
        call_id: &str,
        input: PipelineInput,
    ) -> Result<(), LifelineError> {
        self.registry.get_or_create(call_id).await;

        let run_id = self.run_counter.fetch_add(1, Ordering::Relaxed) + 1;
        let token = CancellationToken::new();

        match self.inflight.entry(call_id.to_string()) {
            Entry::Occupied(mut entry) => {
                if !self.options.supersede_in_flight {
                    return Err(LifelineError::AlreadyProcessing {
                        call_id: call_id.to_string(),
                    });
                }
                let old = entry.insert(InflightRun {
                    run_id,
                    token: token.clone(),
                });
                old.token.cancel();
                info!(call_sid = call_id, "superseding in-flight pipeline run");
            }
            Entry::Vacant(entry) => {
                entry.insert(InflightRun {
                    run_id,
                    token: token.clone(),
                });
            }
        }

        // The admitted run owns the record from here on.
        if let Err(err) = self
            .registry
            .update(call_id, |record| {
                record.status = CallStatus::Recording;
                record.error = None;
            })
            .await
        {
            self.inflight.remove_if(call_id, |_, run| run.run_id == run_id);
            return Err(err);
        }

        let this = Arc::clone(self);
        let call_id = call_id.to_string();
        tokio::spawn(async move {
            this.run(call_id, input, run_id, token).await;
        });
        Ok(())
    }

    /// Whether a pipeline run is currently in flight for the call.
    pub fn is_inflight(&self, call_id: &str) -> bool {
        self.inflight.contains_key(call_id)
    }

    async fn run(
        self: Arc<Self>,
        call_id: String,
        input: PipelineInput,
        run_id: u64,
        token: CancellationToken,
    ) {
        match self.run_stages(&call_id, input, &token).await {
            Ok(RunOutcome::Completed) => {
                info!(call_sid = call_id.as_str(), "pipeline run completed");
            }
            Ok(RunOutcome::Superseded) => {
                info!(call_sid = call_id.as_str(), "pipeline run superseded");
            }
            Err(err) if token.is_cancelled() => {
                // A successor owns the record; do not mark it failed.
                debug!(
                    call_sid = call_id.as_str(),
                    error = %err,
                    "superseded pipeline run failed, ignoring"
                );
            }
            Err(err) => self.fail(&call_id, err).await,
        }

        // Only the run that owns the entry may clean it up.
        self.inflight
            .remove_if(&call_id, |_, run| run.run_id == run_id);
    }

    /// Runs the stages in order. The cancellation token is checked before
    /// each adapter is invoked, and every commit re-checks it under the
    /// record lock (see [`CallRegistry::update_if`]), so a superseded run
    /// never lands a result after the boundary at which it was cancelled --
    /// even when it queued for the lock before the cancellation and a fresh
    /// run committed in between.
    async fn run_stages(
        &self,
        call_id: &str,
        input: PipelineInput,
        token: &CancellationToken,
    ) -> Result<RunOutcome, LifelineError> {
        let transcript = match input {
            PipelineInput::Recording {
                recording_sid,
                recording_url,
            } => {
                debug!(
                    call_sid = call_id,
                    recording_sid = recording_sid.as_str(),
                    adapter = self.adapters.transcription.name(),
                    "transcribe stage started"
                );
                let text = self
                    .with_deadline(
                        StageKind::Transcribe,
                        self.adapters.transcription.transcribe(&recording_url),
                    )
                    .await?;
                if !self.commit_transcript(call_id, &text, token).await? {
                    return Ok(RunOutcome::Superseded);
                }
                text
            }
            PipelineInput::Transcript { text } => {
                if !self.commit_transcript(call_id, &text, token).await? {
                    return Ok(RunOutcome::Superseded);
                }
                text
            }
        };

        if token.is_cancelled() {
            return Ok(RunOutcome::Superseded);
        }
        debug!(
            call_sid = call_id,
            adapter = self.adapters.triage.name(),
            "triage stage started"
        );
        let report = self
            .with_deadline(StageKind::Triage, self.adapters.triage.triage(&transcript))
            .await?;
        let committed = self
            .registry
            .update_if(call_id, || !token.is_cancelled(), |record| {
                record.triage = Some(report.clone());
                record.status = CallStatus::Triaged;
            })
            .await?;
        if committed.is_none() {
            return Ok(RunOutcome::Superseded);
        }
        self.emit(call_id, EventKind::TriageReady, EventPayload::Triage { report })?;

        if token.is_cancelled() {
            return Ok(RunOutcome::Superseded);
        }
        debug!(
            call_sid = call_id,
            adapter = self.adapters.emotion.name(),
            "emotion stage started"
        );
        let emotions = self
            .with_deadline(StageKind::Emotion, self.adapters.emotion.analyze(&transcript))
            .await?;
        let committed = self
            .registry
            .update_if(call_id, || !token.is_cancelled(), |record| {
                record.emotions = Some(emotions.clone());
                record.status = CallStatus::Completed;
            })
            .await?;
        if committed.is_none() {
            return Ok(RunOutcome::Superseded);
        }
        self.emit(call_id, EventKind::EmotionReady, EventPayload::Emotions { emotions })?;

        Ok(RunOutcome::Completed)
    }

    /// Commits the transcript, overwriting any previous segments so a
    /// replayed webhook never duplicates text, and publishes the event.
    /// Returns `false` without committing or publishing when the run was
    /// superseded by the time the record lock was acquired.
    async fn commit_transcript(
        &self,
        call_id: &str,
        text: &str,
        token: &CancellationToken,
    ) -> Result<bool, LifelineError> {
        let text = text.to_string();
        let committed = self
            .registry
            .update_if(call_id, || !token.is_cancelled(), |record| {
                record.transcript = vec![text.clone()];
                record.status = CallStatus::Transcribed;
            })
            .await?;
        if committed.is_none() {
            return Ok(false);
        }
        self.emit(
            call_id,
            EventKind::TranscriptReady,
            EventPayload::Transcript { transcript: text },
        )?;
        Ok(true)
    }

    /// Marks the call failed with a stage-tagged error and publishes
    /// `pipeline_failed` on the `calls` channel.
    async fn fail(&self, call_id: &str, err: LifelineError) {
        let stage = err
            .stage()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "pipeline".to_string());
        let detail = err.stage_tagged();
        warn!(
            call_sid = call_id,
            stage = stage.as_str(),
            error = detail.as_str(),
            "pipeline run failed"
        );

        let update = self
            .registry
            .update(call_id, |record| {
                record.status = CallStatus::Failed;
                record.error = Some(detail.clone());
            })
            .await;
        if let Err(update_err) = update {
            warn!(
                call_sid = call_id,
                error = %update_err,
                "could not record pipeline failure"
            );
            return;
        }

        if let Err(publish_err) = self.emit(
            call_id,
            EventKind::PipelineFailed,
            EventPayload::Failure {
                stage,
                error: detail,
            },
        ) {
            warn!(
                call_sid = call_id,
                error = %publish_err,
                "could not publish pipeline failure"
            );
        }
    }

    /// Draws the call's next sequence number and publishes the event on the
    /// channel its kind maps to.
    fn emit(
        &self,
        call_id: &str,
        kind: EventKind,
        payload: EventPayload,
    ) -> Result<(), LifelineError> {
        let sequence = self.registry.next_sequence(call_id)?;
        self.bus
            .route(&PipelineEvent::new(call_id, kind, sequence, payload))
    }

    async fn with_deadline<T, F>(&self, stage: StageKind, fut: F) -> Result<T, LifelineError>
    where
        F: std::future::Future<Output = Result<T, LifelineError>>,
    {
        match tokio::time::timeout(self.options.stage_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(LifelineError::AdapterTimeout {
                stage,
                duration: self.options.stage_timeout,
            }),
        }
    }
}
