// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types for the Lifeline triage pipeline: call records, pipeline
//! events, bus channels, and stage identifiers.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Identifies one analysis stage of the pipeline.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Transcribe,
    Triage,
    Emotion,
}

/// Whether a stage adapter is backed by a real engine or a stub.
///
/// Surfaced verbatim in the `/health` services map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterReadiness {
    Ready,
    /// Stub adapters report as `mock` so dashboards can tell canned data
    /// from real engine output.
    #[serde(rename = "mock")]
    Stub,
}

impl AdapterReadiness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Stub => "mock",
        }
    }
}

/// Lifecycle status of a call record.
///
/// Transitions are monotonic in stage order, with two exceptions:
/// `Failed` is reachable from any non-failed state, and `Recording` is
/// always reachable because a fresh webhook may start a new pipeline run
/// on an existing record (supersede or retry).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    Started,
    Recording,
    Transcribed,
    Triaged,
    Completed,
    Failed,
}

impl CallStatus {
    /// Position in the stage order. `Failed` is terminal, not ordered.
    fn rank(self) -> u8 {
        match self {
            Self::Started => 0,
            Self::Recording => 1,
            Self::Transcribed => 2,
            Self::Triaged => 3,
            Self::Completed => 4,
            Self::Failed => u8::MAX,
        }
    }

    /// Whether a record in this status may move to `next`.
    pub fn can_transition_to(self, next: CallStatus) -> bool {
        match next {
            // A new pipeline run may begin on any record (supersede/retry).
            CallStatus::Recording => true,
            CallStatus::Failed => self != CallStatus::Failed,
            _ => self != CallStatus::Failed && next.rank() >= self.rank(),
        }
    }

    /// Terminal states swept by the retention pass.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Structured triage classification produced by the triage stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageReport {
    pub emergency_type: String,
    pub priority: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub caller_name: Option<String>,
    pub summary: String,
    /// Ordered list; ordering is part of the wire contract.
    pub recommended_actions: Vec<String>,
}

/// Per-call state tracked by the registry. Exactly one record exists per
/// `call_id`; webhook re-arrival mutates it rather than duplicating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRecord {
    pub call_id: String,
    pub status: CallStatus,
    /// Transcript segments. The transcribe stage overwrites the segments it
    /// owns, so replaying a recording webhook never duplicates text.
    pub transcript: Vec<String>,
    pub triage: Option<TriageReport>,
    /// Emotion label -> intensity in [0, 1]. BTreeMap keeps wire order stable.
    pub emotions: Option<BTreeMap<String, f64>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Stage-tagged failure detail, set only when `status` is `Failed`.
    pub error: Option<String>,
}

impl CallRecord {
    /// Creates a fresh record in the `Started` state.
    pub fn new(call_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            call_id: call_id.into(),
            status: CallStatus::Started,
            transcript: Vec::new(),
            triage: None,
            emotions: None,
            created_at: now,
            updated_at: now,
            error: None,
        }
    }
}

/// Named channels of the event bus. The namespace is closed and known in
/// advance; every event kind maps to exactly one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum BusChannel {
    Calls,
    Transcripts,
    Responses,
}

impl BusChannel {
    /// All channels, in the order a dashboard connection subscribes to them.
    pub const ALL: [BusChannel; 3] = [Self::Calls, Self::Transcripts, Self::Responses];
}

/// The kind of a pipeline event, matching the dashboard wire names.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    CallStarted,
    TranscriptReady,
    TriageReady,
    EmotionReady,
    PipelineFailed,
}

impl EventKind {
    /// The bus channel this kind of event is published on.
    pub fn channel(self) -> BusChannel {
        match self {
            Self::CallStarted | Self::PipelineFailed => BusChannel::Calls,
            Self::TranscriptReady => BusChannel::Transcripts,
            Self::TriageReady | Self::EmotionReady => BusChannel::Responses,
        }
    }
}

/// Stage-specific payload carried by a [`PipelineEvent`].
///
/// Serialized flattened into the wire frame, so each variant's fields
/// appear as top-level keys next to `event`, `call_sid`, and `sequence`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventPayload {
    CallStarted {
        status: String,
    },
    Transcript {
        transcript: String,
    },
    Triage {
        #[serde(flatten)]
        report: TriageReport,
    },
    Emotions {
        emotions: BTreeMap<String, f64>,
    },
    Failure {
        stage: String,
        error: String,
    },
}

/// An immutable pipeline event, created by the orchestrator immediately
/// after a stage completes and published exactly once.
///
/// `sequence` is assigned atomically per call, so any subscriber observes
/// a strictly increasing, gap-free sequence for the events actually
/// published for that call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineEvent {
    #[serde(rename = "event")]
    pub kind: EventKind,
    #[serde(rename = "call_sid")]
    pub call_id: String,
    pub sequence: u64,
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl PipelineEvent {
    pub fn new(
        call_id: impl Into<String>,
        kind: EventKind,
        sequence: u64,
        payload: EventPayload,
    ) -> Self {
        Self {
            kind,
            call_id: call_id.into(),
            sequence,
            payload,
        }
    }
}

/// Input to a pipeline run, mapped from the inbound webhook shape.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineInput {
    /// A recording is available; runs transcribe -> triage -> emotion.
    Recording {
        recording_sid: String,
        recording_url: String,
    },
    /// A transcript was supplied directly; runs triage -> emotion.
    Transcript { text: String },
}
