// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Lifeline emergency-call triage pipeline.
//!
//! This crate provides the foundational trait definitions, error taxonomy,
//! and domain types used throughout the Lifeline workspace. All stage
//! adapters implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::LifelineError;
pub use types::{
    AdapterReadiness, BusChannel, CallRecord, CallStatus, EventKind, EventPayload,
    PipelineEvent, PipelineInput, StageKind, TriageReport,
};

// Re-export all adapter traits at crate root.
pub use traits::{EmotionAdapter, StageAdapter, TranscriptionAdapter, TriageAdapter};
