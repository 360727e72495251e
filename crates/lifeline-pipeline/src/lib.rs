// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pipeline orchestrator for the Lifeline triage service.
//!
//! Drives the ordered analysis stages (transcribe, triage, emotion) for one
//! call at a time per `call_id`, committing each stage's result to the call
//! registry and publishing the matching event before the next stage starts.
//! At most one run is in flight per call; a newer webhook either supersedes
//! the current run (cancelling it at the next stage boundary) or is rejected,
//! depending on configuration.

pub mod orchestrator;

pub use orchestrator::{Orchestrator, OrchestratorOptions, StageAdapters};
