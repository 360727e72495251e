// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base trait shared by all stage adapters.

use crate::types::{AdapterReadiness, StageKind};

/// The base trait for all Lifeline stage adapters.
///
/// Every adapter (transcription, triage, emotion) implements this trait,
/// which provides identity and readiness reporting for the health endpoint.
pub trait StageAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// Returns the pipeline stage this adapter backs.
    fn stage(&self) -> StageKind;

    /// Whether this adapter is backed by a real engine or a stub.
    fn readiness(&self) -> AdapterReadiness;
}
