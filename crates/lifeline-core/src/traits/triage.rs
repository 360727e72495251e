// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Triage adapter trait wrapping the classification engine boundary.

use async_trait::async_trait;

use crate::error::LifelineError;
use crate::traits::adapter::StageAdapter;
use crate::types::TriageReport;

/// Adapter for the triage stage.
#[async_trait]
pub trait TriageAdapter: StageAdapter {
    /// Classifies the transcript into a structured triage report.
    async fn triage(&self, transcript: &str) -> Result<TriageReport, LifelineError>;
}
