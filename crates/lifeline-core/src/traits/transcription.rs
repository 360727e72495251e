// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transcription adapter trait wrapping the speech-to-text engine boundary.

use async_trait::async_trait;

use crate::error::LifelineError;
use crate::traits::adapter::StageAdapter;

/// Adapter for the transcribe stage.
///
/// Implementations fetch and transcribe the recording behind `recording_url`.
/// The caller owns the deadline; implementations should not retry internally.
#[async_trait]
pub trait TranscriptionAdapter: StageAdapter {
    /// Transcribes the recording and returns the full transcript text.
    async fn transcribe(&self, recording_url: &str) -> Result<String, LifelineError>;
}
