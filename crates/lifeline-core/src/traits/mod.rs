// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stage adapter trait definitions.
//!
//! Each analysis stage is wrapped by a capability trait extending the
//! [`StageAdapter`] base, using `#[async_trait]` for dynamic dispatch.
//! Real and stub implementations are interchangeable; the variant is
//! selected once at process start, never per call.

pub mod adapter;
pub mod emotion;
pub mod transcription;
pub mod triage;

pub use adapter::StageAdapter;
pub use emotion::EmotionAdapter;
pub use transcription::TranscriptionAdapter;
pub use triage::TriageAdapter;
