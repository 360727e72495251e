// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stage adapters for the Lifeline triage pipeline.
//!
//! Each analysis stage (transcribe, triage, emotion) has two adapters: an
//! HTTP-backed one calling the stage's real engine, and a deterministic stub
//! used whenever the engine is not configured. Selection happens once at
//! startup (see [`select::build_adapters`]); the rest of the system only
//! sees the trait objects.

pub mod http;
pub mod select;
pub mod stub;

pub use http::{HttpEmotion, HttpTranscription, HttpTriage};
pub use select::{build_adapters, readiness_map};
pub use stub::{StubEmotion, StubTranscription, StubTriage};
