// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock stage adapters and a pre-wired harness for deterministic testing.
//!
//! The mocks pop scripted results from a FIFO queue (falling back to fixed
//! defaults when the queue is empty), support failure and latency injection,
//! and count invocations. `TestHarness` wires registry, bus, and
//! orchestrator around them, enabling fast CI-runnable tests without any
//! external service.

pub mod harness;
pub mod mock_adapters;

pub use harness::{collect_frames, TestHarness};
pub use mock_adapters::{MockEmotion, MockTranscription, MockTriage};
