// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dashboard gateway for the Lifeline triage pipeline.
//!
//! Serves the telephony webhook endpoints (form-encoded, Twilio-shaped),
//! the `/ws` event stream fan-out for dashboards, and the `/health` and
//! root info endpoints. Webhooks acknowledge quickly; pipeline results and
//! post-acknowledgement failures are reported exclusively through the event
//! stream.

pub mod handlers;
pub mod server;
pub mod ws;

pub use server::{build_router, start_server, GatewayState};
