// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the webhook and info endpoints.
//!
//! The webhook bodies are form-encoded with the telephony provider's field
//! casing (`CallSid`, `RecordingSid`, `RecordingUrl`, `Transcript`). Missing
//! required fields are a 400; a rejected concurrent run is a 409. Recording
//! and response webhooks acknowledge with 202 before the pipeline finishes,
//! so anything that happens after the acknowledgement is reported only
//! through the event stream.

use std::collections::BTreeMap;

use axum::{
    extract::{Form, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use lifeline_core::{CallRecord, LifelineError, PipelineInput};

use crate::server::GatewayState;

/// Form body of POST /twilio/call.
#[derive(Debug, Deserialize)]
pub struct CallWebhook {
    #[serde(rename = "CallSid")]
    pub call_sid: Option<String>,
}

/// Form body of POST /twilio/recording.
#[derive(Debug, Deserialize)]
pub struct RecordingWebhook {
    #[serde(rename = "CallSid")]
    pub call_sid: Option<String>,
    #[serde(rename = "RecordingSid")]
    pub recording_sid: Option<String>,
    #[serde(rename = "RecordingUrl")]
    pub recording_url: Option<String>,
}

/// Form body of POST /twilio/response.
#[derive(Debug, Deserialize)]
pub struct ResponseWebhook {
    #[serde(rename = "CallSid")]
    pub call_sid: Option<String>,
    #[serde(rename = "Transcript")]
    pub transcript: Option<String>,
}

/// Acknowledgement body returned by the webhook endpoints.
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub call_sid: String,
    pub status: String,
    pub message: String,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    /// Stage name -> "ready" | "mock".
    pub services: BTreeMap<String, &'static str>,
    /// "configured" | "missing".
    pub telephony: &'static str,
}

/// Maps a pipeline error onto the webhook status codes.
pub struct ApiError(pub LifelineError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            LifelineError::MalformedInput { .. } => StatusCode::BAD_REQUEST,
            LifelineError::NotFound { .. } => StatusCode::NOT_FOUND,
            LifelineError::AlreadyProcessing { .. } => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(ErrorResponse {
            error: self.0.to_string(),
        });
        (status, body).into_response()
    }
}

impl From<LifelineError> for ApiError {
    fn from(err: LifelineError) -> Self {
        Self(err)
    }
}

fn require(
    field: &'static str,
    value: Option<String>,
) -> Result<String, ApiError> {
    value.ok_or(ApiError(LifelineError::MalformedInput { field }))
}

/// POST /twilio/call
///
/// Registers the call and announces it on the `calls` channel. Idempotent
/// per `CallSid`.
pub async fn post_call(
    State(state): State<GatewayState>,
    Form(body): Form<CallWebhook>,
) -> Result<Response, ApiError> {
    let call_sid = require("CallSid", body.call_sid)?;
    state.orchestrator.call_started(&call_sid).await?;

    let ack = WebhookAck {
        call_sid,
        status: "in-progress".to_string(),
        message: "call tracking started".to_string(),
    };
    Ok((StatusCode::OK, Json(ack)).into_response())
}

/// POST /twilio/recording
///
/// Starts a full pipeline run (transcribe, triage, emotion) for the
/// recording and acknowledges immediately. An unknown `CallSid` is not an
/// error; the record is created on the fly.
pub async fn post_recording(
    State(state): State<GatewayState>,
    Form(body): Form<RecordingWebhook>,
) -> Result<Response, ApiError> {
    let call_sid = require("CallSid", body.call_sid)?;
    let recording_sid = require("RecordingSid", body.recording_sid)?;
    let recording_url = require("RecordingUrl", body.recording_url)?;

    state
        .orchestrator
        .dispatch(
            &call_sid,
            PipelineInput::Recording {
                recording_sid,
                recording_url,
            },
        )
        .await?;

    let ack = WebhookAck {
        call_sid,
        status: "queued".to_string(),
        message: "recording queued for analysis".to_string(),
    };
    Ok((StatusCode::ACCEPTED, Json(ack)).into_response())
}

/// POST /twilio/response
///
/// Starts a pipeline run from a transcript supplied directly, skipping the
/// transcribe stage, and acknowledges immediately.
pub async fn post_response(
    State(state): State<GatewayState>,
    Form(body): Form<ResponseWebhook>,
) -> Result<Response, ApiError> {
    let call_sid = require("CallSid", body.call_sid)?;
    let transcript = require("Transcript", body.transcript)?;

    state
        .orchestrator
        .dispatch(&call_sid, PipelineInput::Transcript { text: transcript })
        .await?;

    let ack = WebhookAck {
        call_sid,
        status: "queued".to_string(),
        message: "transcript queued for analysis".to_string(),
    };
    Ok((StatusCode::ACCEPTED, Json(ack)).into_response())
}

/// GET /calls/{call_sid}
///
/// Snapshot of one call's record.
pub async fn get_call(
    State(state): State<GatewayState>,
    Path(call_sid): Path<String>,
) -> Result<Json<CallRecord>, ApiError> {
    match state.registry.get(&call_sid).await {
        Some(record) => Ok(Json(record)),
        None => Err(ApiError(LifelineError::NotFound { call_id: call_sid })),
    }
}

/// GET /health
///
/// Reports overall status plus each stage's adapter readiness and whether
/// telephony credentials are configured.
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        services: state.services.as_ref().clone(),
        telephony: if state.telephony_configured {
            "configured"
        } else {
            "missing"
        },
    })
}

/// GET /
pub async fn get_root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": "lifeline",
        "message": "emergency call triage pipeline",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
