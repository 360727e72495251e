// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP-backed stage adapters.
//!
//! Each adapter posts a small JSON request to its engine endpoint and maps
//! the response into the stage's domain type. Authentication is a bearer
//! token when the stage has an API key configured. The per-stage deadline is
//! owned by the orchestrator; the client timeout here is only a backstop
//! against connections that never progress.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use lifeline_core::{
    AdapterReadiness, EmotionAdapter, LifelineError, StageAdapter, StageKind, TranscriptionAdapter,
    TriageAdapter, TriageReport,
};

/// Backstop timeout for a single engine request.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(120);

fn build_client(
    stage: StageKind,
    api_key: Option<&str>,
) -> Result<reqwest::Client, LifelineError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(key) = api_key {
        let mut value = HeaderValue::from_str(&format!("Bearer {key}"))
            .map_err(|e| LifelineError::Config(format!("invalid {stage} API key: {e}")))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(CLIENT_TIMEOUT)
        .build()
        .map_err(|e| LifelineError::AdapterInvocation {
            stage,
            message: format!("failed to build HTTP client: {e}"),
            source: Some(Box::new(e)),
        })
}

async fn post_json<B, T>(
    client: &reqwest::Client,
    endpoint: &str,
    stage: StageKind,
    body: &B,
) -> Result<T, LifelineError>
where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
{
    let response = client
        .post(endpoint)
        .json(body)
        .send()
        .await
        .map_err(|e| LifelineError::AdapterInvocation {
            stage,
            message: format!("HTTP request failed: {e}"),
            source: Some(Box::new(e)),
        })?;

    let status = response.status();
    debug!(stage = %stage, status = %status, "engine response received");

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(LifelineError::AdapterInvocation {
            stage,
            message: format!("engine returned {status}: {body}"),
            source: None,
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| LifelineError::AdapterInvocation {
            stage,
            message: format!("engine returned malformed JSON: {e}"),
            source: Some(Box::new(e)),
        })
}

#[derive(Serialize)]
struct TranscribeRequest<'a> {
    recording_url: &'a str,
}

#[derive(Deserialize)]
struct TranscribeResponse {
    transcript: String,
}

#[derive(Serialize)]
struct TranscriptRequest<'a> {
    transcript: &'a str,
}

#[derive(Deserialize)]
struct EmotionResponse {
    emotions: BTreeMap<String, f64>,
}

/// Speech-to-text engine adapter.
pub struct HttpTranscription {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTranscription {
    pub fn new(endpoint: String, api_key: Option<&str>) -> Result<Self, LifelineError> {
        Ok(Self {
            client: build_client(StageKind::Transcribe, api_key)?,
            endpoint,
        })
    }
}

impl StageAdapter for HttpTranscription {
    fn name(&self) -> &str {
        "http-transcription"
    }

    fn stage(&self) -> StageKind {
        StageKind::Transcribe
    }

    fn readiness(&self) -> AdapterReadiness {
        AdapterReadiness::Ready
    }
}

#[async_trait]
impl TranscriptionAdapter for HttpTranscription {
    async fn transcribe(&self, recording_url: &str) -> Result<String, LifelineError> {
        let response: TranscribeResponse = post_json(
            &self.client,
            &self.endpoint,
            StageKind::Transcribe,
            &TranscribeRequest { recording_url },
        )
        .await?;
        Ok(response.transcript)
    }
}

/// Triage classification engine adapter. The engine returns the report shape
/// directly.
pub struct HttpTriage {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTriage {
    pub fn new(endpoint: String, api_key: Option<&str>) -> Result<Self, LifelineError> {
        Ok(Self {
            client: build_client(StageKind::Triage, api_key)?,
            endpoint,
        })
    }
}

impl StageAdapter for HttpTriage {
    fn name(&self) -> &str {
        "http-triage"
    }

    fn stage(&self) -> StageKind {
        StageKind::Triage
    }

    fn readiness(&self) -> AdapterReadiness {
        AdapterReadiness::Ready
    }
}

#[async_trait]
impl TriageAdapter for HttpTriage {
    async fn triage(&self, transcript: &str) -> Result<TriageReport, LifelineError> {
        post_json(
            &self.client,
            &self.endpoint,
            StageKind::Triage,
            &TranscriptRequest { transcript },
        )
        .await
    }
}

/// Emotion analysis engine adapter.
pub struct HttpEmotion {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpEmotion {
    pub fn new(endpoint: String, api_key: Option<&str>) -> Result<Self, LifelineError> {
        Ok(Self {
            client: build_client(StageKind::Emotion, api_key)?,
            endpoint,
        })
    }
}

impl StageAdapter for HttpEmotion {
    fn name(&self) -> &str {
        "http-emotion"
    }

    fn stage(&self) -> StageKind {
        StageKind::Emotion
    }

    fn readiness(&self) -> AdapterReadiness {
        AdapterReadiness::Ready
    }
}

#[async_trait]
impl EmotionAdapter for HttpEmotion {
    async fn analyze(&self, transcript: &str) -> Result<BTreeMap<String, f64>, LifelineError> {
        let response: EmotionResponse = post_json(
            &self.client,
            &self.endpoint,
            StageKind::Emotion,
            &TranscriptRequest { transcript },
        )
        .await?;
        Ok(response.emotions)
    }
}
