// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Lifeline triage pipeline.

use thiserror::Error;

use crate::types::StageKind;

/// The primary error type used across all Lifeline adapter traits and core operations.
#[derive(Debug, Error)]
pub enum LifelineError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// An inbound webhook payload is missing a required field.
    #[error("malformed input: missing required field `{field}`")]
    MalformedInput { field: &'static str },

    /// An operation referenced a call that is not in the registry.
    #[error("call not found: {call_id}")]
    NotFound { call_id: String },

    /// A pipeline run is already in flight for this call.
    #[error("call already processing: {call_id}")]
    AlreadyProcessing { call_id: String },

    /// The stage's backing engine is not configured or unreachable.
    #[error("{stage} adapter unavailable")]
    AdapterUnavailable { stage: StageKind },

    /// An adapter invocation exceeded its deadline.
    #[error("{stage} adapter timed out after {duration:?}")]
    AdapterTimeout {
        stage: StageKind,
        duration: std::time::Duration,
    },

    /// The engine was reachable but returned an error or a malformed result.
    #[error("{stage} adapter error: {message}")]
    AdapterInvocation {
        stage: StageKind,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Gateway errors (bind failure, serve failure, connection handling).
    #[error("gateway error: {message}")]
    Gateway {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors (invariant violations).
    #[error("internal error: {0}")]
    Internal(String),
}

impl LifelineError {
    /// Returns the stage this error is tagged with, if it is a stage error.
    pub fn stage(&self) -> Option<StageKind> {
        match self {
            Self::AdapterUnavailable { stage }
            | Self::AdapterTimeout { stage, .. }
            | Self::AdapterInvocation { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Renders the stage-tagged failure detail stored on a failed [`CallRecord`].
    ///
    /// [`CallRecord`]: crate::types::CallRecord
    pub fn stage_tagged(&self) -> String {
        match self.stage() {
            Some(stage) => format!("{stage}: {self}"),
            None => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_errors_carry_their_stage() {
        let err = LifelineError::AdapterTimeout {
            stage: StageKind::Triage,
            duration: std::time::Duration::from_secs(30),
        };
        assert_eq!(err.stage(), Some(StageKind::Triage));
        assert!(err.stage_tagged().starts_with("triage: "));
    }

    #[test]
    fn non_stage_errors_have_no_stage() {
        let err = LifelineError::NotFound {
            call_id: "c1".into(),
        };
        assert_eq!(err.stage(), None);
        assert_eq!(err.stage_tagged(), "call not found: c1");
    }

    #[test]
    fn all_variants_construct() {
        let _config = LifelineError::Config("test".into());
        let _malformed = LifelineError::MalformedInput { field: "CallSid" };
        let _not_found = LifelineError::NotFound {
            call_id: "c1".into(),
        };
        let _busy = LifelineError::AlreadyProcessing {
            call_id: "c1".into(),
        };
        let _unavailable = LifelineError::AdapterUnavailable {
            stage: StageKind::Transcribe,
        };
        let _timeout = LifelineError::AdapterTimeout {
            stage: StageKind::Emotion,
            duration: std::time::Duration::from_secs(5),
        };
        let _invocation = LifelineError::AdapterInvocation {
            stage: StageKind::Triage,
            message: "bad response".into(),
            source: Some(Box::new(std::io::Error::other("test"))),
        };
        let _gateway = LifelineError::Gateway {
            message: "bind failed".into(),
            source: None,
        };
        let _internal = LifelineError::Internal("test".into());
    }
}
