// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Emotion analysis adapter trait wrapping the inference engine boundary.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::LifelineError;
use crate::traits::adapter::StageAdapter;

/// Adapter for the emotion analysis stage.
#[async_trait]
pub trait EmotionAdapter: StageAdapter {
    /// Scores the transcript, returning emotion label -> intensity in [0, 1].
    async fn analyze(&self, transcript: &str)
        -> Result<BTreeMap<String, f64>, LifelineError>;
}
