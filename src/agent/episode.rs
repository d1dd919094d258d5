//! Per-episode state.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::types::{Transcript, Usage};

/// Unique episode identifier.
pub type EpisodeId = Uuid;

/// Episode lifecycle status.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeStatus {
    Running,
    Complete,
}

/// State owned by a single run of the agent loop.
///
/// The status moves from running to complete exactly once, and the final
/// result is written at that moment and never afterward.
#[derive(Debug, Clone, Serialize)]
pub struct EpisodeState {
    pub id: EpisodeId,
    pub transcript: Transcript,
    pub steps_taken: usize,
    pub model_calls: usize,
    pub usage: Usage,
    pub started_at: DateTime<Utc>,
    status: EpisodeStatus,
    final_result: Option<serde_json::Value>,
    degraded: bool,
    finished_at: Option<DateTime<Utc>>,
}

impl EpisodeState {
    pub fn new(transcript: Transcript) -> Self {
        Self {
            id: Uuid::new_v4(),
            transcript,
            steps_taken: 0,
            model_calls: 0,
            usage: Usage::default(),
            started_at: Utc::now(),
            status: EpisodeStatus::Running,
            final_result: None,
            degraded: false,
            finished_at: None,
        }
    }

    pub fn status(&self) -> EpisodeStatus {
        self.status
    }

    pub fn is_complete(&self) -> bool {
        self.status == EpisodeStatus::Complete
    }

    pub fn final_result(&self) -> Option<&serde_json::Value> {
        self.final_result.as_ref()
    }

    /// Take ownership of the final result, consuming the episode.
    pub fn into_final_result(self) -> Option<serde_json::Value> {
        self.final_result
    }

    /// Whether the final result is a raw fallback rather than tool output.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Mark the episode complete. Returns false if it already was.
    pub(crate) fn complete_with(&mut self, result: serde_json::Value, degraded: bool) -> bool {
        if self.is_complete() {
            return false;
        }
        self.status = EpisodeStatus::Complete;
        self.final_result = Some(result);
        self.degraded = degraded;
        self.finished_at = Some(Utc::now());
        true
    }
}
