//! Episode event types.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::types::Turn;

/// Callback receiving episode events as they happen.
pub type EpisodeEventSink = Arc<dyn Fn(EpisodeEvent) + Send + Sync>;

/// Observable progress of one episode.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EpisodeEvent {
    Started {
        episode_id: Uuid,
        max_steps: usize,
    },
    TurnAppended {
        episode_id: Uuid,
        index: usize,
        turn: Turn,
    },
    /// A tool call fell back to its raw argument payload.
    ToolFailed {
        episode_id: Uuid,
        tool_name: String,
        error: String,
    },
    Completed {
        episode_id: Uuid,
        steps_taken: usize,
        model_calls: usize,
        degraded: bool,
    },
}

impl EpisodeEvent {
    pub fn episode_id(&self) -> Uuid {
        match self {
            Self::Started { episode_id, .. }
            | Self::TurnAppended { episode_id, .. }
            | Self::ToolFailed { episode_id, .. }
            | Self::Completed { episode_id, .. } => *episode_id,
        }
    }
}
