//! Agent loop, episode state and the forced-completion policy.

pub mod episode;
pub mod events;
pub mod policy;
pub mod runner;

pub use episode::{EpisodeId, EpisodeState, EpisodeStatus};
pub use events::{EpisodeEvent, EpisodeEventSink};
pub use policy::forced_tool;
pub use runner::{AgentConfig, AgentLoop, StepOutcome};

/// Completion tool used when none is configured.
pub const DEFAULT_COMPLETION_TOOL: &str = "ResearchComplete";
