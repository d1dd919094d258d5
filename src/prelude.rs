//! Convenience re-exports for common use.

pub use crate::agent::{AgentConfig, AgentLoop, EpisodeEvent, EpisodeState, EpisodeStatus};
pub use crate::client::{CachedClient, RetryingClient};
pub use crate::config::SleuthConfig;
pub use crate::error::{Result, SleuthError};
pub use crate::provider::{ModelClient, ModelRequest, ModelResponse, ToolDefinition};
pub use crate::tools::{FnTool, Tool, ToolArguments, ToolOutput, ToolParameters, ToolRegistry};
pub use crate::types::{FinishReason, GenerationSettings, Role, ToolInvocation, Transcript, Turn, Usage};
pub use crate::util::cache::ResponseCache;
pub use crate::util::retry::RetryPolicy;
