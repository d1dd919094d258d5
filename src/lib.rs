//! Sleuth: a tool-calling research agent.
//!
//! An [`agent::AgentLoop`] alternates model calls and tool executions until a
//! designated completion tool runs. Model access goes through composable
//! [`provider::ModelClient`] layers that add retry with capped exponential
//! backoff and a content-addressed response cache.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use sleuth::prelude::*;
//!
//! # async fn example() -> sleuth::error::Result<()> {
//! let config = SleuthConfig::load()?;
//! let transport = sleuth::provider::openai::OpenAiClient::new(
//!     config.require_api_key()?,
//!     config.base_url.clone(),
//!     config.request_timeout(),
//! )?;
//! let client = sleuth::client::compose(transport, config.retry_policy(), None, config.open_cache()?);
//!
//! let done = FnTool::new(
//!     "Done",
//!     "Finish with a summary",
//!     ToolParameters::object().string("summary", "the answer", true).build(),
//!     |args, _ctx| async move {
//!         let summary = args.get_str("summary")?.to_string();
//!         Ok::<_, SleuthError>(ToolOutput::Text(summary))
//!     },
//! );
//! let registry = Arc::new(ToolRegistry::new(vec![Arc::new(done) as Arc<dyn Tool>])?);
//! let agent = AgentLoop::new(
//!     client,
//!     registry,
//!     AgentConfig::builder().model(config.model.clone()).completion_tool("Done").build(),
//! )?;
//!
//! let episode = agent.run("You are terse.", "Say hi, then call Done.").await?;
//! println!("{:?}", episode.final_result());
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod client;
pub mod config;
pub mod error;
pub mod prelude;
pub mod provider;
pub mod tools;
pub mod types;
pub mod util;

#[cfg(feature = "research")]
pub mod research;

#[cfg(feature = "cli")]
pub mod cli;
