//! The agent loop: drives model calls and tool execution to completion.

use std::sync::Arc;
use std::time::Duration;

use bon::Builder;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::SleuthError;
use crate::provider::{ModelClient, ModelRequest, ModelResponse, ResponseKind};
use crate::tools::{ToolExecutionContext, ToolOutput, ToolRegistry};
use crate::types::{GenerationSettings, ToolInvocation, Transcript, Turn};
use crate::util::timeout::with_timeout;

use super::episode::EpisodeState;
use super::events::{EpisodeEvent, EpisodeEventSink};
use super::policy::forced_tool;
use super::DEFAULT_COMPLETION_TOOL;

/// Per-loop settings.
#[derive(Debug, Clone, Builder)]
pub struct AgentConfig {
    #[builder(into)]
    pub model: String,
    /// Tool executions allowed before the completion tool is forced.
    #[builder(default = 20)]
    pub max_steps: usize,
    #[builder(into, default = DEFAULT_COMPLETION_TOOL.to_string())]
    pub completion_tool: String,
    #[builder(default)]
    pub settings: GenerationSettings,
    /// Upper bound on a single tool execution; expiry degrades the result.
    pub tool_timeout: Option<Duration>,
}

/// What a single step did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The model answered in free text.
    Text,
    /// A tool ran; `degraded` means its raw arguments stand in for output.
    ToolResult { tool_name: String, degraded: bool },
    /// The episode reached its terminal state.
    Complete,
}

/// Drives episodes against one client and one tool registry.
///
/// The loop itself holds no per-episode state, so one instance can run many
/// episodes concurrently.
pub struct AgentLoop<C> {
    client: C,
    registry: Arc<ToolRegistry>,
    config: AgentConfig,
    event_sink: Option<EpisodeEventSink>,
}

impl<C: ModelClient> AgentLoop<C> {
    /// Build a loop. The completion tool must be registered.
    pub fn new(
        client: C,
        registry: Arc<ToolRegistry>,
        config: AgentConfig,
    ) -> Result<Self, SleuthError> {
        if !registry.advertises(&config.completion_tool) {
            return Err(SleuthError::Configuration(format!(
                "completion tool '{}' is not registered",
                config.completion_tool
            )));
        }
        Ok(Self {
            client,
            registry,
            config,
            event_sink: None,
        })
    }

    pub fn with_event_sink(mut self, sink: EpisodeEventSink) -> Self {
        self.event_sink = Some(sink);
        self
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Fresh episode holding only the system and user turns.
    pub fn start(&self, system: impl Into<String>, user: impl Into<String>) -> EpisodeState {
        let state = EpisodeState::new(Transcript::with_prompt(system, user));
        self.emit(EpisodeEvent::Started {
            episode_id: state.id,
            max_steps: self.config.max_steps,
        });
        state
    }

    /// Run a new episode to completion.
    pub async fn run(
        &self,
        system: impl Into<String>,
        user: impl Into<String>,
    ) -> Result<EpisodeState, SleuthError> {
        let mut state = self.start(system, user);
        self.drive(&mut state).await?;
        Ok(state)
    }

    /// Step an existing episode until it completes or a step fails.
    pub async fn drive(&self, state: &mut EpisodeState) -> Result<(), SleuthError> {
        while !state.is_complete() {
            self.step(state).await?;
        }
        Ok(())
    }

    /// Perform one model call and act on its response.
    pub async fn step(&self, state: &mut EpisodeState) -> Result<StepOutcome, SleuthError> {
        if state.is_complete() {
            return Err(SleuthError::InvalidState(format!(
                "episode {} is already complete",
                state.id
            )));
        }

        let forced = forced_tool(
            state.steps_taken,
            self.config.max_steps,
            &self.config.completion_tool,
        );
        let request = ModelRequest::new(&self.config.model, state.transcript.clone())
            .with_tools(self.registry.definitions().to_vec())
            .with_forced_tool(forced.clone())
            .with_settings(self.config.settings.clone());

        debug!(
            episode = %state.id,
            steps_taken = state.steps_taken,
            max_steps = self.config.max_steps,
            forced = forced.is_some(),
            "Agent step"
        );

        let response = self.client.send(&request).await?;
        state.model_calls += 1;
        state.usage.merge(&response.usage);

        if forced.is_some() {
            self.forced_step(state, response).await
        } else {
            self.free_step(state, response).await
        }
    }

    async fn free_step(
        &self,
        state: &mut EpisodeState,
        response: ModelResponse,
    ) -> Result<StepOutcome, SleuthError> {
        let call = match response.kind()? {
            ResponseKind::Text(text) => {
                self.append(state, Turn::assistant(text))?;
                return Ok(StepOutcome::Text);
            }
            ResponseKind::Invocation(call) => call.clone(),
        };

        if !self.registry.advertises(&call.name) {
            return Err(SleuthError::protocol(
                format!("model invoked unknown tool '{}'", call.name),
                Some(call.name),
                Some(call.arguments),
            ));
        }

        self.append(state, Turn::assistant_call(call.clone()))?;
        let executed = self.execute(state, &call).await;
        state.steps_taken += 1;

        match executed {
            Ok(output) => {
                self.append(state, Turn::tool_result(&call.name, output.to_text()))?;
                if call.name == self.config.completion_tool {
                    self.finish(state, output.into_value(), false);
                    return Ok(StepOutcome::Complete);
                }
                Ok(StepOutcome::ToolResult {
                    tool_name: call.name,
                    degraded: false,
                })
            }
            Err(err) => {
                self.degrade(state, &call, &err)?;
                Ok(StepOutcome::ToolResult {
                    tool_name: call.name,
                    degraded: true,
                })
            }
        }
    }

    /// The forced step always completes the episode, falling back to
    /// whatever the model produced when it is not a usable completion.
    async fn forced_step(
        &self,
        state: &mut EpisodeState,
        response: ModelResponse,
    ) -> Result<StepOutcome, SleuthError> {
        let call = match response.tool_call {
            Some(call) => call,
            None => {
                let text = response.text.unwrap_or_default();
                warn!(episode = %state.id, "Forced completion answered with text");
                self.append(state, Turn::assistant(text.clone()))?;
                self.finish(state, Value::String(text), true);
                return Ok(StepOutcome::Complete);
            }
        };

        self.append(state, Turn::assistant_call(call.clone()))?;

        if call.name != self.config.completion_tool {
            warn!(
                episode = %state.id,
                tool = %call.name,
                expected = %self.config.completion_tool,
                "Forced completion invoked a different tool"
            );
            self.append(state, Turn::tool_result(&call.name, call.arguments.clone()))?;
            self.finish(state, Value::String(call.arguments), true);
            return Ok(StepOutcome::Complete);
        }

        match self.execute(state, &call).await {
            Ok(output) => {
                self.append(state, Turn::tool_result(&call.name, output.to_text()))?;
                self.finish(state, output.into_value(), false);
            }
            Err(err) => {
                self.degrade(state, &call, &err)?;
                self.finish(state, Value::String(call.arguments), true);
            }
        }
        Ok(StepOutcome::Complete)
    }

    async fn execute(
        &self,
        state: &EpisodeState,
        call: &ToolInvocation,
    ) -> Result<ToolOutput, SleuthError> {
        let ctx = ToolExecutionContext {
            episode_id: Some(state.id),
            step: state.steps_taken,
        };
        match self.config.tool_timeout {
            Some(limit) => with_timeout(limit, self.registry.invoke(call, &ctx)).await,
            None => self.registry.invoke(call, &ctx).await,
        }
    }

    /// Substitute the raw argument payload for a failed tool's output.
    fn degrade(
        &self,
        state: &mut EpisodeState,
        call: &ToolInvocation,
        err: &SleuthError,
    ) -> Result<(), SleuthError> {
        warn!(
            episode = %state.id,
            tool = %call.name,
            error = %err,
            "Tool call failed; using raw arguments as result"
        );
        self.emit(EpisodeEvent::ToolFailed {
            episode_id: state.id,
            tool_name: call.name.clone(),
            error: err.to_string(),
        });
        self.append(state, Turn::tool_result(&call.name, call.arguments.clone()))
    }

    fn append(&self, state: &mut EpisodeState, turn: Turn) -> Result<(), SleuthError> {
        let index = state.transcript.len();
        let event_turn = self.event_sink.as_ref().map(|_| turn.clone());
        state.transcript.push(turn)?;
        if let Some(turn) = event_turn {
            self.emit(EpisodeEvent::TurnAppended {
                episode_id: state.id,
                index,
                turn,
            });
        }
        Ok(())
    }

    fn finish(&self, state: &mut EpisodeState, result: Value, degraded: bool) {
        if state.complete_with(result, degraded) {
            info!(
                episode = %state.id,
                steps_taken = state.steps_taken,
                model_calls = state.model_calls,
                degraded,
                "Episode complete"
            );
            self.emit(EpisodeEvent::Completed {
                episode_id: state.id,
                steps_taken: state.steps_taken,
                model_calls: state.model_calls,
                degraded,
            });
        }
    }

    fn emit(&self, event: EpisodeEvent) {
        if let Some(ref sink) = self.event_sink {
            sink(event);
        }
    }
}

impl<C> std::fmt::Debug for AgentLoop<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentLoop")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish()
    }
}
