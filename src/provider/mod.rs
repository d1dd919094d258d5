//! Model transport boundary: requests, responses and the client trait.

pub mod http;

#[cfg(feature = "openai")]
pub mod openai;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::SleuthError;
use crate::tools::Tool;
use crate::types::{FinishReason, GenerationSettings, ToolInvocation, Transcript, Usage};

/// Tool definition advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    pub fn from_tool(tool: &dyn Tool) -> Self {
        Self {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            parameters: tool.parameters().json_schema(),
        }
    }
}

/// Everything a model call depends on.
///
/// The serialized form is the cache key, so every field that can change the
/// model's answer belongs here and nothing else does.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelRequest {
    pub model: String,
    pub transcript: Transcript,
    pub tools: Vec<ToolDefinition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forced_tool: Option<String>,
    pub settings: GenerationSettings,
}

impl ModelRequest {
    pub fn new(model: impl Into<String>, transcript: Transcript) -> Self {
        Self {
            model: model.into(),
            transcript,
            tools: Vec::new(),
            forced_tool: None,
            settings: GenerationSettings::default(),
        }
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_forced_tool(mut self, forced_tool: Option<String>) -> Self {
        self.forced_tool = forced_tool;
        self
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Content-addressed key: hex SHA-256 of the serialized request.
    pub fn cache_key(&self) -> Result<String, SleuthError> {
        let bytes = serde_json::to_vec(self)?;
        let digest = Sha256::digest(&bytes);
        Ok(digest.iter().map(|b| format!("{b:02x}")).collect())
    }
}

/// What the model said: free text or a tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<ToolInvocation>,
    pub finish_reason: FinishReason,
    #[serde(default)]
    pub usage: Usage,
}

/// Interpreted shape of a [`ModelResponse`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResponseKind<'a> {
    Text(&'a str),
    Invocation(&'a ToolInvocation),
}

impl ModelResponse {
    /// A free-text answer.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            tool_call: None,
            finish_reason: FinishReason::Stop,
            usage: Usage::default(),
        }
    }

    /// A tool invocation with raw argument payload.
    pub fn invocation(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            text: None,
            tool_call: Some(ToolInvocation::new(name, arguments)),
            finish_reason: FinishReason::ToolCalls,
            usage: Usage::default(),
        }
    }

    /// Classify the response by its finish reason.
    ///
    /// A forced call may report `stop` while still carrying an invocation, so
    /// an attached invocation wins for every recognized reason.
    pub fn kind(&self) -> Result<ResponseKind<'_>, SleuthError> {
        match (self.finish_reason, &self.tool_call) {
            (FinishReason::Unrecognized, call) => Err(SleuthError::protocol(
                "unrecognized finish reason",
                call.as_ref().map(|c| c.name.clone()),
                call.as_ref().map(|c| c.arguments.clone()),
            )),
            (_, Some(call)) => Ok(ResponseKind::Invocation(call)),
            (FinishReason::ToolCalls, None) => Err(SleuthError::protocol(
                "finish reason reports a tool call but none was returned",
                None,
                None,
            )),
            (_, None) => Ok(ResponseKind::Text(self.text.as_deref().unwrap_or_default())),
        }
    }
}

/// Anything that can answer a [`ModelRequest`].
///
/// Raw transports, the retry layer and the cache layer all implement this, so
/// they compose by wrapping.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn send(&self, request: &ModelRequest) -> Result<ModelResponse, SleuthError>;
}

#[async_trait]
impl<C: ModelClient + ?Sized> ModelClient for Arc<C> {
    async fn send(&self, request: &ModelRequest) -> Result<ModelResponse, SleuthError> {
        (**self).send(request).await
    }
}

#[async_trait]
impl<C: ModelClient + ?Sized> ModelClient for Box<C> {
    async fn send(&self, request: &ModelRequest) -> Result<ModelResponse, SleuthError> {
        (**self).send(request).await
    }
}
