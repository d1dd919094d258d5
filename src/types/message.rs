//! Turn types for model communication.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// One entry in a conversation transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<ToolInvocation>,
}

impl Turn {
    /// Create a system turn.
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: Some(text.into()),
            tool_name: None,
            tool_call: None,
        }
    }

    /// Create a user turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(text.into()),
            tool_name: None,
            tool_call: None,
        }
    }

    /// Create a free-text assistant turn.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: Some(text.into()),
            tool_name: None,
            tool_call: None,
        }
    }

    /// Create an assistant turn carrying a tool invocation.
    pub fn assistant_call(call: ToolInvocation) -> Self {
        Self {
            role: Role::Assistant,
            content: None,
            tool_name: None,
            tool_call: Some(call),
        }
    }

    /// Create a tool result turn.
    pub fn tool_result(tool_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::ToolResult,
            content: Some(content.into()),
            tool_name: Some(tool_name.into()),
            tool_call: None,
        }
    }

    /// Text shown when rendering the turn: the content, or the invocation.
    pub fn display_text(&self) -> String {
        match (&self.content, &self.tool_call) {
            (Some(text), _) => text.clone(),
            (None, Some(call)) => format!("{}({})", call.name, call.arguments),
            (None, None) => String::new(),
        }
    }
}

/// Conversation role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
    ToolResult,
}

/// A tool call requested by the model.
///
/// `arguments` is the raw serialized payload exactly as the model produced it;
/// it is only parsed when the tool is invoked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolInvocation {
    pub name: String,
    pub arguments: String,
}

impl ToolInvocation {
    pub fn new(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Build an invocation from structured arguments.
    pub fn from_value(name: impl Into<String>, arguments: &serde_json::Value) -> Self {
        Self {
            name: name.into(),
            arguments: arguments.to_string(),
        }
    }
}
