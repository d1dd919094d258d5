//! Generation settings and related enums.

use bon::Builder;
use serde::{Deserialize, Serialize};
use strum::Display;

/// Settings controlling sampling for a model call.
#[derive(Debug, Clone, Builder, Serialize, Deserialize, Default, PartialEq)]
pub struct GenerationSettings {
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f64>,
    pub seed: Option<u64>,
    pub user: Option<String>,
}

/// Why generation finished.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
    /// Anything the loop does not know how to interpret.
    #[serde(other)]
    Unrecognized,
}

impl FinishReason {
    /// Map a provider's finish-reason string.
    pub fn from_wire(value: &str) -> Self {
        match value {
            "stop" => Self::Stop,
            "length" => Self::Length,
            "tool_calls" | "function_call" => Self::ToolCalls,
            "content_filter" => Self::ContentFilter,
            _ => Self::Unrecognized,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_function_call_maps_to_tool_calls() {
        assert_eq!(FinishReason::from_wire("function_call"), FinishReason::ToolCalls);
        assert_eq!(FinishReason::from_wire("tool_calls"), FinishReason::ToolCalls);
    }

    #[test]
    fn unknown_reason_is_unrecognized() {
        assert_eq!(FinishReason::from_wire("exploded"), FinishReason::Unrecognized);
        let parsed: FinishReason = serde_json::from_str("\"exploded\"").unwrap();
        assert_eq!(parsed, FinishReason::Unrecognized);
    }

    #[test]
    fn builder_sets_temperature() {
        let settings = GenerationSettings::builder().temperature(0.0).build();
        assert_eq!(settings.temperature, Some(0.0));
        assert_eq!(settings.max_tokens, None);
    }
}
