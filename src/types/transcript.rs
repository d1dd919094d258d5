//! Append-only conversation transcript.

use serde::{Deserialize, Serialize};

use super::message::{Role, Turn};
use crate::error::SleuthError;

/// Ordered list of turns sent to the model on every call.
///
/// Turns can only be appended. A `tool_result` turn must name a tool and
/// directly follow the assistant turn that invoked that tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a transcript from a system prompt and the first user turn.
    pub fn with_prompt(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::system(system), Turn::user(user)],
        }
    }

    /// Append a turn, rejecting tool results that break pairing.
    pub fn push(&mut self, turn: Turn) -> Result<(), SleuthError> {
        if turn.role == Role::ToolResult {
            let Some(tool_name) = turn.tool_name.as_deref() else {
                return Err(SleuthError::InvalidState(
                    "tool_result turn without a tool name".into(),
                ));
            };
            let called = self
                .turns
                .last()
                .filter(|prev| prev.role == Role::Assistant)
                .and_then(|prev| prev.tool_call.as_ref())
                .map(|call| call.name.as_str());
            if called != Some(tool_name) {
                return Err(SleuthError::InvalidState(format!(
                    "tool_result for '{tool_name}' does not follow a matching assistant call"
                )));
            }
        }
        self.turns.push(turn);
        Ok(())
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Turns appended at or after `index`.
    pub fn since(&self, index: usize) -> &[Turn] {
        self.turns.get(index..).unwrap_or(&[])
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Turn> {
        self.turns.iter()
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Turn;
    type IntoIter = std::slice::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolInvocation;

    #[test]
    fn tool_result_after_matching_call_is_accepted() {
        let mut transcript = Transcript::with_prompt("sys", "hi");
        transcript
            .push(Turn::assistant_call(ToolInvocation::new("Echo", "{}")))
            .unwrap();

        transcript.push(Turn::tool_result("Echo", "hi")).unwrap();

        assert_eq!(transcript.len(), 4);
        assert_eq!(transcript.last().unwrap().role, Role::ToolResult);
    }

    #[test]
    fn tool_result_without_preceding_call_is_rejected() {
        let mut transcript = Transcript::with_prompt("sys", "hi");

        let err = transcript.push(Turn::tool_result("Echo", "hi")).unwrap_err();

        assert!(matches!(err, SleuthError::InvalidState(_)));
        assert_eq!(transcript.len(), 2);
    }

    #[test]
    fn tool_result_for_a_different_tool_is_rejected() {
        let mut transcript = Transcript::new();
        transcript
            .push(Turn::assistant_call(ToolInvocation::new("Echo", "{}")))
            .unwrap();

        assert!(transcript.push(Turn::tool_result("Done", "x")).is_err());
    }

    #[test]
    fn tool_result_without_name_is_rejected() {
        let mut transcript = Transcript::new();
        transcript
            .push(Turn::assistant_call(ToolInvocation::new("Echo", "{}")))
            .unwrap();
        let mut turn = Turn::tool_result("Echo", "x");
        turn.tool_name = None;

        assert!(transcript.push(turn).is_err());
    }

    #[test]
    fn since_returns_only_new_turns() {
        let mut transcript = Transcript::with_prompt("sys", "hi");
        transcript.push(Turn::assistant("hello")).unwrap();

        assert_eq!(transcript.since(2).len(), 1);
        assert!(transcript.since(10).is_empty());
    }

    #[test]
    fn serializes_as_plain_turn_list() {
        let transcript = Transcript::with_prompt("sys", "hi");

        let json = serde_json::to_value(&transcript).unwrap();

        assert!(json.is_array());
        assert_eq!(json[1]["role"], "user");
        assert_eq!(json[1]["content"], "hi");
    }
}
