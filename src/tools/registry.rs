//! Name-indexed set of tools available to an episode.

use std::collections::HashMap;
use std::sync::Arc;

use super::arguments::ToolArguments;
use super::tool::{Tool, ToolExecutionContext, ToolOutput};
use super::validation::validate_arguments;
use crate::error::SleuthError;
use crate::provider::ToolDefinition;
use crate::types::ToolInvocation;

/// Tools advertised to the model, built once and shared read-only.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
    definitions: Vec<ToolDefinition>,
}

impl ToolRegistry {
    /// Build a registry. Two tools with the same name is a schema error.
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Result<Self, SleuthError> {
        let mut index = HashMap::with_capacity(tools.len());
        for (i, tool) in tools.iter().enumerate() {
            if index.insert(tool.name().to_string(), i).is_some() {
                return Err(SleuthError::Schema(format!(
                    "duplicate tool name '{}'",
                    tool.name()
                )));
            }
        }
        let definitions = tools
            .iter()
            .map(|t| ToolDefinition::from_tool(t.as_ref()))
            .collect();
        Ok(Self {
            tools,
            index,
            definitions,
        })
    }

    /// Definitions in registration order.
    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    /// Whether `name` is one of the advertised tools.
    pub fn advertises(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Look up a tool. Callers must check [`Self::advertises`] first; an
    /// unknown name here is a bug, not a model error.
    pub fn get(&self, name: &str) -> Result<&Arc<dyn Tool>, SleuthError> {
        self.index
            .get(name)
            .map(|&i| &self.tools[i])
            .ok_or_else(|| SleuthError::InvalidState(format!("tool '{name}' is not registered")))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.iter().map(|d| d.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Parse, validate and execute one invocation.
    ///
    /// Returns `ArgumentParse` when the payload is not valid JSON or does not
    /// match the schema, and `ToolExecution` when the tool itself fails.
    pub async fn invoke(
        &self,
        call: &ToolInvocation,
        ctx: &ToolExecutionContext,
    ) -> Result<ToolOutput, SleuthError> {
        let tool = self.get(&call.name)?;
        let parsed = ToolArguments::parse_raw(&call.arguments).map_err(|errors| {
            SleuthError::ArgumentParse {
                tool_name: call.name.clone(),
                errors,
            }
        })?;
        let validated = validate_arguments(&parsed, tool.parameters()).map_err(|errors| {
            SleuthError::ArgumentParse {
                tool_name: call.name.clone(),
                errors,
            }
        })?;

        match tool.execute(&ToolArguments::new(validated), ctx).await {
            Ok(output) => Ok(output),
            Err(err @ (SleuthError::ToolExecution { .. } | SleuthError::ArgumentParse { .. })) => {
                Err(err)
            }
            Err(other) => Err(SleuthError::tool_execution(&call.name, other.to_string())),
        }
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names().collect::<Vec<_>>())
            .finish()
    }
}
