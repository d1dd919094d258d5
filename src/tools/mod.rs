//! Tool system for function calling.

pub mod arguments;
pub mod registry;
pub mod tool;
pub mod types;
pub mod validation;

pub use arguments::ToolArguments;
pub use registry::ToolRegistry;
pub use tool::{FnTool, Tool, ToolExecutionContext, ToolOutput};
pub use types::{FieldSpec, FieldType, ToolParameters};
pub use validation::{validate_arguments, FieldError, FieldErrors};
