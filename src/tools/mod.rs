//! Local resolution of tool calls the remote agent cannot run itself.

pub mod arguments;
pub mod builtin;
pub mod parameters;
pub mod resolver;
pub mod tool;
pub mod validation;

pub use arguments::ToolArguments;
pub use parameters::ToolParameters;
pub use resolver::{resolver_fn, FnResolver, ToolOutputResolver, ToolRegistry};
pub use tool::{FunctionTool, Tool, ToolExecutionContext};
