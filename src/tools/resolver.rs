//! Mapping of required tool calls to tool outputs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::arguments::ToolArguments;
use super::tool::{Tool, ToolExecutionContext};
use super::validation::validate_arguments;
use crate::error::RunError;
use crate::types::{RequiredToolCall, ToolDefinition, ToolOutput};

/// Produces the output for one pending tool call.
///
/// Implementations must tag the output with the originating call ID and
/// must fail rather than return a placeholder when they cannot answer.
#[async_trait]
pub trait ToolOutputResolver: Send + Sync {
    async fn resolve(&self, call: &RequiredToolCall) -> Result<ToolOutput, RunError>;
}

/// Function tools dispatched by name.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Definitions for every registered tool, sorted by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut tools: Vec<&Arc<dyn Tool>> = self.tools.values().collect();
        tools.sort_by(|a, b| a.name().cmp(b.name()));
        tools.into_iter().map(|t| t.definition()).collect()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.tools.keys().collect();
        names.sort();
        f.debug_struct("ToolRegistry").field("tools", &names).finish()
    }
}

#[async_trait]
impl ToolOutputResolver for ToolRegistry {
    async fn resolve(&self, call: &RequiredToolCall) -> Result<ToolOutput, RunError> {
        match call {
            RequiredToolCall::Function {
                id,
                name,
                arguments,
            } => {
                let tool = self
                    .get(name)
                    .ok_or_else(|| RunError::UnknownTool(name.clone()))?;
                let args = ToolArguments::parse(arguments)?;
                validate_arguments(name, args.raw(), tool.parameters())?;

                let ctx = ToolExecutionContext {
                    tool_call_id: id.clone(),
                };
                tracing::debug!(tool = %name, call_id = %id, "resolving function call");
                let value = tool.execute(&args, &ctx).await?;
                Ok(ToolOutput::new(id.clone(), render_output(value)))
            }
            RequiredToolCall::Other { id, kind, .. } => Err(RunError::UnsupportedToolCall {
                call_id: id.clone(),
                kind: kind.clone(),
            }),
        }
    }
}

/// Resolver backed by a plain function.
pub struct FnResolver<F>(F);

/// Wrap a synchronous function as a [`ToolOutputResolver`].
pub fn resolver_fn<F>(f: F) -> FnResolver<F>
where
    F: Fn(&RequiredToolCall) -> Result<ToolOutput, RunError> + Send + Sync,
{
    FnResolver(f)
}

#[async_trait]
impl<F> ToolOutputResolver for FnResolver<F>
where
    F: Fn(&RequiredToolCall) -> Result<ToolOutput, RunError> + Send + Sync,
{
    async fn resolve(&self, call: &RequiredToolCall) -> Result<ToolOutput, RunError> {
        (self.0)(call)
    }
}

fn render_output(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text,
        other => other.to_string(),
    }
}
