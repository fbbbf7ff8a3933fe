//! Run creation options.

use std::collections::HashMap;

use bon::Builder;
use serde::{Deserialize, Serialize};

/// Parameters for creating a run on a thread.
///
/// ```
/// use agentrun::types::RunOptions;
///
/// let options = RunOptions::builder()
///     .agent_id("asst_123")
///     .instructions("Answer in one sentence.")
///     .temperature(0.2)
///     .build();
/// assert_eq!(options.agent_id, "asst_123");
/// ```
#[derive(Debug, Clone, Builder, Serialize, Deserialize, PartialEq)]
pub struct RunOptions {
    #[builder(into)]
    #[serde(rename = "assistant_id")]
    pub agent_id: String,
    #[builder(into)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[builder(into)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[builder(into)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_instructions: Option<String>,
    /// Overrides the agent's tool set for this run only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_prompt_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_completion_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel_tool_calls: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, String>>,
}

impl RunOptions {
    /// Options that only name the agent.
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self::builder().agent_id(agent_id).build()
    }
}

/// Tool definition sent with a run to override the agent's tools.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolDefinition {
    Function { function: FunctionDefinition },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}
