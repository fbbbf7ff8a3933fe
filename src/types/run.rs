//! Run snapshots, statuses, and tool-call requests.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// A snapshot of one execution attempt of an agent against a thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Run {
    pub id: String,
    pub thread_id: String,
    #[serde(rename = "assistant_id", alias = "agent_id")]
    pub agent_id: String,
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_action: Option<RequiredAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<RunLastError>,
    #[serde(
        default,
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, String>>,
}

impl Run {
    /// Create a bare snapshot with the given status.
    pub fn new(
        id: impl Into<String>,
        thread_id: impl Into<String>,
        agent_id: impl Into<String>,
        status: RunStatus,
    ) -> Self {
        Self {
            id: id.into(),
            thread_id: thread_id.into(),
            agent_id: agent_id.into(),
            status,
            required_action: None,
            last_error: None,
            created_at: None,
            model: None,
            instructions: None,
            metadata: None,
        }
    }

    /// Builder: attach a required action (and set `requires_action`).
    pub fn with_required_calls(mut self, tool_calls: Vec<RequiredToolCall>) -> Self {
        self.status = RunStatus::RequiresAction;
        self.required_action = Some(RequiredAction::SubmitToolOutputs {
            submit_tool_outputs: SubmitToolOutputsAction { tool_calls },
        });
        self
    }

    /// Builder: attach a remote-reported error.
    pub fn with_last_error(mut self, code: impl Into<String>, message: impl Into<String>) -> Self {
        self.last_error = Some(RunLastError {
            code: Some(code.into()),
            message: message.into(),
        });
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Pending tool calls, if the run carries a required action.
    pub fn required_tool_calls(&self) -> Option<&[RequiredToolCall]> {
        self.required_action.as_ref().map(RequiredAction::tool_calls)
    }
}

/// Run lifecycle status as reported by the service.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Completed,
    Failed,
    Cancelled,
    Expired,
}

impl RunStatus {
    /// `completed`, `failed`, `cancelled` and `expired` are irreversible.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::Cancelled | Self::Expired
        )
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_transition_to(self, next: RunStatus) -> bool {
        if self == next {
            return true;
        }
        match self {
            Self::Completed | Self::Failed | Self::Cancelled | Self::Expired => false,
            Self::Queued | Self::RequiresAction => true,
            Self::InProgress => next != Self::Queued,
            Self::Cancelling => next.is_terminal(),
        }
    }
}

/// Remote-reported cause of a failed run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunLastError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
}

/// What the service needs from the client before the run can proceed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequiredAction {
    SubmitToolOutputs {
        submit_tool_outputs: SubmitToolOutputsAction,
    },
}

impl RequiredAction {
    pub fn tool_calls(&self) -> &[RequiredToolCall] {
        match self {
            Self::SubmitToolOutputs { submit_tool_outputs } => &submit_tool_outputs.tool_calls,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubmitToolOutputsAction {
    pub tool_calls: Vec<RequiredToolCall>,
}

/// One pending tool invocation, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawToolCall", into = "RawToolCall")]
pub enum RequiredToolCall {
    /// A locally registered function the client must run.
    Function {
        id: String,
        name: String,
        /// JSON-encoded argument object, as sent by the service.
        arguments: String,
    },
    /// A tool kind this client has no local handler model for.
    Other {
        id: String,
        kind: String,
        payload: serde_json::Value,
    },
}

impl RequiredToolCall {
    pub fn function(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self::Function {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Function { id, .. } | Self::Other { id, .. } => id,
        }
    }

    /// Wire kind (`function`, or the kind carried by `Other`).
    pub fn kind(&self) -> &str {
        match self {
            Self::Function { .. } => "function",
            Self::Other { kind, .. } => kind,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct RawToolCall {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(flatten)]
    rest: serde_json::Map<String, serde_json::Value>,
}

impl TryFrom<RawToolCall> for RequiredToolCall {
    type Error = String;

    fn try_from(raw: RawToolCall) -> Result<Self, Self::Error> {
        if raw.kind != "function" {
            return Ok(Self::Other {
                id: raw.id,
                kind: raw.kind,
                payload: serde_json::Value::Object(raw.rest),
            });
        }

        let function = raw
            .rest
            .get("function")
            .ok_or_else(|| format!("function tool call {} has no function payload", raw.id))?;
        let name = function
            .get("name")
            .and_then(|n| n.as_str())
            .ok_or_else(|| format!("function tool call {} has no name", raw.id))?;
        let arguments = match function.get("arguments") {
            Some(serde_json::Value::String(s)) => s.clone(),
            None | Some(serde_json::Value::Null) => String::new(),
            Some(other) => other.to_string(),
        };

        Ok(Self::Function {
            id: raw.id,
            name: name.to_string(),
            arguments,
        })
    }
}

impl From<RequiredToolCall> for RawToolCall {
    fn from(call: RequiredToolCall) -> Self {
        match call {
            RequiredToolCall::Function {
                id,
                name,
                arguments,
            } => {
                let mut rest = serde_json::Map::new();
                rest.insert(
                    "function".to_string(),
                    serde_json::json!({ "name": name, "arguments": arguments }),
                );
                Self {
                    id,
                    kind: "function".to_string(),
                    rest,
                }
            }
            RequiredToolCall::Other { id, kind, payload } => {
                let rest = match payload {
                    serde_json::Value::Object(map) => map,
                    other => {
                        let mut map = serde_json::Map::new();
                        map.insert(kind.clone(), other);
                        map
                    }
                };
                Self { id, kind, rest }
            }
        }
    }
}

/// A resolved result for one required tool call, correlated by call ID.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolOutput {
    pub tool_call_id: String,
    pub output: String,
}

impl ToolOutput {
    pub fn new(tool_call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            output: output.into(),
        }
    }
}
