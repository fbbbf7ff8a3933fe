//! Thread message types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message belonging to exactly one thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: String,
    pub thread_id: String,
    pub role: MessageRole,
    pub content: Vec<MessageContent>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(
        default,
        rename = "assistant_id",
        alias = "agent_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub agent_id: Option<String>,
}

impl Message {
    /// Create a single-text message.
    pub fn text_message(
        id: impl Into<String>,
        thread_id: impl Into<String>,
        role: MessageRole,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            thread_id: thread_id.into(),
            role,
            content: vec![MessageContent::text(text)],
            created_at: Utc::now(),
            run_id: None,
            agent_id: None,
        }
    }

    /// Extract the text content, concatenating all text blocks.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                MessageContent::Text { text } => Some(text.value.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageRole {
    User,
    #[serde(rename = "assistant", alias = "agent")]
    #[strum(serialize = "assistant")]
    Agent,
    System,
}

/// One content block of a message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text { text: TextContent },
    ImageFile { image_file: ImageFileRef },
    ImageUrl { image_url: ImageUrlRef },
}

impl MessageContent {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text {
            text: TextContent {
                value: value.into(),
                annotations: Vec::new(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextContent {
    pub value: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<serde_json::Value>,
}

/// Reference to an uploaded image file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageFileRef {
    pub file_id: String,
}

/// Reference to an externally hosted image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageUrlRef {
    pub url: String,
}
