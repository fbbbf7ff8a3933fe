//! Streaming types.

use serde::{Deserialize, Serialize};

use super::message::{ImageFileRef, ImageUrlRef, MessageRole};
use super::run::Run;

/// One event in a push-based delivery of run progress.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamUpdate {
    /// The run was created by the submit that opened this stream.
    RunCreated(Run),
    /// Any status change other than `requires_action`, terminal ones included.
    RunStatusChanged(Run),
    /// The run is blocked on locally resolved tool outputs.
    RequiredAction(Run),
    /// An incremental content fragment of a message being produced.
    MessageDelta(MessageDelta),
    /// The service reported a stream-level error.
    Error(StreamError),
}

impl StreamUpdate {
    /// The run snapshot carried by run-level updates.
    pub fn run(&self) -> Option<&Run> {
        match self {
            Self::RunCreated(run) | Self::RunStatusChanged(run) | Self::RequiredAction(run) => {
                Some(run)
            }
            Self::MessageDelta(_) | Self::Error(_) => None,
        }
    }
}

/// Error payload of an `error` stream event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
}

/// Incremental update to one message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageDelta {
    /// Message ID the fragments belong to.
    pub id: String,
    pub delta: MessageDeltaBody,
}

impl MessageDelta {
    /// A delta carrying a single text fragment.
    pub fn text(message_id: impl Into<String>, index: usize, fragment: impl Into<String>) -> Self {
        Self {
            id: message_id.into(),
            delta: MessageDeltaBody {
                role: None,
                content: vec![DeltaBlock {
                    index,
                    content: DeltaContent::Text {
                        text: TextDelta {
                            value: fragment.into(),
                            annotations: Vec::new(),
                        },
                    },
                }],
            },
        }
    }

    /// A delta carrying a whole image file reference.
    pub fn image_file(message_id: impl Into<String>, index: usize, file_id: impl Into<String>) -> Self {
        Self {
            id: message_id.into(),
            delta: MessageDeltaBody {
                role: None,
                content: vec![DeltaBlock {
                    index,
                    content: DeltaContent::ImageFile {
                        image_file: ImageFileRef {
                            file_id: file_id.into(),
                        },
                    },
                }],
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageDeltaBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<MessageRole>,
    #[serde(default)]
    pub content: Vec<DeltaBlock>,
}

/// A fragment addressed to one content block of a message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeltaBlock {
    pub index: usize,
    #[serde(flatten)]
    pub content: DeltaContent,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeltaContent {
    Text { text: TextDelta },
    ImageFile { image_file: ImageFileRef },
    ImageUrl { image_url: ImageUrlRef },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextDelta {
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<serde_json::Value>,
}
