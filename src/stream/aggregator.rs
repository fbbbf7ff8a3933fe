//! Reconstruction of message content from streamed deltas.

use std::collections::BTreeMap;

use crate::error::RunError;
use crate::types::{DeltaContent, ImageFileRef, ImageUrlRef, MessageContent, MessageDelta};

/// Content accumulated for one block index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregatedContent {
    Text(String),
    ImageFile(String),
    ImageUrl(String),
}

impl AggregatedContent {
    fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::ImageFile(_) => "image_file",
            Self::ImageUrl(_) => "image_url",
        }
    }
}

/// Everything received so far for one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedMessage {
    pub message_id: String,
    pub blocks: BTreeMap<usize, AggregatedContent>,
}

impl AggregatedMessage {
    /// Text blocks in index order, concatenated.
    pub fn text(&self) -> String {
        self.blocks
            .values()
            .filter_map(|block| match block {
                AggregatedContent::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Convert into message content blocks, ordered by index.
    pub fn to_content(&self) -> Vec<MessageContent> {
        self.blocks
            .values()
            .map(|block| match block {
                AggregatedContent::Text(text) => MessageContent::text(text.clone()),
                AggregatedContent::ImageFile(file_id) => MessageContent::ImageFile {
                    image_file: ImageFileRef {
                        file_id: file_id.clone(),
                    },
                },
                AggregatedContent::ImageUrl(url) => MessageContent::ImageUrl {
                    image_url: ImageUrlRef { url: url.clone() },
                },
            })
            .collect()
    }
}

/// Concatenates text fragments per (message, block index) in arrival order.
///
/// Aggregation is order sensitive: fragments are never reordered or
/// deduplicated. Image deltas arrive whole and replace their block.
#[derive(Debug, Default, Clone)]
pub struct DeltaAggregator {
    messages: Vec<AggregatedMessage>,
}

impl DeltaAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, delta: &MessageDelta) -> Result<(), RunError> {
        let message = self.message_entry(&delta.id);

        for block in &delta.delta.content {
            let Some(existing) = message.blocks.get_mut(&block.index) else {
                message.blocks.insert(block.index, start_block(&block.content));
                continue;
            };
            if !same_kind(&block.content, existing) {
                return Err(RunError::ProtocolViolation(format!(
                    "message {} block {} changed kind from {} mid-stream",
                    delta.id,
                    block.index,
                    existing.kind()
                )));
            }
            match (&block.content, existing) {
                (DeltaContent::Text { text }, AggregatedContent::Text(buffer)) => {
                    buffer.push_str(&text.value);
                }
                (content, existing) => *existing = start_block(content),
            }
        }

        Ok(())
    }

    /// Aggregated text of one block.
    pub fn text(&self, message_id: &str, index: usize) -> Option<&str> {
        match self.message(message_id)?.blocks.get(&index)? {
            AggregatedContent::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn message(&self, message_id: &str) -> Option<&AggregatedMessage> {
        self.messages.iter().find(|m| m.message_id == message_id)
    }

    /// Messages in order of their first delta.
    pub fn messages(&self) -> &[AggregatedMessage] {
        &self.messages
    }

    /// All aggregated text, messages in first-seen order.
    pub fn full_text(&self) -> String {
        self.messages.iter().map(AggregatedMessage::text).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Drop all accumulated state (a new stream attempt begins).
    pub fn reset(&mut self) {
        self.messages.clear();
    }

    fn message_entry(&mut self, message_id: &str) -> &mut AggregatedMessage {
        let position = match self.messages.iter().position(|m| m.message_id == message_id) {
            Some(position) => position,
            None => {
                self.messages.push(AggregatedMessage {
                    message_id: message_id.to_string(),
                    blocks: BTreeMap::new(),
                });
                self.messages.len() - 1
            }
        };
        &mut self.messages[position]
    }
}

fn same_kind(content: &DeltaContent, existing: &AggregatedContent) -> bool {
    matches!(
        (content, existing),
        (DeltaContent::Text { .. }, AggregatedContent::Text(_))
            | (DeltaContent::ImageFile { .. }, AggregatedContent::ImageFile(_))
            | (DeltaContent::ImageUrl { .. }, AggregatedContent::ImageUrl(_))
    )
}

fn start_block(content: &DeltaContent) -> AggregatedContent {
    match content {
        DeltaContent::Text { text } => AggregatedContent::Text(text.value.clone()),
        DeltaContent::ImageFile { image_file } => {
            AggregatedContent::ImageFile(image_file.file_id.clone())
        }
        DeltaContent::ImageUrl { image_url } => AggregatedContent::ImageUrl(image_url.url.clone()),
    }
}
