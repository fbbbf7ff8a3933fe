//! Classification of raw stream events into typed updates.

use crate::error::RunError;
use crate::types::{MessageDelta, Run, StreamError, StreamUpdate};

use super::sse::SseEvent;

/// Outcome of decoding one raw event.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Update(StreamUpdate),
    /// An event kind the orchestrator has no use for (run steps, message
    /// lifecycle markers, thread creation).
    Skipped,
    /// The service signalled the end of the feed.
    Done,
}

/// Maps `(event kind, payload)` pairs to [`StreamUpdate`]s.
///
/// The event kind alone selects the interpretation; the payload is only
/// parsed into the type that kind implies.
#[derive(Debug, Default, Clone, Copy)]
pub struct StreamDecoder;

impl StreamDecoder {
    pub fn new() -> Self {
        Self
    }

    pub fn decode(&self, event: &SseEvent) -> Result<Decoded, RunError> {
        let kind = event.event.as_str();
        let update = match kind {
            "done" => return Ok(Decoded::Done),
            "error" => StreamUpdate::Error(parse_stream_error(&event.data)),
            "thread.message.delta" => {
                StreamUpdate::MessageDelta(serde_json::from_str::<MessageDelta>(&event.data)?)
            }
            "thread.run.created" => StreamUpdate::RunCreated(parse_run(&event.data)?),
            "thread.run.requires_action" => StreamUpdate::RequiredAction(parse_run(&event.data)?),
            _ if kind.starts_with("thread.run.step.") => return Ok(Decoded::Skipped),
            _ if kind.starts_with("thread.run.") => {
                StreamUpdate::RunStatusChanged(parse_run(&event.data)?)
            }
            _ => {
                tracing::trace!(kind, "skipping stream event");
                return Ok(Decoded::Skipped);
            }
        };
        Ok(Decoded::Update(update))
    }
}

fn parse_run(data: &str) -> Result<Run, RunError> {
    Ok(serde_json::from_str(data)?)
}

fn parse_stream_error(data: &str) -> StreamError {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(data) else {
        return StreamError {
            code: None,
            message: data.to_string(),
        };
    };
    let body = value.get("error").unwrap_or(&value);
    let message = body
        .get("message")
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| data.to_string());
    let code = body
        .get("code")
        .and_then(|c| c.as_str())
        .map(str::to_string);
    StreamError { code, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DeltaContent, RunStatus};

    fn event(kind: &str, data: serde_json::Value) -> SseEvent {
        SseEvent {
            event: kind.to_string(),
            data: data.to_string(),
        }
    }

    fn run_json(status: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "run_1",
            "thread_id": "thread_1",
            "assistant_id": "asst_1",
            "status": status,
        })
    }

    #[test]
    fn event_kind_selects_the_update_variant() {
        let decoder = StreamDecoder::new();

        let created = decoder
            .decode(&event("thread.run.created", run_json("queued")))
            .unwrap();
        assert!(matches!(created, Decoded::Update(StreamUpdate::RunCreated(ref r)) if r.status == RunStatus::Queued));

        let completed = decoder
            .decode(&event("thread.run.completed", run_json("completed")))
            .unwrap();
        assert!(matches!(completed, Decoded::Update(StreamUpdate::RunStatusChanged(ref r)) if r.status == RunStatus::Completed));

        let action = decoder
            .decode(&event("thread.run.requires_action", run_json("requires_action")))
            .unwrap();
        assert!(matches!(action, Decoded::Update(StreamUpdate::RequiredAction(_))));
    }

    #[test]
    fn decodes_message_delta_fragments() {
        let decoded = StreamDecoder::new()
            .decode(&event(
                "thread.message.delta",
                serde_json::json!({
                    "id": "msg_1",
                    "object": "thread.message.delta",
                    "delta": { "content": [
                        { "index": 0, "type": "text", "text": { "value": "Hi" } }
                    ]}
                }),
            ))
            .unwrap();

        let Decoded::Update(StreamUpdate::MessageDelta(delta)) = decoded else {
            panic!("expected message delta, got {decoded:?}");
        };
        assert_eq!(delta.id, "msg_1");
        assert_eq!(delta.delta.content[0].index, 0);
        assert!(matches!(&delta.delta.content[0].content, DeltaContent::Text { text } if text.value == "Hi"));
    }

    #[test]
    fn skips_run_steps_and_message_markers() {
        let decoder = StreamDecoder::new();
        for kind in [
            "thread.run.step.created",
            "thread.run.step.delta",
            "thread.message.created",
            "thread.message.completed",
            "thread.created",
        ] {
            assert_eq!(
                decoder.decode(&event(kind, serde_json::json!({}))).unwrap(),
                Decoded::Skipped,
                "{kind}"
            );
        }
    }

    #[test]
    fn done_and_error_events() {
        let decoder = StreamDecoder::new();
        let done = SseEvent {
            event: "done".into(),
            data: "[DONE]".into(),
        };
        assert_eq!(decoder.decode(&done).unwrap(), Decoded::Done);

        let error = decoder
            .decode(&event(
                "error",
                serde_json::json!({ "error": { "code": "server_error", "message": "boom" } }),
            ))
            .unwrap();
        assert_eq!(
            error,
            Decoded::Update(StreamUpdate::Error(StreamError {
                code: Some("server_error".into()),
                message: "boom".into(),
            }))
        );

        let plain = SseEvent {
            event: "error".into(),
            data: "upstream closed".into(),
        };
        assert!(matches!(
            decoder.decode(&plain).unwrap(),
            Decoded::Update(StreamUpdate::Error(StreamError { message, .. })) if message == "upstream closed"
        ));
    }

    #[test]
    fn malformed_run_payload_is_a_serialization_error() {
        let result = StreamDecoder::new().decode(&SseEvent {
            event: "thread.run.in_progress".into(),
            data: "{not json".into(),
        });
        assert!(matches!(result, Err(RunError::Serialization(_))));
    }
}
