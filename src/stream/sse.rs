//! Server-sent event framing.

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Event kind (`event:` field); `message` when the field is absent.
    pub event: String,
    /// Data lines joined with `\n`.
    pub data: String,
}

/// Incremental SSE parser. Chunks may split lines (and UTF-8 sequences)
/// anywhere; events are emitted on the blank line that terminates them.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk, returning every event completed by it in arrival order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();

        while let Some(line_end) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=line_end).collect();
            let line = String::from_utf8_lossy(&line[..line.len() - 1]);
            let line = line.trim_end_matches('\r');
            if let Some(event) = self.process_line(line) {
                events.push(event);
            }
        }

        events
    }

    /// Flush a trailing event not followed by a blank line.
    pub fn finish(&mut self) -> Option<SseEvent> {
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&rest).trim_end_matches('\r').to_string();
            if let Some(event) = self.process_line(&line) {
                return Some(event);
            }
        }
        self.dispatch()
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            _ => {} // id / retry carry nothing the decoder needs
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        if self.event.is_none() && self.data.is_empty() {
            return None;
        }
        let event = self.event.take().unwrap_or_else(|| "message".to_string());
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseEvent { event, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_events_split_across_chunks() {
        let mut parser = SseParser::new();
        assert!(parser.push(b"event: thread.run.cre").is_empty());
        assert!(parser.push(b"ated\ndata: {\"id\":").is_empty());
        let events = parser.push(b"\"run_1\"}\n\nevent: done\ndata: [DONE]\n\n");

        assert_eq!(
            events,
            vec![
                SseEvent {
                    event: "thread.run.created".into(),
                    data: "{\"id\":\"run_1\"}".into(),
                },
                SseEvent {
                    event: "done".into(),
                    data: "[DONE]".into(),
                },
            ]
        );
    }

    #[test]
    fn joins_multiline_data_and_skips_comments() {
        let mut parser = SseParser::new();
        let events = parser.push(b": keep-alive\r\nevent: error\r\ndata: line one\r\ndata:line two\r\n\r\n");

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, "error");
        assert_eq!(events[0].data, "line one\nline two");
    }

    #[test]
    fn keeps_utf8_sequences_split_between_chunks() {
        let mut parser = SseParser::new();
        let bytes = "data: café\n\n".as_bytes();
        let split = bytes.iter().position(|b| *b == 0xc3).unwrap() + 1;
        assert!(parser.push(&bytes[..split]).is_empty());
        let events = parser.push(&bytes[split..]);

        assert_eq!(events[0].event, "message");
        assert_eq!(events[0].data, "café");
    }

    #[test]
    fn finish_flushes_unterminated_event() {
        let mut parser = SseParser::new();
        assert!(parser.push(b"event: done\ndata: [DONE]").is_empty());
        let event = parser.finish().unwrap();
        assert_eq!(event.event, "done");
        assert_eq!(event.data, "[DONE]");
        assert!(parser.finish().is_none());
    }
}
