use tracing::debug;

use crate::event::{DEFAULT_EVENT_NAME, SseEvent};

const FRAME_DELIMITER: &[u8] = b"\n\n";

/// Incremental SSE frame splitter.
///
/// Owned by exactly one stream invocation. Bytes are buffered undecoded and
/// split on the blank-line delimiter before UTF-8 decoding, so a code point
/// cut across two chunks is reassembled before it is decoded.
#[derive(Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    /// Appends `chunk` and returns the events of every frame it completed.
    ///
    /// The trailing partial frame stays buffered for the next call.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buf.extend_from_slice(chunk);
        let mut events = Vec::new();
        let mut start = 0;
        while let Some(idx) = find_frame_delimiter(&self.buf[start..]) {
            let end = start + idx;
            if let Some(event) = parse_frame(&self.buf[start..end]) {
                events.push(event);
            }
            start = end + FRAME_DELIMITER.len();
        }
        self.buf.drain(..start);
        events
    }

    /// Number of bytes held for an unterminated frame.
    pub fn pending_len(&self) -> usize {
        self.buf.len()
    }
}

fn find_frame_delimiter(buf: &[u8]) -> Option<usize> {
    buf.windows(FRAME_DELIMITER.len())
        .position(|window| window == FRAME_DELIMITER)
}

/// Parses one frame (the bytes between two delimiters).
///
/// Returns `None` when the frame carries no data.
pub fn parse_frame(bytes: &[u8]) -> Option<SseEvent> {
    let text = String::from_utf8_lossy(bytes);
    let mut event: Option<String> = None;
    let mut data = String::new();
    for line in text.split('\n').filter(|line| !line.is_empty()) {
        if let Some(rest) = line.strip_prefix("event:") {
            event = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("data:") {
            data.push_str(rest.trim());
        }
    }
    if data.is_empty() {
        return None;
    }
    Some(SseEvent {
        event: event.unwrap_or_else(|| DEFAULT_EVENT_NAME.to_string()),
        data: parse_payload(data),
    })
}

fn parse_payload(data: String) -> serde_json::Value {
    match serde_json::from_str(&data) {
        Ok(value) => value,
        Err(e) => {
            debug!(
                error = %e,
                len = data.len(),
                "event payload is not JSON; passing it through raw"
            );
            serde_json::json!({ "raw": data })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SCENARIO: &str = "event: start\ndata: {\"session_id\":\"abc\"}\n\n\
event: token\ndata: {\"token\":\"Hi\"}\n\n\
event: token\ndata: {\"token\":\" there\"}\n\n\
event: done\ndata: {\"tokens_used\":5}\n\n";

    fn decode_in_chunks(bytes: &[u8], chunk_len: usize) -> Vec<SseEvent> {
        let mut decoder = SseDecoder::default();
        let mut events = Vec::new();
        for chunk in bytes.chunks(chunk_len) {
            events.extend(decoder.push_chunk(chunk));
        }
        events
    }

    #[test]
    fn decodes_scenario_in_order() {
        let events = decode_in_chunks(SCENARIO.as_bytes(), SCENARIO.len());
        let names: Vec<_> = events.iter().map(|e| e.event.as_str()).collect();
        assert_eq!(names, vec!["start", "token", "token", "done"]);
        assert_eq!(events[0].data, json!({"session_id": "abc"}));
        assert_eq!(events[1].data, json!({"token": "Hi"}));
        assert_eq!(events[2].data, json!({"token": " there"}));
        assert_eq!(events[3].data, json!({"tokens_used": 5}));
    }

    #[test]
    fn chunk_boundaries_do_not_change_events() {
        let bytes = "event: token\ndata: {\"token\":\"héllo wörld 👋\"}\n\n\
event: token\ndata: {\"token\":\"ü\"}\n\nevent: done\ndata: {}\n\n"
            .as_bytes();
        let whole = decode_in_chunks(bytes, bytes.len());
        assert_eq!(whole.len(), 3);
        for chunk_len in 1..bytes.len() {
            assert_eq!(
                decode_in_chunks(bytes, chunk_len),
                whole,
                "chunk_len={chunk_len}"
            );
        }
    }

    #[test]
    fn partial_frame_is_held_until_delimiter_arrives() {
        let mut decoder = SseDecoder::default();
        assert!(decoder.push_chunk(b"event: token\ndata: {\"tok").is_empty());
        assert!(decoder.pending_len() > 0);
        assert!(decoder.push_chunk(b"en\":\"hi\"}\n").is_empty());
        let events = decoder.push_chunk(b"\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, json!({"token": "hi"}));
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn frame_without_data_is_dropped() {
        assert_eq!(parse_frame(b"event: token"), None);
        assert_eq!(parse_frame(b": keep-alive"), None);
        assert_eq!(parse_frame(b""), None);
    }

    #[test]
    fn non_json_data_is_wrapped_as_raw() {
        let event = parse_frame(b"event: token\ndata: not-json").expect("event");
        assert_eq!(event.event, "token");
        assert_eq!(event.data, json!({"raw": "not-json"}));
    }

    #[test]
    fn multiple_data_lines_concatenate_without_separator() {
        let event = parse_frame(b"event: error\ndata: foo\ndata: bar").expect("event");
        assert_eq!(event.data, json!({"raw": "foobar"}));

        let event = parse_frame(b"event: token\ndata: {\"token\":\ndata: \"hi\"}").expect("event");
        assert_eq!(event.data, json!({"token": "hi"}));
    }

    #[test]
    fn unlabeled_frame_defaults_to_message() {
        let event = parse_frame(b"data: {\"x\":1}").expect("event");
        assert_eq!(event.event, DEFAULT_EVENT_NAME);
        assert_eq!(event.data, json!({"x": 1}));
    }

    #[test]
    fn unknown_lines_are_ignored_and_values_trimmed() {
        let event =
            parse_frame(b"id: 7\nevent:   token  \nretry: 100\ndata:   {\"token\":\"a\"}  \r")
                .expect("event");
        assert_eq!(event.event, "token");
        assert_eq!(event.data, json!({"token": "a"}));
    }

    #[test]
    fn unterminated_trailing_frame_stays_buffered() {
        let mut decoder = SseDecoder::default();
        let events =
            decoder.push_chunk(b"event: token\ndata: {\"token\":\"a\"}\n\nevent: done\ndata: {}");
        assert_eq!(events.len(), 1);
        assert_eq!(decoder.pending_len(), "event: done\ndata: {}".len());
    }
}
