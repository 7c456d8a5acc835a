//! Wire format for streamed assistant responses.
//!
//! The server emits `text/event-stream` frames of the form `data: <json>`
//! followed by a blank line. Recognized payload shapes:
//!
//! ```text
//! {"content": "<delta text>"}
//! {"citations": [{"title": "...", "url": "..."}, ...]}
//! {"done": true}
//! {"error": "<message>"}
//! ```
//!
//! Unknown or malformed lines are skipped silently; the decoder never fails
//! on bad input.

use serde::Deserialize;
use thiserror::Error;

use super::message::Citation;

/// One decoded event from the response stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Incremental text delta.
    Content(String),
    /// Terminal citation metadata (arrives before `Done`).
    Citations(Vec<Citation>),
    /// Terminal success marker.
    Done,
    /// Terminal failure with a user-displayable message.
    Error(String),
}

/// Transport-level stream failures, distinct from in-band `error` frames
/// and from user-initiated cancellation.
#[derive(Debug, Clone, Error)]
pub enum StreamTransportError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("authentication with provider failed")]
    AuthenticationFailed,

    #[error("rate limited by provider")]
    RateLimited,
}

impl StreamTransportError {
    /// Creates a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Creates a status error.
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }
}

/// Wire shape of one `data:` payload. Exactly one field is expected to be
/// set; when several are, the terminal markers win over content.
#[derive(Debug, Deserialize)]
struct Frame {
    content: Option<String>,
    citations: Option<Vec<Citation>>,
    done: Option<bool>,
    error: Option<String>,
}

/// Incremental decoder for the `data: <json>` line protocol.
///
/// Feed it raw bytes as they arrive; it buffers partial lines across reads
/// and yields every complete event found. A line that is not a `data:`
/// frame, or whose JSON does not parse, produces nothing.
#[derive(Debug, Default)]
pub struct SseFrameDecoder {
    buffer: Vec<u8>,
}

impl SseFrameDecoder {
    /// Creates an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk of bytes, returning all events completed by it.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<StreamEvent> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&line[..line.len() - 1]);
            if let Some(event) = parse_line(line.trim_end_matches('\r')) {
                events.push(event);
            }
        }
        events
    }

    /// Flushes any trailing un-terminated line at end of stream.
    pub fn finish(&mut self) -> Option<StreamEvent> {
        if self.buffer.is_empty() {
            return None;
        }
        let line = String::from_utf8_lossy(&std::mem::take(&mut self.buffer)).into_owned();
        parse_line(line.trim_end_matches('\r'))
    }
}

/// Parses one complete line; returns None for anything unrecognized.
fn parse_line(line: &str) -> Option<StreamEvent> {
    let data = line.strip_prefix("data: ").or_else(|| line.strip_prefix("data:"))?;
    let data = data.trim();
    if data.is_empty() {
        return None;
    }

    let frame: Frame = serde_json::from_str(data).ok()?;

    if let Some(message) = frame.error {
        return Some(StreamEvent::Error(message));
    }
    if frame.done == Some(true) {
        return Some(StreamEvent::Done);
    }
    if let Some(citations) = frame.citations {
        return Some(StreamEvent::Citations(citations));
    }
    frame.content.map(StreamEvent::Content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_content_frames() {
        let mut decoder = SseFrameDecoder::new();
        let events = decoder.feed(b"data: {\"content\": \"Hel\"}\n\ndata: {\"content\": \"lo\"}\n\n");
        assert_eq!(
            events,
            vec![
                StreamEvent::Content("Hel".into()),
                StreamEvent::Content("lo".into()),
            ]
        );
    }

    #[test]
    fn decodes_terminal_frames() {
        let mut decoder = SseFrameDecoder::new();
        let events = decoder.feed(
            b"data: {\"citations\": [{\"title\": \"Doc\", \"url\": \"https://d.example\"}]}\n\ndata: {\"done\": true}\n\n",
        );
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0],
            StreamEvent::Citations(vec![Citation::new("Doc", "https://d.example")])
        );
        assert_eq!(events[1], StreamEvent::Done);
    }

    #[test]
    fn decodes_error_frame() {
        let mut decoder = SseFrameDecoder::new();
        let events = decoder.feed(b"data: {\"error\": \"model overloaded\"}\n");
        assert_eq!(events, vec![StreamEvent::Error("model overloaded".into())]);
    }

    #[test]
    fn partial_lines_buffer_across_feeds() {
        let mut decoder = SseFrameDecoder::new();
        assert!(decoder.feed(b"data: {\"cont").is_empty());
        let events = decoder.feed(b"ent\": \"Hi\"}\n");
        assert_eq!(events, vec![StreamEvent::Content("Hi".into())]);
    }

    #[test]
    fn skips_malformed_and_unknown_lines() {
        let mut decoder = SseFrameDecoder::new();
        let events = decoder.feed(
            b"data: not json\n: comment line\nevent: ping\ndata: {\"unknown\": 1}\ndata: {\"content\": \"ok\"}\n",
        );
        assert_eq!(events, vec![StreamEvent::Content("ok".into())]);
    }

    #[test]
    fn blank_lines_produce_nothing() {
        let mut decoder = SseFrameDecoder::new();
        assert!(decoder.feed(b"\n\n\r\n").is_empty());
    }

    #[test]
    fn crlf_lines_decode() {
        let mut decoder = SseFrameDecoder::new();
        let events = decoder.feed(b"data: {\"done\": true}\r\n");
        assert_eq!(events, vec![StreamEvent::Done]);
    }

    #[test]
    fn finish_flushes_trailing_line() {
        let mut decoder = SseFrameDecoder::new();
        assert!(decoder.feed(b"data: {\"content\": \"tail\"}").is_empty());
        assert_eq!(decoder.finish(), Some(StreamEvent::Content("tail".into())));
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn error_wins_when_frame_has_multiple_fields() {
        let mut decoder = SseFrameDecoder::new();
        let events = decoder.feed(b"data: {\"content\": \"x\", \"error\": \"boom\"}\n");
        assert_eq!(events, vec![StreamEvent::Error("boom".into())]);
    }

    #[test]
    fn done_false_is_not_terminal() {
        let mut decoder = SseFrameDecoder::new();
        let events = decoder.feed(b"data: {\"done\": false}\n");
        assert!(events.is_empty());
    }

    #[test]
    fn data_prefix_without_space_accepted() {
        let mut decoder = SseFrameDecoder::new();
        let events = decoder.feed(b"data:{\"content\": \"tight\"}\n");
        assert_eq!(events, vec![StreamEvent::Content("tight".into())]);
    }
}
