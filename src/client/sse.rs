//! Server-Sent Events decoding
//!
//! Bytes are pushed in as they arrive; complete events are pulled out.
//! A `data: [DONE]` line ends the stream.

use tracing::trace;

/// A parsed SSE event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseEvent {
    pub event: Option<String>,
    /// `data:` lines joined with `\n`
    pub data: String,
    pub id: Option<String>,
    pub retry: Option<u64>,
}

/// Incremental SSE decoder
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    pending: SseEvent,
    data_lines: Vec<String>,
    done: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once `[DONE]` has been seen
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Append raw bytes from the wire
    pub fn push(&mut self, bytes: &[u8]) {
        if !self.done {
            self.buffer.extend_from_slice(bytes);
        }
    }

    /// Next complete event, if the buffer holds one
    pub fn next_event(&mut self) -> Option<SseEvent> {
        while !self.done {
            let newline = self.buffer.iter().position(|&b| b == b'\n')?;
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches('\n').trim_end_matches('\r');

            if let Some(event) = self.feed_line(line) {
                return Some(event);
            }
        }
        None
    }

    /// Flush at end of input
    ///
    /// An unterminated last line and an event missing its closing blank
    /// line are still delivered.
    pub fn finish(&mut self) -> Option<SseEvent> {
        if self.done {
            return None;
        }
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let rest = String::from_utf8_lossy(&rest);
            let line = rest.trim_end_matches('\r').to_string();
            if let Some(event) = self.feed_line(&line) {
                return Some(event);
            }
        }
        if self.done {
            return None;
        }
        self.take_pending()
    }

    fn feed_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.take_pending();
        }

        if let Some(value) = line.strip_prefix("data:") {
            let value = value.trim();
            if value == "[DONE]" {
                trace!("SSE stream finished");
                self.done = true;
                self.buffer.clear();
                return None;
            }
            self.data_lines.push(value.to_string());
        } else if let Some(value) = line.strip_prefix("event:") {
            self.pending.event = Some(value.trim().to_string());
        } else if let Some(value) = line.strip_prefix("id:") {
            self.pending.id = Some(value.trim().to_string());
        } else if let Some(value) = line.strip_prefix("retry:") {
            if let Ok(retry) = value.trim().parse() {
                self.pending.retry = Some(retry);
            }
        }
        // anything else, including ":" comments, is ignored
        None
    }

    fn take_pending(&mut self) -> Option<SseEvent> {
        if self.pending.event.is_none() && self.data_lines.is_empty() {
            // no event in progress; stray blank line or id-only block
            self.pending = SseEvent::default();
            return None;
        }
        let mut event = std::mem::take(&mut self.pending);
        event.data = std::mem::take(&mut self.data_lines).join("\n");
        trace!(event = ?event.event, bytes = event.data.len(), "SSE event");
        Some(event)
    }
}
