//! Reassembly of fragmented streaming responses
//!
//! Network reads split vendor streams at arbitrary byte offsets. The
//! [`StreamReassembler`] buffers bytes until an event is complete, hands each
//! event to the vendor's [`ResponseNormalizer`] and returns only what is new.

use crate::convert::ResponseNormalizer;
use crate::error::LlmError;
use crate::types::{CompletionResult, FinishReason, Vendor};

/// Largest unterminated event held in memory
pub const MAX_BUFFERED_BYTES: usize = 16 * 1024 * 1024;

/// SSE sentinel some vendors send after the last event
const DONE_SENTINEL: &str = "[DONE]";

/// How events are delimited on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// `text/event-stream`: `data:` lines, events end at a blank line
    ServerSentEvents,
    /// One JSON record per line
    JsonLines,
}

/// Per-request parser turning byte fragments into result deltas
///
/// The reassembler is `Open` until a delta reports `complete`, then `Closed`:
/// any later input is ignored. Dropping it cancels the request.
pub struct StreamReassembler {
    vendor: Vendor,
    model: String,
    framing: Framing,
    normalizer: Box<dyn ResponseNormalizer>,
    buffer: Vec<u8>,
    /// `data:` lines of the SSE event being read, joined by `\n`
    event_data: Option<String>,
    closed: bool,
    last_error: Option<LlmError>,
}

impl std::fmt::Debug for StreamReassembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamReassembler")
            .field("vendor", &self.vendor)
            .field("model", &self.model)
            .field("framing", &self.framing)
            .field("buffered", &self.buffer.len())
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl StreamReassembler {
    pub fn new(
        vendor: Vendor,
        model: impl Into<String>,
        framing: Framing,
        normalizer: Box<dyn ResponseNormalizer>,
    ) -> Self {
        Self {
            vendor,
            model: model.into(),
            framing,
            normalizer,
            buffer: Vec::new(),
            event_data: None,
            closed: false,
            last_error: None,
        }
    }

    pub const fn vendor(&self) -> Vendor {
        self.vendor
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Whether the vendor's finish signal has been seen (or synthesized)
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Most recent fragment that failed to parse
    pub const fn last_error(&self) -> Option<&LlmError> {
        self.last_error.as_ref()
    }

    /// Feed one network fragment
    ///
    /// Returns the delta produced by every event this fragment completed;
    /// bytes of an unfinished event stay buffered.
    pub fn push(&mut self, fragment: &[u8]) -> CompletionResult {
        let mut delta = CompletionResult::default();
        if self.closed {
            return delta;
        }

        // The buffered tail never holds a newline, only new bytes need a scan
        let mut scan_from = self.buffer.len();
        self.buffer.extend_from_slice(fragment);
        let buffer = std::mem::take(&mut self.buffer);

        let mut start = 0;
        while !self.closed
            && let Some(offset) = buffer[scan_from..].iter().position(|&b| b == b'\n')
        {
            let end = scan_from + offset;
            self.handle_line(&buffer[start..end], &mut delta);
            start = end + 1;
            scan_from = start;
        }

        if self.closed {
            self.event_data = None;
            return delta;
        }

        self.buffer = buffer;
        self.buffer.drain(..start);

        let pending = self.buffer.len() + self.event_data.as_ref().map_or(0, String::len);
        if pending > MAX_BUFFERED_BYTES {
            self.record_error(format!("unterminated event exceeds {MAX_BUFFERED_BYTES} bytes"));
            self.buffer = Vec::new();
            self.event_data = None;
        }

        delta
    }

    /// Signal end of input
    ///
    /// A trailing event without its terminator is still processed. If the
    /// vendor never sent a finish signal, completion is synthesized: `stop`,
    /// or `error` when a fragment failed to parse along the way.
    pub fn finish(&mut self) -> CompletionResult {
        let mut delta = CompletionResult::default();
        if self.closed {
            return delta;
        }

        let rest = std::mem::take(&mut self.buffer);
        if !rest.is_empty() {
            self.handle_line(&rest, &mut delta);
        }
        if !self.closed {
            self.dispatch_pending(&mut delta);
        }
        if !self.closed {
            let flushed = self.normalizer.flush();
            self.accept(flushed, &mut delta);
        }
        if !self.closed {
            let synthesized = match &self.last_error {
                Some(error) => CompletionResult::failed(error.to_string()),
                None => CompletionResult::finished(FinishReason::Stop),
            };
            tracing::debug!(
                vendor = %self.vendor,
                model = %self.model,
                finish_reason = ?synthesized.finish_reason,
                "stream ended without a finish signal"
            );
            self.accept(synthesized, &mut delta);
        }

        delta
    }

    fn handle_line(&mut self, raw: &[u8], delta: &mut CompletionResult) {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let line = match std::str::from_utf8(raw) {
            Ok(line) => line,
            Err(e) => {
                self.record_error(format!("invalid UTF-8 in stream: {e}"));
                return;
            }
        };

        match self.framing {
            Framing::JsonLines => {
                if !line.trim().is_empty() {
                    self.dispatch(line, delta);
                }
            }
            Framing::ServerSentEvents => self.handle_sse_line(line, delta),
        }
    }

    fn handle_sse_line(&mut self, line: &str, delta: &mut CompletionResult) {
        if line.is_empty() {
            self.dispatch_pending(delta);
            return;
        }
        if line.starts_with(':') {
            return;
        }

        let (field, value) = line.split_once(':').unwrap_or((line, ""));
        if field != "data" {
            // event, id and retry carry nothing the normalizers need
            return;
        }
        let value = value.strip_prefix(' ').unwrap_or(value);
        match &mut self.event_data {
            Some(data) => {
                data.push('\n');
                data.push_str(value);
            }
            None => self.event_data = Some(value.to_owned()),
        }
    }

    fn dispatch_pending(&mut self, delta: &mut CompletionResult) {
        if let Some(data) = self.event_data.take() {
            self.dispatch(&data, delta);
        }
    }

    fn dispatch(&mut self, payload: &str, delta: &mut CompletionResult) {
        let payload = payload.trim();
        if payload.is_empty() || payload == DONE_SENTINEL {
            return;
        }

        match self.normalizer.normalize(payload) {
            Ok(result) => self.accept(result, delta),
            Err(e) => self.record_error(e.to_string()),
        }
    }

    fn accept(&mut self, result: CompletionResult, delta: &mut CompletionResult) {
        if self.closed {
            return;
        }
        self.closed = result.complete;
        delta.append(result);
    }

    fn record_error(&mut self, message: String) {
        tracing::warn!(
            vendor = %self.vendor,
            model = %self.model,
            error = %message,
            "skipping malformed stream event"
        );
        self.last_error = Some(LlmError::Parse {
            vendor: self.vendor,
            model: self.model.clone(),
            message,
        });
    }
}
