//! Incremental SSE decoding (Bytes -> text deltas).
//!
//! Chunks arrive in arbitrary sizes, so lines and even UTF-8 sequences can be
//! split across reads. The decoder keeps a text buffer and only acts on
//! complete lines.

use crate::types::events::StreamingEvent;
use crate::BoxStream;
use bytes::Bytes;
use futures::{stream, StreamExt};
use serde_json::Value;
use std::collections::VecDeque;

/// Prefix of every event line the decoder looks at.
pub const DATA_PREFIX: &str = "data: ";

/// Payload that marks the end of a response.
pub const DONE_SIGNAL: &str = "[DONE]";

/// Line-oriented decoder for chat-completion SSE bodies.
///
/// - skips blank lines, `:` comments and lines without the `data: ` prefix
/// - stops for good on `data: [DONE]`
/// - extracts `choices[0].delta.content` from every other event
/// - a line whose JSON does not parse is pushed back onto the buffer and
///   retried on the next pass; if it fails again it is dropped
#[derive(Debug, Default)]
pub struct SseDeltaDecoder {
    buf: String,
    /// Tail of an incomplete UTF-8 sequence from the previous chunk.
    pending: Vec<u8>,
    /// Line pushed back after a failed parse, awaiting its one retry.
    held_line: Option<String>,
    done: bool,
    sequence: u64,
    finish_reason: Option<String>,
}

impl SseDeltaDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `[DONE]` has been seen. Once true, `feed` returns nothing.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Last `finish_reason` reported by the upstream, if any.
    pub fn finish_reason(&self) -> Option<&str> {
        self.finish_reason.as_deref()
    }

    /// Feed one transport chunk and collect the content deltas it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamingEvent> {
        let mut out = Vec::new();
        if self.done {
            return out;
        }
        self.push_bytes(chunk);
        self.drain_lines(&mut out);
        out
    }

    /// Signal end of input.
    ///
    /// Gives a held-back line its last retry, drops any trailing partial line
    /// and appends the terminal [`StreamingEvent::StreamEnd`].
    pub fn finish(&mut self) -> Vec<StreamingEvent> {
        let mut out = Vec::new();
        while self.held_line.is_some() && !self.done {
            self.drain_lines(&mut out);
        }
        if !self.buf.trim().is_empty() {
            tracing::debug!(
                trailing_bytes = self.buf.len(),
                "dropping incomplete trailing SSE line"
            );
        }
        self.buf.clear();
        self.pending.clear();
        self.done = true;
        out.push(StreamingEvent::StreamEnd {
            finish_reason: self.finish_reason.clone(),
        });
        out
    }

    fn push_bytes(&mut self, chunk: &[u8]) {
        self.pending.extend_from_slice(chunk);
        let mut start = 0;
        loop {
            match std::str::from_utf8(&self.pending[start..]) {
                Ok(s) => {
                    self.buf.push_str(s);
                    start = self.pending.len();
                    break;
                }
                Err(e) => {
                    let valid = start + e.valid_up_to();
                    self.buf
                        .push_str(&String::from_utf8_lossy(&self.pending[start..valid]));
                    match e.error_len() {
                        Some(len) => {
                            self.buf.push(char::REPLACEMENT_CHARACTER);
                            start = valid + len;
                        }
                        // Incomplete sequence at the end: wait for the next chunk.
                        None => {
                            start = valid;
                            break;
                        }
                    }
                }
            }
        }
        self.pending.drain(..start);
    }

    fn drain_lines(&mut self, out: &mut Vec<StreamingEvent>) {
        while let Some(idx) = self.buf.find('\n') {
            let mut line: String = self.buf.drain(..=idx).collect();
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }

            if line.starts_with(':') || line.trim().is_empty() {
                continue;
            }
            let Some(rest) = line.strip_prefix(DATA_PREFIX) else {
                continue;
            };

            let payload = rest.trim();
            if payload == DONE_SIGNAL {
                self.done = true;
                self.held_line = None;
                self.buf.clear();
                return;
            }

            match serde_json::from_str::<Value>(payload) {
                Ok(frame) => {
                    self.held_line = None;
                    self.emit(&frame, out);
                }
                Err(e) => {
                    if self.held_line.as_deref() == Some(line.as_str()) {
                        tracing::debug!(error = %e, "dropping SSE line that failed to parse twice");
                        self.held_line = None;
                        continue;
                    }
                    self.buf.insert(0, '\n');
                    self.buf.insert_str(0, &line);
                    self.held_line = Some(line);
                    return;
                }
            }
        }
    }

    fn emit(&mut self, frame: &Value, out: &mut Vec<StreamingEvent>) {
        if let Some(reason) = frame
            .pointer("/choices/0/finish_reason")
            .and_then(Value::as_str)
        {
            self.finish_reason = Some(reason.to_string());
        }

        let content = frame
            .pointer("/choices/0/delta/content")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if content.is_empty() {
            return;
        }

        out.push(StreamingEvent::ContentDelta {
            content: content.to_string(),
            sequence_id: self.sequence,
        });
        self.sequence += 1;
    }
}

struct DecodeState {
    input: BoxStream<'static, Bytes>,
    decoder: SseDeltaDecoder,
    queue: VecDeque<StreamingEvent>,
    ended: bool,
}

/// Lazily decode a transport byte stream into streaming events.
///
/// The output ends with exactly one `StreamEnd`, emitted on `[DONE]` (the
/// rest of the input is not read) or at end of input. A transport error is
/// passed through and ends the stream.
pub fn decode_events(input: BoxStream<'static, Bytes>) -> BoxStream<'static, StreamingEvent> {
    let state = DecodeState {
        input,
        decoder: SseDeltaDecoder::new(),
        queue: VecDeque::new(),
        ended: false,
    };

    let stream = stream::unfold(state, |mut st| async move {
        loop {
            if let Some(event) = st.queue.pop_front() {
                return Some((Ok(event), st));
            }
            if st.ended {
                return None;
            }
            if st.decoder.is_done() {
                st.ended = true;
                st.queue.extend(st.decoder.finish());
                continue;
            }

            match st.input.next().await {
                Some(Ok(bytes)) => {
                    let events = st.decoder.feed(&bytes);
                    st.queue.extend(events);
                }
                Some(Err(e)) => {
                    st.ended = true;
                    return Some((Err(e), st));
                }
                None => {
                    st.ended = true;
                    st.queue.extend(st.decoder.finish());
                }
            }
        }
    });

    Box::pin(stream)
}
