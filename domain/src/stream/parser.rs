//! Event Frame Parser - raw transport chunks in, ordered [`StreamEvent`]s out.
//!
//! The transport delivers an SSE body in arbitrary chunks: a chunk may hold
//! several frames, and one frame (or one UTF-8 character) may be split
//! across chunks. [`FrameParser`] buffers bytes until a full line is
//! available, assembles lines into frames, and decodes each frame's
//! `data:` payload:
//!
//! ```text
//! data: {"event":"message","answer":"Hi"}\n
//! \n                                   ← blank line ends the frame
//! event: ping\n
//! \n                                   ← bare `event: ping` frame → Ping
//! ```
//!
//! Malformed payloads are logged and skipped; they never abort the stream.
//! A line longer than the parser's line limit is dropped together with the
//! frame it belongs to.
//! When the transport closes without a terminal frame having been seen,
//! [`finish`](FrameParser::finish) yields an implicit
//! [`StreamEvent::Error`] so the reconciler always reaches a terminal state.

use super::event::{FrameIds, StreamEvent};
use crate::core::error::ChannelError;
use std::collections::VecDeque;
use std::collections::vec_deque::Drain;
use tracing::{debug, trace, warn};

/// Longest single line the parser buffers before giving up on it.
pub const DEFAULT_MAX_LINE_BYTES: usize = 8 * 1024 * 1024;

/// Incremental SSE frame parser for a single channel.
#[derive(Debug)]
pub struct FrameParser {
    /// Bytes received after the last complete line.
    pending: Vec<u8>,
    /// Prefix of `pending` already known to hold no newline.
    scanned: usize,
    max_line_bytes: usize,
    /// Dropping the rest of an oversized line.
    discarding: bool,
    /// `data:` lines of the frame under construction.
    data_lines: Vec<String>,
    /// `event:` field of the frame under construction.
    event_field: Option<String>,
    /// Decoded events not yet handed out.
    ready: VecDeque<StreamEvent>,
    saw_terminal: bool,
    finished: bool,
    frames: usize,
    malformed: usize,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
            scanned: 0,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            discarding: false,
            data_lines: Vec::new(),
            event_field: None,
            ready: VecDeque::new(),
            saw_terminal: false,
            finished: false,
            frames: 0,
            malformed: 0,
        }
    }
}

impl FrameParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_line_bytes(mut self, max: usize) -> Self {
        self.max_line_bytes = max.max(1);
        self
    }

    /// Feed one transport chunk and drain every event it completed, in
    /// arrival order.
    pub fn feed(&mut self, chunk: &[u8]) -> Drain<'_, StreamEvent> {
        if self.finished {
            debug!("Parser: ignoring {} bytes fed after finish", chunk.len());
            return self.ready.drain(..);
        }

        self.pending.extend_from_slice(chunk);

        // Lines are sliced in place; the consumed prefix is removed once.
        let mut start = 0;
        let mut search_from = self.scanned;
        while let Some(offset) = self.pending[search_from..].iter().position(|b| *b == b'\n') {
            let end = search_from + offset;
            if self.discarding {
                self.discarding = false;
            } else {
                let raw = &self.pending[start..end];
                let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
                let line = String::from_utf8_lossy(raw).into_owned();
                self.process_line(&line);
            }
            start = end + 1;
            search_from = start;
        }
        self.pending.drain(..start);
        self.scanned = self.pending.len();

        if self.pending.len() > self.max_line_bytes {
            if !self.discarding {
                self.malformed += 1;
                warn!(
                    "Parser: dropping line longer than {} bytes",
                    self.max_line_bytes
                );
                self.data_lines.clear();
                self.event_field = None;
                self.discarding = true;
            }
            self.pending.clear();
            self.scanned = 0;
        }

        self.ready.drain(..)
    }

    /// Signal end-of-stream and drain the remaining events.
    ///
    /// A trailing frame without its closing blank line is still decoded.
    /// If no `end` / `workflow_finished` / `error` frame was observed, an
    /// implicit error event with reason
    /// [`ChannelError::StreamTerminatedWithoutMarker`] is appended.
    /// Calling `finish` again yields nothing.
    pub fn finish(&mut self) -> Drain<'_, StreamEvent> {
        if !self.finished {
            self.finished = true;

            self.scanned = 0;
            if self.discarding {
                self.pending.clear();
            }
            if !self.pending.is_empty() {
                let rest = std::mem::take(&mut self.pending);
                let line = String::from_utf8_lossy(&rest).into_owned();
                let line = line.strip_suffix('\r').unwrap_or(&line).to_string();
                self.process_line(&line);
            }
            if !self.data_lines.is_empty() || self.event_field.is_some() {
                self.dispatch_frame();
            }

            if !self.saw_terminal {
                debug!(
                    "Parser: stream closed after {} frames without terminal marker",
                    self.frames
                );
                self.ready.push_back(StreamEvent::Error {
                    message: ChannelError::StreamTerminatedWithoutMarker.to_string(),
                    ids: FrameIds::default(),
                });
                self.saw_terminal = true;
            }
        }

        self.ready.drain(..)
    }

    /// Whether a terminal event has been produced (explicit or implicit).
    pub fn saw_terminal(&self) -> bool {
        self.saw_terminal
    }

    /// Number of frames dispatched so far.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Number of frames skipped because their payload could not be decoded.
    pub fn malformed(&self) -> usize {
        self.malformed
    }

    fn process_line(&mut self, line: &str) {
        if line.is_empty() {
            self.dispatch_frame();
            return;
        }
        if line.starts_with(':') {
            trace!("Parser: comment line");
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "data" => self.data_lines.push(value.to_string()),
            "event" => self.event_field = Some(value.to_string()),
            other => trace!("Parser: ignoring SSE field '{}'", other),
        }
    }

    fn dispatch_frame(&mut self) {
        let event_field = self.event_field.take();
        if self.data_lines.is_empty() {
            if event_field.as_deref() == Some("ping") {
                self.frames += 1;
                self.ready.push_back(StreamEvent::Ping);
            }
            return;
        }

        self.frames += 1;
        let payload = std::mem::take(&mut self.data_lines).join("\n");
        match StreamEvent::decode(&payload) {
            Ok(Some(event)) => {
                trace!("Parser: frame {} → {}", self.frames, event.kind());
                if event.is_terminal() {
                    self.saw_terminal = true;
                }
                self.ready.push_back(event);
            }
            Ok(None) => {
                trace!("Parser: frame {} has an unhandled event kind", self.frames);
            }
            Err(e) => {
                self.malformed += 1;
                let preview: String = payload.chars().take(100).collect();
                warn!("Parser: skipping frame {}: {} - {}", self.frames, e, preview);
            }
        }
    }
}
