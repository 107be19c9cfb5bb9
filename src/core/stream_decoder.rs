//! Incremental decoder for the line-framed analyze response.
//!
//! The decoder is deliberately free of I/O: the transport hands it byte
//! chunks as they arrive and it calls back with each content fragment in the
//! order the frames appear. Chunk boundaries carry no meaning; a frame may be
//! split anywhere, including inside a multi-byte character or the sentinel.

use memchr::memchr;
use tracing::debug;

use crate::api::{StreamFrame, DONE_SENTINEL, FRAME_PREFIX};
use crate::core::stream_errors::ChatError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecoderState {
    #[default]
    Idle,
    Streaming,
    Done,
    Failed,
}

impl DecoderState {
    pub fn is_terminal(self) -> bool {
        matches!(self, DecoderState::Done | DecoderState::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineOutcome {
    Ignored,
    Emitted,
    Skipped,
    Terminated,
}

#[derive(Debug, Default)]
pub struct StreamDecoder {
    state: DecoderState,
    buffer: Vec<u8>,
    skipped_frames: usize,
    emitted_fragments: usize,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Frames that were discarded because their payload did not parse.
    pub fn skipped_frames(&self) -> usize {
        self.skipped_frames
    }

    pub fn emitted_fragments(&self) -> usize {
        self.emitted_fragments
    }

    /// The response was accepted and a body is available.
    pub fn start(&mut self) {
        if self.state == DecoderState::Idle {
            self.state = DecoderState::Streaming;
        }
    }

    /// Feed one delivered chunk. Complete lines are decoded immediately and
    /// every fragment is handed to `on_fragment` before this returns.
    pub fn feed(&mut self, chunk: &[u8], mut on_fragment: impl FnMut(&str)) -> DecoderState {
        if self.state != DecoderState::Streaming {
            debug!(state = ?self.state, len = chunk.len(), "Ignoring bytes outside of an active stream");
            return self.state;
        }

        self.buffer.extend_from_slice(chunk);

        let mut start = 0;
        while let Some(relative) = memchr(b'\n', &self.buffer[start..]) {
            let newline = start + relative;
            let outcome = decode_line(&self.buffer[start..newline], &mut on_fragment);
            start = newline + 1;
            if self.record(outcome) {
                return self.state;
            }
        }

        if start > 0 {
            self.buffer.drain(..start);
        }
        self.state
    }

    /// The source was exhausted. Any unterminated trailing line is decoded as
    /// a final frame before the stream is considered done.
    pub fn finish(&mut self, mut on_fragment: impl FnMut(&str)) -> DecoderState {
        if self.state != DecoderState::Streaming {
            return self.state;
        }

        let remainder = std::mem::take(&mut self.buffer);
        if !remainder.iter().all(u8::is_ascii_whitespace) {
            let outcome = decode_line(&remainder, &mut on_fragment);
            self.record(outcome);
        }

        self.state = DecoderState::Done;
        self.log_summary();
        self.state
    }

    /// The source reported a read error.
    pub fn fail(&mut self) -> DecoderState {
        if self.state == DecoderState::Streaming {
            self.state = DecoderState::Failed;
            self.buffer.clear();
            self.log_summary();
        }
        self.state
    }

    /// Returns true once the sentinel has been seen.
    fn record(&mut self, outcome: LineOutcome) -> bool {
        match outcome {
            LineOutcome::Ignored => false,
            LineOutcome::Emitted => {
                self.emitted_fragments += 1;
                false
            }
            LineOutcome::Skipped => {
                self.skipped_frames += 1;
                false
            }
            LineOutcome::Terminated => {
                self.state = DecoderState::Done;
                self.buffer.clear();
                self.log_summary();
                true
            }
        }
    }

    fn log_summary(&self) {
        debug!(
            state = ?self.state,
            fragments = self.emitted_fragments,
            skipped = self.skipped_frames,
            "Stream decoding finished"
        );
    }
}

fn decode_line(raw: &[u8], on_fragment: &mut impl FnMut(&str)) -> LineOutcome {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);

    let line = match std::str::from_utf8(raw) {
        Ok(line) => line,
        Err(err) => {
            return skip_frame(ChatError::StreamParse {
                reason: format!("invalid UTF-8 in stream: {err}"),
            });
        }
    };

    let Some(payload) = line.strip_prefix(FRAME_PREFIX) else {
        return LineOutcome::Ignored;
    };

    if payload.trim() == DONE_SENTINEL {
        return LineOutcome::Terminated;
    }

    match serde_json::from_str::<StreamFrame>(payload) {
        Ok(StreamFrame { chunk: Some(chunk) }) if !chunk.is_empty() => {
            on_fragment(&chunk);
            LineOutcome::Emitted
        }
        Ok(_) => LineOutcome::Ignored,
        Err(err) => skip_frame(ChatError::StreamParse {
            reason: err.to_string(),
        }),
    }
}

fn skip_frame(error: ChatError) -> LineOutcome {
    debug!(kind = error.kind().as_str(), %error, "Skipping stream frame");
    LineOutcome::Skipped
}
