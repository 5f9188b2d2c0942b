//! Streaming decoders (Bytes -> answer fragments)
//!
//! The service streams one `data: {"chunk": "..."}` line per fragment and ends
//! with `data: [DONE]`.

use crate::pipeline::Decoder;
use crate::{BoxStream, PipeResult};
use bytes::Bytes;
use futures::{stream, StreamExt};
use std::collections::VecDeque;

/// One complete, recognised line of the event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Fragment(String),
    Done,
}

/// Line splitter that survives arbitrary chunk boundaries.
///
/// Bytes are buffered, not text, so a multi-byte character split across two
/// chunks decodes correctly. Only complete (`\n`-terminated) lines are parsed.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    buf: Vec<u8>,
    prefix: String,
    done_signal: String,
    field: String,
    done: bool,
}

impl FrameBuffer {
    pub fn new(
        prefix: impl Into<String>,
        done_signal: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        Self {
            buf: Vec::new(),
            prefix: prefix.into(),
            done_signal: done_signal.into(),
            field: field.into(),
            done: false,
        }
    }

    /// Feed one chunk; returns the frames completed by it, in order.
    ///
    /// Nothing is returned after a [`Frame::Done`] has been produced.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Frame> {
        let mut frames = Vec::new();
        if self.done {
            return frames;
        }
        self.buf.extend_from_slice(chunk);

        let mut start = 0;
        while let Some(offset) = self.buf[start..].iter().position(|b| *b == b'\n') {
            let end = start + offset;
            let line = String::from_utf8_lossy(&self.buf[start..end]).into_owned();
            start = end + 1;

            match self.parse_line(&line) {
                Some(Frame::Done) => {
                    self.done = true;
                    frames.push(Frame::Done);
                    break;
                }
                Some(frame) => frames.push(frame),
                None => {}
            }
        }

        if self.done {
            self.buf.clear();
        } else {
            self.buf.drain(..start);
        }
        frames
    }

    /// Bytes of an incomplete trailing line still waiting for its newline.
    pub fn pending_len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    fn parse_line(&self, line: &str) -> Option<Frame> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let payload = match line.strip_prefix(self.prefix.as_str()) {
            Some(p) => p,
            // Tolerate `data:` without the space.
            None => line.strip_prefix("data:")?.trim_start(),
        };

        if payload.trim() == self.done_signal {
            return Some(Frame::Done);
        }

        // Heartbeats and malformed frames are skipped, never fatal.
        let value: serde_json::Value = serde_json::from_str(payload).ok()?;
        let fragment = value.get(self.field.as_str())?.as_str()?;
        Some(Frame::Fragment(fragment.to_string()))
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new("data: ", "[DONE]", "chunk")
    }
}

/// SSE-style fragment decoder:
/// - splits on `\n`
/// - strips `prefix` (default "data: ")
/// - stops on `done_signal` (default "[DONE]")
/// - emits the string at `field` (default "chunk")
pub struct SseDecoder {
    prefix: String,
    done_signal: String,
    field: String,
}

impl SseDecoder {
    pub fn new(prefix: Option<String>, done_signal: Option<String>, field: Option<String>) -> Self {
        Self {
            prefix: prefix.unwrap_or_else(|| "data: ".to_string()),
            done_signal: done_signal.unwrap_or_else(|| "[DONE]".to_string()),
            field: field.unwrap_or_else(|| "chunk".to_string()),
        }
    }
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::new(None, None, None)
    }
}

struct DecodeState {
    // `None` once the body is finished or abandoned; dropping it releases the connection.
    input: Option<BoxStream<'static, Bytes>>,
    frames: FrameBuffer,
    pending: VecDeque<String>,
}

#[async_trait::async_trait]
impl Decoder for SseDecoder {
    async fn decode_stream(
        &self,
        input: BoxStream<'static, Bytes>,
    ) -> PipeResult<BoxStream<'static, String>> {
        let state = DecodeState {
            input: Some(input),
            frames: FrameBuffer::new(
                self.prefix.clone(),
                self.done_signal.clone(),
                self.field.clone(),
            ),
            pending: VecDeque::new(),
        };

        let stream = stream::unfold(state, |mut st| async move {
            loop {
                if let Some(fragment) = st.pending.pop_front() {
                    return Some((Ok(fragment), st));
                }

                let input = st.input.as_mut()?;
                let next = input.next().await;
                match next {
                    Some(Ok(bytes)) => {
                        for frame in st.frames.push(&bytes) {
                            match frame {
                                Frame::Fragment(f) => st.pending.push_back(f),
                                Frame::Done => st.input = None,
                            }
                        }
                    }
                    Some(Err(e)) => {
                        st.input = None;
                        return Some((Err(e), st));
                    }
                    None => {
                        if st.frames.pending_len() > 0 {
                            tracing::debug!(
                                bytes = st.frames.pending_len(),
                                "discarding unterminated trailing line"
                            );
                        }
                        st.input = None;
                    }
                }
            }
        });

        Ok(Box::pin(stream))
    }
}
