//! 流水线处理模块：把流式响应字节解码为回答片段。
//!
//! # Pipeline Layer
//!
//! Turns the raw byte stream of `POST /query/stream` into answer fragments.
//!
//! ```text
//! HTTP body bytes → FrameBuffer (line split, prefix strip) → fragment strings
//! ```
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`Decoder`] | Trait for stream decoding |
//! | [`decode::SseDecoder`] | `data: {"chunk": ...}` / `data: [DONE]` decoder |
//! | [`decode::FrameBuffer`] | Synchronous, chunk-boundary-safe line parser |

pub mod decode;

use crate::{BoxStream, PipeResult};
use bytes::Bytes;

pub use decode::{Frame, FrameBuffer, SseDecoder};

/// Decodes a response body into a stream of answer fragments.
///
/// Implementations must stop reading and drop `input` on termination
/// (end marker, end of body, or body error) so the connection is released.
#[async_trait::async_trait]
pub trait Decoder: Send + Sync {
    async fn decode_stream(
        &self,
        input: BoxStream<'static, Bytes>,
    ) -> PipeResult<BoxStream<'static, String>>;
}
