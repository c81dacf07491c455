//! Codec collaborator boundary.
//!
//! The encoding scheme only produces and consumes grayscale pixel buffers. Compression,
//! color-space conversion and container handling live behind these traits.

use crate::foundation::core::{FrameIndex, GrayFrame};
use crate::foundation::error::BitreelResult;

/// `ffmpeg`/`ffprobe` process-backed encoder and decoder.
pub mod ffmpeg;
/// In-memory encoder and decoder for tests and debugging.
pub mod memory;

/// One compressed packet, ready to append to the output stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Packet {
    pub data: Vec<u8>,
}

impl Packet {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }
}

/// Encoder contract.
///
/// Ordering contract: `submit_frame` is called with strictly increasing [`FrameIndex`] values,
/// and `flush` exactly once after the last frame. Errors from either call are fatal to the run.
pub trait FrameEncoder: Send {
    /// Convert and compress one frame. May return zero or more packets.
    fn submit_frame(&mut self, idx: FrameIndex, frame: &GrayFrame) -> BitreelResult<Vec<Packet>>;
    /// Signal end of input and drain every buffered packet.
    fn flush(&mut self) -> BitreelResult<Vec<Packet>>;
}

/// What a decoder hands back on each pull.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decoded {
    /// Next decoded frame, converted to 8-bit grayscale, in presentation order.
    Frame(GrayFrame),
    /// The stream is exhausted. Not an error.
    EndOfStream,
}

/// Decoder contract.
pub trait FrameDecoder {
    /// Pull the next decoded frame.
    fn next_decoded_frame(&mut self) -> BitreelResult<Decoded>;
}

impl<E: FrameEncoder + ?Sized> FrameEncoder for Box<E> {
    fn submit_frame(&mut self, idx: FrameIndex, frame: &GrayFrame) -> BitreelResult<Vec<Packet>> {
        (**self).submit_frame(idx, frame)
    }

    fn flush(&mut self) -> BitreelResult<Vec<Packet>> {
        (**self).flush()
    }
}

impl<D: FrameDecoder + ?Sized> FrameDecoder for Box<D> {
    fn next_decoded_frame(&mut self) -> BitreelResult<Decoded> {
        (**self).next_decoded_frame()
    }
}
