use std::collections::VecDeque;

use crate::codec::{Decoded, FrameDecoder, FrameEncoder, Packet};
use crate::foundation::core::{FrameIndex, GrayFrame};
use crate::foundation::error::{BitreelError, BitreelResult};

/// Lossless in-memory encoder: every frame becomes one packet holding its raw samples.
///
/// `latency` frames are held back before packets start coming out, which mimics an encoder
/// with reordering delay and makes `flush` meaningful.
#[derive(Debug, Default)]
pub struct InMemoryEncoder {
    latency: usize,
    pending: VecDeque<Packet>,
    /// Frames in submission order.
    pub(crate) frames: Vec<(FrameIndex, GrayFrame)>,
    flushed: bool,
}

impl InMemoryEncoder {
    /// Create an encoder that emits each packet as soon as its frame arrives.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an encoder that holds back `latency` packets until flushed.
    pub fn with_latency(latency: usize) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    /// Borrow the captured frames.
    pub fn frames(&self) -> &[(FrameIndex, GrayFrame)] {
        &self.frames
    }

    pub fn is_flushed(&self) -> bool {
        self.flushed
    }
}

impl FrameEncoder for InMemoryEncoder {
    fn submit_frame(&mut self, idx: FrameIndex, frame: &GrayFrame) -> BitreelResult<Vec<Packet>> {
        if self.flushed {
            return Err(BitreelError::codec("in-memory encoder is already flushed"));
        }
        if let Some((last, _)) = self.frames.last()
            && idx <= *last
        {
            return Err(BitreelError::codec(format!(
                "out-of-order frame index {} after {}",
                idx.0, last.0
            )));
        }
        if let Some((_, first)) = self.frames.first()
            && (first.width, first.height) != (frame.width, frame.height)
        {
            return Err(BitreelError::codec(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, first.width, first.height
            )));
        }

        self.frames.push((idx, frame.clone()));
        self.pending.push_back(Packet::new(frame.data.clone()));

        let ready = self.pending.len().saturating_sub(self.latency);
        Ok(self.pending.drain(..ready).collect())
    }

    fn flush(&mut self) -> BitreelResult<Vec<Packet>> {
        self.flushed = true;
        Ok(self.pending.drain(..).collect())
    }
}

/// Decoder that replays a fixed list of frames, then reports end of stream.
#[derive(Debug, Default)]
pub struct InMemoryDecoder {
    frames: VecDeque<BitreelResult<GrayFrame>>,
}

impl InMemoryDecoder {
    pub fn new(frames: impl IntoIterator<Item = GrayFrame>) -> Self {
        Self {
            frames: frames.into_iter().map(Ok).collect(),
        }
    }

    /// Queue an error to be returned when the decoder reaches this position.
    pub fn push_error(&mut self, err: BitreelError) {
        self.frames.push_back(Err(err));
    }

    pub fn push_frame(&mut self, frame: GrayFrame) {
        self.frames.push_back(Ok(frame));
    }
}

impl FrameDecoder for InMemoryDecoder {
    fn next_decoded_frame(&mut self) -> BitreelResult<Decoded> {
        match self.frames.pop_front() {
            Some(Ok(frame)) => Ok(Decoded::Frame(frame)),
            Some(Err(e)) => Err(e),
            None => Ok(Decoded::EndOfStream),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/codec/memory.rs"]
mod tests;
