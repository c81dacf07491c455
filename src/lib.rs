//! bitreel stores arbitrary files as sequences of banded grayscale video frames.
//!
//! Every byte of the source becomes one column of a frame. The column is split into eight
//! horizontal bands, one per bit (most significant bit on top), each painted fully white or
//! fully black so the pattern survives lossy compression.
//!
//! # Pipeline overview
//!
//! 1. **Plan**: `size / width` rounded up gives the chunk count; frame 0 is a header carrying
//!    `"<name>\n<size>"`.
//! 2. **Rasterize**: each chunk becomes one [`GrayFrame`] via the band mapper.
//! 3. **Encode**: frames go to a [`FrameEncoder`] (the system `ffmpeg` by default) and the
//!    returned packets are written out, followed by a 4-byte sequence-end code.
//!
//! The decode side is separate and does not reverse the mapping: a [`FrameDecoder`] yields
//! grayscale frames and [`FrameExtractor`] dumps each one as a numbered PGM file.
#![forbid(unsafe_code)]

mod foundation;

pub mod codec;
pub mod config;
pub mod extract;
pub mod pipeline;
pub mod plan;
pub mod protocol;
pub mod raster;

pub use crate::foundation::core::{BANDS, FrameGeometry, FrameIndex, Fps, GrayFrame};
pub use crate::foundation::error::{BitreelError, BitreelResult};
pub use crate::foundation::io::{OutputFile, ensure_parent_dir, read_full};

pub use crate::codec::ffmpeg::{
    FfmpegDecoder, FfmpegEncodeOpts, FfmpegEncoder, VideoStreamInfo, is_ffmpeg_on_path,
    probe_video,
};
pub use crate::codec::memory::{InMemoryDecoder, InMemoryEncoder};
pub use crate::codec::{Decoded, FrameDecoder, FrameEncoder, Packet};
pub use crate::config::{BitreelConfig, ExtractConfig};
pub use crate::extract::pgm::{ExtractPolicy, ExtractReport, FrameExtractor, extract_all, write_pgm};
pub use crate::pipeline::{encode_file, extract_frames};
pub use crate::plan::planner::{
    EncodeOptions, EncodeReport, Progress, SEQUENCE_END_CODE, StreamPlan, encode_stream,
};
pub use crate::protocol::header::{
    HeaderPolicy, build_header, display_name, header_payload, header_payload_strict,
};
pub use crate::raster::bands::{read_column, write_column};
pub use crate::raster::frame::{build_frame, build_frame_into, frame_bytes};
