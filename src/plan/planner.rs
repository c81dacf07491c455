use std::io::{Read, Write};

use crate::{
    codec::{FrameEncoder, Packet},
    config::{DEFAULT_MIN_SOURCE_SIZE, DEFAULT_PROGRESS_EVERY},
    foundation::core::{FrameGeometry, FrameIndex, GrayFrame},
    foundation::error::{BitreelError, BitreelResult},
    foundation::io::read_full,
    protocol::header::{HeaderPolicy, build_header},
    raster::frame::build_frame_into,
};

/// Sequence-end code appended after the last packet so stream readers see a clean end.
pub const SEQUENCE_END_CODE: [u8; 4] = [0x00, 0x00, 0x01, 0xB7];

/// Per-run encoding options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodeOptions {
    pub geometry: FrameGeometry,
    /// Sources smaller than this many bytes are rejected.
    pub min_source_size: u64,
    /// Report progress every this many loop iterations.
    pub progress_every: u64,
    pub header_policy: HeaderPolicy,
}

impl EncodeOptions {
    /// Options for `geometry` with the default size threshold, cadence and header policy.
    pub fn new(geometry: FrameGeometry) -> Self {
        Self {
            geometry,
            min_source_size: DEFAULT_MIN_SOURCE_SIZE,
            progress_every: DEFAULT_PROGRESS_EVERY,
            header_policy: HeaderPolicy::default(),
        }
    }

    pub fn validate(&self) -> BitreelResult<()> {
        if self.progress_every == 0 {
            return Err(BitreelError::config("progress_every must be >= 1"));
        }
        Ok(())
    }

    /// Reject sources below the minimum viable size.
    pub fn check_source_size(&self, size: u64) -> BitreelResult<()> {
        if size < self.min_source_size {
            return Err(BitreelError::input(format!(
                "source is {size} bytes, below the minimum of {} bytes",
                self.min_source_size
            )));
        }
        Ok(())
    }
}

/// Frame arithmetic for one source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamPlan {
    pub size: u64,
    /// `ceil(size / width)`.
    pub chunk_count: u64,
    /// Header iteration + one per chunk + the final drain iteration.
    pub total_iterations: u64,
}

impl StreamPlan {
    pub fn new(size: u64, geometry: FrameGeometry) -> Self {
        let chunk_count = size.div_ceil(u64::from(geometry.width()));
        Self {
            size,
            chunk_count,
            total_iterations: chunk_count + 2,
        }
    }

    /// Frames that carry bytes: the header frame plus one per chunk.
    pub fn data_frames(&self) -> u64 {
        self.chunk_count + 1
    }
}

/// A progress notification from the planner loop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Progress {
    /// Loop iterations finished so far.
    pub completed: u64,
    pub total: u64,
}

impl Progress {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.completed as f64 * 100.0 / self.total as f64
        }
    }
}

/// Counters for a finished encode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EncodeReport {
    pub chunk_count: u64,
    pub frames_submitted: u64,
    pub packets_written: u64,
    /// Bytes written to the output, trailer included.
    pub bytes_written: u64,
}

/// Encode `size` bytes from `source` as banded frames, writing compressed packets to `out`.
///
/// Frame 0 carries the header for `name`; frames `1..=chunk_count` carry the source bytes,
/// the last one zero-padded. `progress` is called every `opts.progress_every` iterations and
/// once at the end.
#[tracing::instrument(skip(source, opts, encoder, out, progress), fields(width = opts.geometry.width()))]
pub fn encode_stream<R, W, E>(
    source: R,
    size: u64,
    name: &str,
    opts: &EncodeOptions,
    encoder: &mut E,
    out: &mut W,
    progress: &mut dyn FnMut(Progress),
) -> BitreelResult<EncodeReport>
where
    R: Read,
    W: Write,
    E: FrameEncoder + ?Sized,
{
    opts.validate()?;
    opts.check_source_size(size)?;

    let geometry = opts.geometry;
    let plan = StreamPlan::new(size, geometry);
    tracing::info!(
        size,
        chunks = plan.chunk_count,
        frames = plan.data_frames(),
        "planned frames"
    );

    let mut source = source.take(size);
    let mut report = EncodeReport {
        chunk_count: plan.chunk_count,
        ..EncodeReport::default()
    };
    let mut chunk = build_header(name, size, geometry.chunk_len(), opts.header_policy)?;
    let mut frame = GrayFrame::black(geometry);
    let mut consumed = 0u64;

    for i in 0..plan.total_iterations {
        if (1..=plan.chunk_count).contains(&i) {
            let n = read_chunk(&mut source, &mut chunk)?;
            if n == 0 {
                return Err(BitreelError::input(format!(
                    "source ended after {consumed} of {size} bytes"
                )));
            }
            consumed += n as u64;
        }

        if i <= plan.chunk_count {
            build_frame_into(&mut frame, &chunk, geometry)?;
            let packets = encoder.submit_frame(FrameIndex(i), &frame)?;
            report.frames_submitted += 1;
            write_packets(out, &packets, &mut report)?;
        }

        let completed = i + 1;
        if completed.is_multiple_of(opts.progress_every) || completed == plan.total_iterations {
            progress(Progress {
                completed,
                total: plan.total_iterations,
            });
        }
    }

    if consumed != size {
        return Err(BitreelError::input(format!(
            "source ended after {consumed} of {size} bytes"
        )));
    }

    let packets = encoder.flush()?;
    write_packets(out, &packets, &mut report)?;
    out.write_all(&SEQUENCE_END_CODE)
        .and_then(|()| out.flush())
        .map_err(|e| BitreelError::destination(format!("failed to write trailer: {e}")))?;
    report.bytes_written += SEQUENCE_END_CODE.len() as u64;

    tracing::debug!(?report, "encode finished");
    Ok(report)
}

/// Fill `chunk` from `source`, zeroing whatever the read could not fill.
fn read_chunk(source: &mut impl Read, chunk: &mut [u8]) -> BitreelResult<usize> {
    chunk.fill(0);
    read_full(source, chunk)
        .map_err(|e| BitreelError::input(format!("failed to read source: {e}")))
}

fn write_packets(
    out: &mut impl Write,
    packets: &[Packet],
    report: &mut EncodeReport,
) -> BitreelResult<()> {
    for packet in packets {
        out.write_all(&packet.data)
            .map_err(|e| BitreelError::destination(format!("failed to write packet: {e}")))?;
        report.packets_written += 1;
        report.bytes_written += packet.data.len() as u64;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/plan/planner.rs"]
mod tests;
