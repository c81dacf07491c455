use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};

use image::ImageEncoder as _;
use image::codecs::pnm::{PnmEncoder, PnmSubtype, SampleEncoding};

use crate::codec::{Decoded, FrameDecoder};
use crate::foundation::core::GrayFrame;
use crate::foundation::error::{BitreelError, BitreelResult};

/// What to do when one extracted frame cannot be written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractPolicy {
    /// Record the failure and keep extracting.
    #[default]
    Continue,
    /// Stop at the first failed frame.
    Abort,
}

/// Writes decoded frames as numbered binary PGM files.
///
/// Frame numbers start at 1 and advance on every frame handed in, written or not, so file
/// names always match the frame's position in the decoded stream.
#[derive(Debug)]
pub struct FrameExtractor {
    out_dir: PathBuf,
    prefix: String,
    next_number: u64,
}

impl FrameExtractor {
    pub fn new(out_dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            out_dir: out_dir.into(),
            prefix: prefix.into(),
            next_number: 1,
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Path the frame numbered `n` is written to.
    pub fn frame_path(&self, n: u64) -> PathBuf {
        self.out_dir.join(format!("{}-{n}.pgm", self.prefix))
    }

    /// Write one frame. Returns its number and path on success, or its number and the error.
    pub fn write_frame(
        &mut self,
        frame: &GrayFrame,
    ) -> Result<(u64, PathBuf), (u64, BitreelError)> {
        let n = self.next_number;
        self.next_number += 1;
        let path = self.frame_path(n);
        match write_pgm(&path, frame) {
            Ok(()) => Ok((n, path)),
            Err(e) => Err((n, e)),
        }
    }
}

/// Write `frame` as a binary PGM (`P5`, max value 255) at `path`.
///
/// A frame whose sample count does not match its dimensions is rejected before anything is
/// created. A write that fails part way removes the partial file.
pub fn write_pgm(path: &Path, frame: &GrayFrame) -> BitreelResult<()> {
    if !frame.is_well_formed() {
        return Err(BitreelError::codec(format!(
            "frame has {} samples, expected {} for {}x{}",
            frame.data.len(),
            frame.width as usize * frame.height as usize,
            frame.width,
            frame.height
        )));
    }

    write_file_with(path, |writer| {
        PnmEncoder::new(writer)
            .with_subtype(PnmSubtype::Graymap(SampleEncoding::Binary))
            .write_image(
                &frame.data,
                frame.width,
                frame.height,
                image::ExtendedColorType::L8,
            )
            .map_err(|e| e.to_string())
    })
}

/// Create `path`, fill it with `write` and flush. On failure the file is removed again.
fn write_file_with<F>(path: &Path, write: F) -> BitreelResult<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<(), String>,
{
    let file = File::create(path).map_err(|e| {
        BitreelError::destination(format!("cannot open '{}' for writing: {e}", path.display()))
    })?;
    let mut writer = BufWriter::new(file);
    let written = write(&mut writer).and_then(|()| writer.flush().map_err(|e| e.to_string()));

    if let Err(e) = written {
        drop(writer);
        let _ = std::fs::remove_file(path);
        return Err(BitreelError::destination(format!(
            "failed to write '{}': {e}",
            path.display()
        )));
    }
    Ok(())
}

/// Outcome of an extraction run.
#[derive(Debug, Default)]
pub struct ExtractReport {
    /// Files written, in frame order.
    pub written: Vec<PathBuf>,
    /// Frames that could not be written.
    pub failed: Vec<(u64, BitreelError)>,
}

impl ExtractReport {
    pub fn frames_seen(&self) -> usize {
        self.written.len() + self.failed.len()
    }
}

/// Pull frames from `decoder` until end of stream and write each one.
///
/// Decoder errors are fatal. Write failures follow `policy`. `max_frames` stops early after
/// that many frames.
#[tracing::instrument(skip(decoder, extractor), fields(out_dir = %extractor.out_dir().display()))]
pub fn extract_all(
    decoder: &mut dyn FrameDecoder,
    extractor: &mut FrameExtractor,
    policy: ExtractPolicy,
    max_frames: Option<u64>,
) -> BitreelResult<ExtractReport> {
    std::fs::create_dir_all(extractor.out_dir()).map_err(|e| {
        BitreelError::destination(format!(
            "failed to create output directory '{}': {e}",
            extractor.out_dir().display()
        ))
    })?;

    let mut report = ExtractReport::default();
    loop {
        if let Some(max) = max_frames
            && report.frames_seen() as u64 >= max
        {
            tracing::debug!(max, "frame limit reached");
            break;
        }

        let frame = match decoder.next_decoded_frame()? {
            Decoded::Frame(frame) => frame,
            Decoded::EndOfStream => break,
        };

        match extractor.write_frame(&frame) {
            Ok((n, path)) => {
                tracing::debug!(frame = n, path = %path.display(), "wrote frame");
                report.written.push(path);
            }
            Err((n, e)) => {
                tracing::warn!(frame = n, error = %e, "failed to write frame");
                if policy == ExtractPolicy::Abort {
                    return Err(e);
                }
                report.failed.push((n, e));
            }
        }
    }

    tracing::info!(
        written = report.written.len(),
        failed = report.failed.len(),
        "extraction finished"
    );
    Ok(report)
}

#[cfg(test)]
#[path = "../../tests/unit/extract/pgm.rs"]
mod tests;
