use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::{
    codec::{FrameDecoder, FrameEncoder},
    config::BitreelConfig,
    extract::pgm::{ExtractReport, FrameExtractor, extract_all},
    foundation::core::FrameGeometry,
    foundation::error::{BitreelError, BitreelResult},
    foundation::io::OutputFile,
    plan::planner::{EncodeOptions, EncodeReport, Progress, encode_stream},
    protocol::header::display_name,
};

/// Encode the file at `input` into a compressed frame stream at `output`.
///
/// The source is measured and checked before `make_encoder` runs, so a rejected source never
/// starts a codec. On any failure the partially written `output` is removed.
pub fn encode_file<E, F>(
    input: &Path,
    output: &Path,
    opts: &EncodeOptions,
    make_encoder: F,
    progress: &mut dyn FnMut(Progress),
) -> BitreelResult<EncodeReport>
where
    E: FrameEncoder,
    F: FnOnce(FrameGeometry) -> BitreelResult<E>,
{
    opts.validate()?;

    let file = File::open(input).map_err(|e| {
        BitreelError::input(format!("cannot open source '{}': {e}", input.display()))
    })?;
    let size = file
        .metadata()
        .map_err(|e| BitreelError::input(format!("cannot stat '{}': {e}", input.display())))?
        .len();
    opts.check_source_size(size)?;

    let name = display_name(input);
    let mut encoder = make_encoder(opts.geometry)?;
    let mut out = OutputFile::create(output)?;

    let report = encode_stream(
        BufReader::new(file),
        size,
        &name,
        opts,
        &mut encoder,
        &mut out,
        progress,
    )?;
    let path = out.commit()?;

    tracing::info!(
        output = %path.display(),
        frames = report.frames_submitted,
        bytes = report.bytes_written,
        "encode complete"
    );
    Ok(report)
}

/// Dump every decoded frame of `decoder` into `out_dir` using the extraction settings in `cfg`.
pub fn extract_frames(
    decoder: &mut dyn FrameDecoder,
    out_dir: &Path,
    cfg: &BitreelConfig,
) -> BitreelResult<ExtractReport> {
    let mut extractor = FrameExtractor::new(out_dir, cfg.extract.prefix.clone());
    extract_all(
        decoder,
        &mut extractor,
        cfg.extract.policy,
        cfg.extract.max_frames,
    )
}
