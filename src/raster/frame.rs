use crate::{
    foundation::core::{FrameGeometry, GrayFrame},
    foundation::error::{BitreelError, BitreelResult},
    raster::bands,
};

/// Build one frame from `chunk`, one byte per column.
///
/// A chunk shorter than the frame width renders its missing trailing columns as zero bytes
/// (eight black bands). A chunk longer than the width is rejected.
pub fn build_frame(chunk: &[u8], geometry: FrameGeometry) -> BitreelResult<GrayFrame> {
    let mut frame = GrayFrame::black(geometry);
    build_frame_into(&mut frame, chunk, geometry)?;
    Ok(frame)
}

/// Same as [`build_frame`], overwriting every pixel of an existing buffer.
pub fn build_frame_into(
    frame: &mut GrayFrame,
    chunk: &[u8],
    geometry: FrameGeometry,
) -> BitreelResult<()> {
    if chunk.len() > geometry.chunk_len() {
        return Err(BitreelError::config(format!(
            "chunk of {} bytes does not fit a frame {} columns wide",
            chunk.len(),
            geometry.width()
        )));
    }
    if frame.width != geometry.width()
        || frame.height != geometry.height()
        || frame.data.len() != geometry.pixel_len()
    {
        return Err(BitreelError::config(format!(
            "frame buffer is {}x{}, expected {}x{}",
            frame.width,
            frame.height,
            geometry.width(),
            geometry.height()
        )));
    }

    for x in 0..geometry.width() {
        let value = chunk.get(x as usize).copied().unwrap_or(0);
        bands::write_column(&mut frame.data, geometry, x, value);
    }
    Ok(())
}

/// Sample every column of `frame` back into the bytes it carries.
pub fn frame_bytes(frame: &GrayFrame, geometry: FrameGeometry) -> BitreelResult<Vec<u8>> {
    if frame.data.len() != geometry.pixel_len() {
        return Err(BitreelError::config(format!(
            "frame buffer has {} samples, expected {}",
            frame.data.len(),
            geometry.pixel_len()
        )));
    }
    Ok((0..geometry.width())
        .map(|x| bands::read_column(&frame.data, geometry, x))
        .collect())
}

#[cfg(test)]
#[path = "../../tests/unit/raster/frame.rs"]
mod tests;
