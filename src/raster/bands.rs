use crate::foundation::core::{BANDS, FrameGeometry};

/// Intensity written for a set bit.
pub const WHITE: u8 = 255;
/// Intensity written for a clear bit.
pub const BLACK: u8 = 0;

/// Samples at or above this value read back as a set bit.
const THRESHOLD: u8 = 128;

/// Paint byte `value` into column `x` of `pixels`.
///
/// Band `k` (top to bottom) carries bit `k` counted from the most significant bit. Every row of
/// a band gets the same intensity. Only column `x` is touched.
///
/// # Panics
///
/// Panics if `x` is outside the geometry or `pixels` is shorter than `geometry.pixel_len()`.
pub fn write_column(pixels: &mut [u8], geometry: FrameGeometry, x: u32, value: u8) {
    assert!(x < geometry.width() && pixels.len() >= geometry.pixel_len());

    let width = geometry.width() as usize;
    let band_height = geometry.band_height() as usize;
    let x = x as usize;

    for band in 0..BANDS as usize {
        let bit = (value >> (7 - band)) & 1;
        let level = if bit == 1 { WHITE } else { BLACK };
        let first_row = band * band_height;
        for y in first_row..first_row + band_height {
            pixels[y * width + x] = level;
        }
    }
}

/// Read the byte painted into column `x`, sampling the middle row of each band.
///
/// Thresholding makes this tolerant of the small deviations lossy compression introduces.
///
/// # Panics
///
/// Panics if `x` is outside the geometry or `pixels` is shorter than `geometry.pixel_len()`.
pub fn read_column(pixels: &[u8], geometry: FrameGeometry, x: u32) -> u8 {
    assert!(x < geometry.width() && pixels.len() >= geometry.pixel_len());
    let width = geometry.width() as usize;
    let band_height = geometry.band_height() as usize;
    let x = x as usize;

    let mut value = 0u8;
    for band in 0..BANDS as usize {
        let y = band * band_height + band_height / 2;
        let bit = u8::from(pixels[y * width + x] >= THRESHOLD);
        value = (value << 1) | bit;
    }
    value
}

#[cfg(test)]
#[path = "../../tests/unit/raster/bands.rs"]
mod tests;
