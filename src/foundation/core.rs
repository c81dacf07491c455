use crate::foundation::error::{BitreelError, BitreelResult};

/// Number of horizontal bands per frame; one band per bit of a byte.
pub const BANDS: u32 = 8;

/// Presentation order index of a submitted frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameIndex(pub u64);

/// Immutable frame size shared by every frame of one run.
///
/// `height` is always a non-zero multiple of [`BANDS`], so every band spans the same number of
/// rows. The only way to get one is [`FrameGeometry::new`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameGeometry {
    width: u32,
    height: u32,
}

impl FrameGeometry {
    /// Validate and build a geometry.
    pub fn new(width: u32, height: u32) -> BitreelResult<Self> {
        if width == 0 || height == 0 {
            return Err(BitreelError::config(format!(
                "frame geometry must be non-zero, got {width}x{height}"
            )));
        }
        if !height.is_multiple_of(BANDS) {
            return Err(BitreelError::config(format!(
                "frame height {height} is not divisible by {BANDS} bands"
            )));
        }
        Ok(Self { width, height })
    }

    /// Columns per frame, which is also the number of payload bytes per frame.
    pub fn width(self) -> u32 {
        self.width
    }

    /// Rows per frame.
    pub fn height(self) -> u32 {
        self.height
    }

    /// Rows covered by one band.
    pub fn band_height(self) -> u32 {
        self.height / BANDS
    }

    /// Payload bytes carried by one frame.
    pub fn chunk_len(self) -> usize {
        self.width as usize
    }

    /// Length of a full pixel buffer.
    pub fn pixel_len(self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Row-major 8-bit grayscale pixel buffer of a known geometry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl GrayFrame {
    /// All-black frame.
    pub fn black(geometry: FrameGeometry) -> Self {
        Self {
            width: geometry.width(),
            height: geometry.height(),
            data: vec![0u8; geometry.pixel_len()],
        }
    }

    /// Wrap raw samples, checking the length against the dimensions.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> BitreelResult<Self> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(BitreelError::codec(format!(
                "gray frame size mismatch: got {} bytes, expected {expected} for {width}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Whether `data` holds exactly `width * height` samples.
    pub fn is_well_formed(&self) -> bool {
        self.data.len() == self.width as usize * self.height as usize
    }
}

/// Frames-per-second as a rational, passed through to the encoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    pub num: u32,
    pub den: u32, // must be > 0
}

impl Fps {
    pub fn new(num: u32, den: u32) -> BitreelResult<Self> {
        if den == 0 {
            return Err(BitreelError::config("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(BitreelError::config("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
