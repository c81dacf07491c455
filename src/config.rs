use std::path::Path;

use anyhow::Context as _;

use crate::{
    codec::ffmpeg::FfmpegEncodeOpts,
    extract::pgm::ExtractPolicy,
    foundation::core::FrameGeometry,
    foundation::error::{BitreelError, BitreelResult},
    plan::planner::EncodeOptions,
    protocol::header::HeaderPolicy,
};

pub const DEFAULT_WIDTH: u32 = 1280;
pub const DEFAULT_HEIGHT: u32 = 32;
/// Ten frames' worth of payload at the default width.
pub const DEFAULT_MIN_SOURCE_SIZE: u64 = 12_800;
pub const DEFAULT_PROGRESS_EVERY: u64 = 20;

/// Run configuration, loadable from JSON. Missing fields take their defaults.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BitreelConfig {
    pub width: u32,
    pub height: u32,
    pub min_source_size: u64,
    pub progress_every: u64,
    pub header_policy: HeaderPolicy,
    pub ffmpeg: FfmpegEncodeOpts,
    pub extract: ExtractConfig,
}

/// Decode-side settings.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractConfig {
    /// File name prefix; files are named `<prefix>-<n>.pgm`.
    pub prefix: String,
    pub policy: ExtractPolicy,
    pub max_frames: Option<u64>,
}

impl Default for BitreelConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            min_source_size: DEFAULT_MIN_SOURCE_SIZE,
            progress_every: DEFAULT_PROGRESS_EVERY,
            header_policy: HeaderPolicy::default(),
            ffmpeg: FfmpegEncodeOpts::default(),
            extract: ExtractConfig::default(),
        }
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            prefix: "frame".to_string(),
            policy: ExtractPolicy::default(),
            max_frames: None,
        }
    }
}

impl BitreelConfig {
    /// Read a JSON config file.
    pub fn load(path: &Path) -> BitreelResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> BitreelResult<Self> {
        serde_json::from_str(text)
            .map_err(|e| BitreelError::config(format!("invalid config JSON: {e}")))
    }

    pub fn geometry(&self) -> BitreelResult<FrameGeometry> {
        FrameGeometry::new(self.width, self.height)
    }

    pub fn validate(&self) -> BitreelResult<()> {
        self.encode_options()?.validate()?;
        self.ffmpeg.validate()?;
        if self.extract.prefix.is_empty() || self.extract.prefix.contains(['/', '\\']) {
            return Err(BitreelError::config(format!(
                "extract prefix '{}' must be a non-empty file name",
                self.extract.prefix
            )));
        }
        Ok(())
    }

    pub fn encode_options(&self) -> BitreelResult<EncodeOptions> {
        Ok(EncodeOptions {
            geometry: self.geometry()?,
            min_source_size: self.min_source_size,
            progress_every: self.progress_every,
            header_policy: self.header_policy,
        })
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
