use std::path::Path;

use crate::foundation::error::{BitreelError, BitreelResult};

/// How to treat a header payload that does not fit in one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderPolicy {
    /// Cut the payload to the frame width.
    #[default]
    Truncate,
    /// Refuse to encode.
    Strict,
}

/// Payload text for frame 0: `"<name>\n<size>"` with the size in decimal ASCII.
fn header_text(name: &str, size: u64) -> Vec<u8> {
    format!("{name}\n{size}").into_bytes()
}

/// Build the frame-0 payload, zero-padded (or cut) to exactly `width` bytes.
pub fn header_payload(name: &str, size: u64, width: usize) -> Vec<u8> {
    let mut payload = header_text(name, size);
    payload.resize(width, 0);
    payload
}

/// Like [`header_payload`], but fails when the text would not fit in `width` bytes.
pub fn header_payload_strict(name: &str, size: u64, width: usize) -> BitreelResult<Vec<u8>> {
    let text = header_text(name, size);
    if text.len() > width {
        return Err(BitreelError::config(format!(
            "header for '{name}' needs {} bytes but a frame only carries {width}",
            text.len()
        )));
    }
    Ok(header_payload(name, size, width))
}

/// Build the payload according to `policy`.
pub fn build_header(
    name: &str,
    size: u64,
    width: usize,
    policy: HeaderPolicy,
) -> BitreelResult<Vec<u8>> {
    match policy {
        HeaderPolicy::Truncate => {
            let payload = header_payload(name, size, width);
            if header_text(name, size).len() > width {
                tracing::warn!(name, width, "header payload truncated to frame width");
            }
            Ok(payload)
        }
        HeaderPolicy::Strict => header_payload_strict(name, size, width),
    }
}

/// Display name for a source path: its final component, or the whole path if it has none.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

#[cfg(test)]
#[path = "../../tests/unit/protocol/header.rs"]
mod tests;
