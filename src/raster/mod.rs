//! Byte-to-pixel band mapping.

/// Single-column bit-plane mapping.
pub mod bands;
/// Whole-frame construction from a chunk of bytes.
pub mod frame;
