/// Frame 0 payload.
pub mod header;
