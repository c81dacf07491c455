/// Decoded frame dumping as PGM files.
pub mod pgm;
