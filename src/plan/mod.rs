//! Encode-pass orchestration: frame counting, chunk iteration, flush and trailer.

pub mod planner;
