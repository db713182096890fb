//! Command-line entry points.

pub mod mums;
pub mod nucmer;
