//! Output rendering for lessons, progress and reference material.

pub mod generator;

pub use generator::*;
