pub mod client;
pub mod prompt;
pub mod retry;

pub use client::{parse_resolution, OpenAiOracle, Oracle, ResolutionOracle};
