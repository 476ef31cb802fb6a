//! Shared pieces of the demo binaries.

pub mod output;
pub mod sentences;
