//! Candidate discovery, standalone archiving and per-repository analysis

pub mod analyze;
pub mod archive;
pub mod scanner;
