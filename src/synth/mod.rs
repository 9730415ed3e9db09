//! Synthesis checks against external tools
//!
//! A check takes a set of source files and either names the design's top
//! module or explains why the files do not synthesize.

pub mod yosys;

use crate::error::SynthError;
use std::path::PathBuf;

/// Common trait for synthesis checkers
#[async_trait::async_trait]
pub trait SynthesisChecker: Send + Sync {
    /// Check the files together; returns the top module name on success
    async fn check(&self, files: &[PathBuf]) -> Result<String, SynthError>;

    /// Get the checker name (e.g., "yosys")
    fn name(&self) -> &str;
}
