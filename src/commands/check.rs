use crate::config::Config;
use crate::synth::yosys::YosysChecker;
use crate::synth::SynthesisChecker;
use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

/// Check the given files together and report the top module.
pub async fn check_command(config: &Config, files: Vec<PathBuf>) -> Result<()> {
    if files.is_empty() {
        anyhow::bail!("No files given to check");
    }

    let checker = YosysChecker::with_config(&config.synth);
    match checker.check(&files).await {
        Ok(top) => {
            println!("{} top module: {}", "✓".green(), top);
            Ok(())
        }
        Err(e) => {
            println!("{} {}", "✗".red(), e);
            anyhow::bail!("{} rejected {} file(s)", checker.name(), files.len())
        }
    }
}
