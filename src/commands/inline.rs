use crate::extract::archive::archive;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Write a standalone copy of `file` with its includes expanded.
pub fn inline_command(file: &Path, output_dir: &Path) -> Result<()> {
    let filename = file
        .file_name()
        .with_context(|| format!("Not a file: {}", file.display()))?
        .to_string_lossy()
        .to_string();

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let written = archive(file, &filename, output_dir)
        .with_context(|| format!("Failed to inline {}", file.display()))?;
    println!("Wrote {}", written.display());
    Ok(())
}
