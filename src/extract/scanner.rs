//! Candidate file discovery.
//!
//! Walks a checkout and returns every file with one of the configured
//! extensions, skipping `.git`.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Find candidate source files under `root`, sorted by path.
pub fn scan_candidates(root: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let mut candidates = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git")
    {
        let entry = entry
            .with_context(|| format!("Failed to read directory entry under {}", root.display()))?;

        if !entry.file_type().is_file() {
            continue;
        }

        if has_extension(entry.path(), extensions) {
            candidates.push(entry.into_path());
        }
    }

    Ok(candidates)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|wanted| wanted == ext))
        .unwrap_or(false)
}
