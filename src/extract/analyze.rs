//! Per-repository extraction.
//!
//! Every candidate is checked on its own. Passing files are archived under
//! their top module name and the archived copy is checked again; only copies
//! that pass both checks stay in the output directory.

use crate::error::{Error, IoError};
use crate::extract::archive::archive;
use crate::extract::scanner::scan_candidates;
use crate::ledger::{calculate_file_hash, Ledger};
use crate::synth::yosys::check_file;
use crate::synth::SynthesisChecker;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Where and what to extract
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub output_dir: PathBuf,
    pub extensions: Vec<String>,
}

/// Outcome of analyzing one checkout
#[derive(Debug, Default, Clone, Serialize)]
pub struct AnalyzeReport {
    /// Standalone modules written to the output directory
    pub extracted: usize,
    /// Candidate files examined
    pub total: usize,
    /// Candidates the checker rejected outright
    pub dropped: usize,
    /// Archived copies that failed the second check
    pub rejected: usize,
    /// Archived copies identical to something already collected
    pub duplicates: usize,
    /// Paths written, in candidate order
    pub collected: Vec<PathBuf>,
}

enum Outcome {
    Collected(PathBuf),
    Dropped,
    Rejected,
    Duplicate,
}

/// Analyze all candidate files under `repo_dir`.
///
/// `source_repo` is the locator recorded in the ledger for collected files.
pub async fn analyze(
    repo_dir: &Path,
    source_repo: &str,
    checker: &dyn SynthesisChecker,
    options: &AnalyzeOptions,
    ledger: &mut Ledger,
) -> Result<AnalyzeReport> {
    info!("Start analyzing [ {} ]", display_name(repo_dir));

    let candidates = scan_candidates(repo_dir, &options.extensions)
        .with_context(|| format!("Failed to scan {}", repo_dir.display()))?;

    let mut report = AnalyzeReport {
        total: candidates.len(),
        ..Default::default()
    };

    for candidate in &candidates {
        match process_candidate(candidate, repo_dir, source_repo, checker, options, ledger).await? {
            Outcome::Collected(path) => {
                report.extracted += 1;
                report.collected.push(path);
            }
            Outcome::Dropped => report.dropped += 1,
            Outcome::Rejected => report.rejected += 1,
            Outcome::Duplicate => report.duplicates += 1,
        }
    }

    info!(
        "Extracted {} standalone modules out of {} files.",
        report.extracted, report.total
    );
    Ok(report)
}

async fn process_candidate(
    candidate: &Path,
    repo_dir: &Path,
    source_repo: &str,
    checker: &dyn SynthesisChecker,
    options: &AnalyzeOptions,
    ledger: &mut Ledger,
) -> Result<Outcome> {
    let top_module = match check_file(checker, candidate).await {
        Ok(top) => top,
        Err(_) => {
            debug!("Drop \"{}\"", candidate.display());
            return Ok(Outcome::Dropped);
        }
    };

    let filename = output_filename(&top_module, candidate);
    let output_path = match archive(candidate, &filename, &options.output_dir) {
        Ok(path) => path,
        Err(e) if is_candidate_failure(&e) => {
            warn!("Could not archive {}: {}", candidate.display(), e);
            return Ok(Outcome::Rejected);
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to archive {}", candidate.display()));
        }
    };

    if check_file(checker, &output_path).await.is_err() {
        error!(
            "Failed to replace the `include directive in {}",
            candidate.display()
        );
        discard(&output_path)?;
        return Ok(Outcome::Rejected);
    }

    let hash = calculate_file_hash(&output_path)?;
    if ledger.contains_hash(&hash) {
        debug!(
            "Duplicate of an already collected module: {}",
            candidate.display()
        );
        discard(&output_path)?;
        return Ok(Outcome::Duplicate);
    }

    let source_path = candidate
        .strip_prefix(repo_dir)
        .unwrap_or(candidate)
        .to_string_lossy()
        .to_string();
    ledger.record_file(
        display_name(&output_path),
        top_module,
        source_repo.to_string(),
        source_path,
        hash,
    );

    Ok(Outcome::Collected(output_path))
}

/// `<top>.<ext>`, keeping the candidate's extension
fn output_filename(top_module: &str, candidate: &Path) -> String {
    let ext = candidate
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("sv");
    format!("{}.{}", top_module, ext)
}

fn is_candidate_failure(err: &Error) -> bool {
    err.is_skippable() || matches!(err, Error::Io(IoError::FileReadFailed { .. }))
}

fn discard(path: &Path) -> Result<()> {
    fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
