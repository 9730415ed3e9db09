//! Collect command: runs the whole extraction pipeline.
//!
//! Reads the repository list, then for each repository in order: fetch,
//! analyze, record in the ledger, remove the checkout. A repository that
//! cannot be fetched or analyzed is reported and skipped; the run goes on.

use crate::config::Config;
use crate::extract::analyze::{analyze, AnalyzeOptions};
use crate::ledger::{Ledger, LEDGER_FILE};
use crate::repos::fetch::{head_commit, remove_checkout, GitFetcher, RepoFetcher};
use crate::repos::list::{load_repo_list, RepoLocator};
use crate::synth::yosys::YosysChecker;
use crate::synth::SynthesisChecker;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// What happened to one listed repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepoStatus {
    Analyzed,
    FetchFailed,
    AnalyzeFailed,
    AlreadyProcessed,
}

#[derive(Debug, Clone, Serialize)]
pub struct RepoOutcome {
    pub locator: String,
    pub status: RepoStatus,
    pub extracted: usize,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Totals for a whole run
#[derive(Debug, Clone, Serialize)]
pub struct CollectSummary {
    pub extracted: usize,
    pub total: usize,
    pub repos: Vec<RepoOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CollectSummary {
    pub fn failed(&self) -> impl Iterator<Item = &RepoOutcome> {
        self.repos
            .iter()
            .filter(|r| matches!(r.status, RepoStatus::FetchFailed | RepoStatus::AnalyzeFailed))
    }
}

/// Command-line overrides for a collection run
#[derive(Debug, Clone, Default)]
pub struct CollectOptions {
    pub resume: bool,
    pub report: Option<PathBuf>,
}

/// Run the collect command with real git and yosys.
pub async fn collect_command(config: Config, options: CollectOptions) -> Result<()> {
    let locators = load_repo_list(&config.repos_file)?;
    println!(
        "Collecting from {} repositories into {}",
        locators.len(),
        config.output_dir.display()
    );

    let ledger_path = config.output_dir.join(LEDGER_FILE);
    let mut ledger = Ledger::load(&ledger_path).context("Failed to load ledger")?;

    let fetcher = GitFetcher::new(config.github_base.clone());
    let checker = YosysChecker::with_config(&config.synth);

    let pb = progress_bar(locators.len() as u64);
    let summary = run_collection(
        &locators,
        &fetcher,
        &checker,
        &config,
        &mut ledger,
        &ledger_path,
        options.resume,
        &pb,
    )
    .await?;
    pb.finish_and_clear();

    if let Some(report_path) = &options.report {
        let json = serde_json::to_string_pretty(&summary)?;
        fs::write(report_path, json)
            .with_context(|| format!("Failed to write report to {}", report_path.display()))?;
    }

    print_summary(&summary);
    Ok(())
}

/// Process every locator in order.
///
/// The ledger is saved after each repository so an interrupted run can be
/// resumed with `resume`.
#[allow(clippy::too_many_arguments)]
pub async fn run_collection(
    locators: &[RepoLocator],
    fetcher: &dyn RepoFetcher,
    checker: &dyn SynthesisChecker,
    config: &Config,
    ledger: &mut Ledger,
    ledger_path: &Path,
    resume: bool,
    pb: &ProgressBar,
) -> Result<CollectSummary> {
    let started_at = Utc::now();

    fs::create_dir_all(&config.output_dir).with_context(|| {
        format!("Failed to create output directory {}", config.output_dir.display())
    })?;
    fs::create_dir_all(&config.clone_dir).with_context(|| {
        format!("Failed to create clone directory {}", config.clone_dir.display())
    })?;

    let options = AnalyzeOptions {
        output_dir: config.output_dir.clone(),
        extensions: config.synth.extensions.clone(),
    };

    let mut repos = Vec::with_capacity(locators.len());
    let mut extracted = 0;
    let mut total = 0;

    for locator in locators {
        let name = locator.to_string();
        pb.set_message(name.clone());

        if resume && ledger.is_repo_processed(&name) {
            info!("Skipping already processed {}", name);
            repos.push(outcome(&name, RepoStatus::AlreadyProcessed, 0, 0, None));
            pb.inc(1);
            continue;
        }

        let checkout = match fetcher.fetch(locator, &config.clone_dir).await {
            Ok(path) => path,
            Err(e) => {
                warn!("Skipping {}: {}", name, e.context());
                repos.push(outcome(&name, RepoStatus::FetchFailed, 0, 0, Some(e.to_string())));
                pb.inc(1);
                continue;
            }
        };

        if overlaps_output(&checkout, &config.output_dir) {
            // Leave it on disk: removing it would take collected modules with it
            error!(
                "Checkout {} contains the output directory, skipping {}",
                checkout.display(),
                name
            );
            repos.push(outcome(
                &name,
                RepoStatus::FetchFailed,
                0,
                0,
                Some(format!("checkout {} overlaps output directory", checkout.display())),
            ));
            pb.inc(1);
            continue;
        }

        let commit = head_commit(&checkout);
        match analyze(&checkout, &name, checker, &options, ledger).await {
            Ok(report) => {
                extracted += report.extracted;
                total += report.total;
                ledger.record_repo(name.clone(), commit, report.extracted, report.total);
                repos.push(outcome(
                    &name,
                    RepoStatus::Analyzed,
                    report.extracted,
                    report.total,
                    None,
                ));
            }
            Err(e) => {
                error!("Failed to analyze {}: {:#}", name, e);
                repos.push(outcome(
                    &name,
                    RepoStatus::AnalyzeFailed,
                    0,
                    0,
                    Some(format!("{:#}", e)),
                ));
            }
        }

        if !config.keep_clones {
            if let Err(e) = remove_checkout(&checkout) {
                warn!("{}", e);
            }
        }

        ledger.save(ledger_path).context("Failed to save ledger")?;
        pb.inc(1);
    }

    info!("Summary: {}/{}", extracted, total);

    Ok(CollectSummary {
        extracted,
        total,
        repos,
        started_at,
        finished_at: Utc::now(),
    })
}

/// True if `output_dir` is `checkout` or lies beneath it
fn overlaps_output(checkout: &Path, output_dir: &Path) -> bool {
    let checkout = fs::canonicalize(checkout).unwrap_or_else(|_| checkout.to_path_buf());
    let output = fs::canonicalize(output_dir).unwrap_or_else(|_| output_dir.to_path_buf());
    output.starts_with(&checkout)
}

fn outcome(
    locator: &str,
    status: RepoStatus,
    extracted: usize,
    total: usize,
    error: Option<String>,
) -> RepoOutcome {
    RepoOutcome {
        locator: locator.to_string(),
        status,
        extracted,
        total,
        error,
    }
}

fn progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if let Ok(style) =
        ProgressStyle::default_bar().template("{spinner:.cyan} [{bar:30}] {pos}/{len} {msg}")
    {
        pb.set_style(style);
    }
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn print_summary(summary: &CollectSummary) {
    println!();
    println!("=== Collection Complete ===");
    println!("  Repositories:  {}", summary.repos.len());
    println!(
        "Summary: {}",
        format!("{}/{}", summary.extracted, summary.total).green()
    );

    let failed: Vec<_> = summary.failed().collect();
    if !failed.is_empty() {
        println!();
        println!("{}", "Skipped:".yellow());
        for repo in failed {
            println!(
                "  - {}: {}",
                repo.locator,
                repo.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
}
