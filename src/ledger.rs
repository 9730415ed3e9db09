use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub const LEDGER_FILE: &str = "collected.toml";

/// Record of processed repositories and the files collected from them
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Ledger {
    #[serde(default)]
    pub repos: HashMap<String, RepoEntry>,
    #[serde(default)]
    pub files: HashMap<String, FileEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoEntry {
    pub locator: String,
    #[serde(default)]
    pub commit: Option<String>,
    pub processed_at: DateTime<Utc>,
    pub extracted: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    pub file: String,
    pub top_module: String,
    pub source_repo: String,
    pub source_path: String,
    pub sha256: String,
    pub collected_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct LedgerStats {
    pub repos_processed: usize,
    pub files_collected: usize,
    pub candidates_seen: usize,
    pub last_run: Option<DateTime<Utc>>,
}

impl Ledger {
    /// Load ledger from file, returns empty ledger if file doesn't exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read ledger from {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse ledger from {}", path.display()))
    }

    /// Save ledger to file atomically
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize ledger to TOML")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let temp_path = path.with_extension("toml.tmp");
        fs::write(&temp_path, contents)
            .with_context(|| format!("Failed to write temp ledger to {}", temp_path.display()))?;

        fs::rename(&temp_path, path)
            .with_context(|| format!("Failed to rename temp ledger to {}", path.display()))?;

        Ok(())
    }

    /// Record a processed repository, replacing any earlier entry
    pub fn record_repo(
        &mut self,
        locator: String,
        commit: Option<String>,
        extracted: usize,
        total: usize,
    ) {
        let entry = RepoEntry {
            locator: locator.clone(),
            commit,
            processed_at: Utc::now(),
            extracted,
            total,
        };
        self.repos.insert(locator, entry);
    }

    pub fn is_repo_processed(&self, locator: &str) -> bool {
        self.repos.contains_key(locator)
    }

    /// Record a collected output file
    pub fn record_file(
        &mut self,
        file: String,
        top_module: String,
        source_repo: String,
        source_path: String,
        sha256: String,
    ) {
        let entry = FileEntry {
            file: file.clone(),
            top_module,
            source_repo,
            source_path,
            sha256,
            collected_at: Utc::now(),
        };
        self.files.insert(file, entry);
    }

    /// Check if identical content has already been collected
    pub fn contains_hash(&self, sha256: &str) -> bool {
        self.files.values().any(|entry| entry.sha256 == sha256)
    }

    /// Files collected from one repository
    pub fn files_from(&self, locator: &str) -> Vec<&FileEntry> {
        let mut files: Vec<_> = self
            .files
            .values()
            .filter(|entry| entry.source_repo == locator)
            .collect();
        files.sort_by(|a, b| a.file.cmp(&b.file));
        files
    }

    pub fn stats(&self) -> LedgerStats {
        LedgerStats {
            repos_processed: self.repos.len(),
            files_collected: self.files.len(),
            candidates_seen: self.repos.values().map(|entry| entry.total).sum(),
            last_run: self.repos.values().map(|entry| entry.processed_at).max(),
        }
    }
}

/// Calculate SHA-256 hash of a file
pub fn calculate_file_hash(path: &Path) -> Result<String> {
    let contents = fs::read(path)
        .with_context(|| format!("Failed to read file for hashing: {}", path.display()))?;

    let mut hasher = Sha256::new();
    hasher.update(&contents);
    Ok(format!("{:x}", hasher.finalize()))
}
