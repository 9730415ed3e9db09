//! Repository fetching via git2.
//!
//! Clones run on tokio's blocking pool so the pipeline stays async end to
//! end. Any failure here only disqualifies the repository being fetched.

use crate::error::{Error, FetchError};
use crate::repos::list::RepoLocator;
use git2::Repository;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Something that can place a checkout of a repository on disk
#[async_trait::async_trait]
pub trait RepoFetcher: Send + Sync {
    /// Fetch `locator` into a new directory under `parent_dir` and return it.
    ///
    /// The directory is created by the fetcher and never existed before, so
    /// removing it later cannot touch anything else.
    async fn fetch(&self, locator: &RepoLocator, parent_dir: &Path) -> Result<PathBuf, Error>;
}

/// Clones repositories with libgit2
#[derive(Debug, Clone)]
pub struct GitFetcher {
    github_base: String,
}

impl GitFetcher {
    pub fn new(github_base: impl Into<String>) -> Self {
        Self {
            github_base: github_base.into(),
        }
    }
}

impl Default for GitFetcher {
    fn default() -> Self {
        Self::new("https://github.com")
    }
}

#[async_trait::async_trait]
impl RepoFetcher for GitFetcher {
    async fn fetch(&self, locator: &RepoLocator, parent_dir: &Path) -> Result<PathBuf, Error> {
        let url = locator.clone_url(&self.github_base);

        if !locator.has_valid_name() {
            return Err(Error::Fetch(FetchError::CloneFailed {
                url,
                source: format!("invalid repository name '{}'", locator.short_name()),
            }));
        }

        let dest = fresh_checkout_dir(parent_dir, &locator.short_name())?;
        info!("Cloning {} into {}", url, dest.display());

        let task_dest = dest.clone();
        let task_url = url.clone();
        tokio::task::spawn_blocking(move || clone_blocking(&task_url, &task_dest))
            .await
            .map_err(|e| Error::Fetch(FetchError::TaskFailed(e.to_string())))??;

        Ok(dest)
    }
}

/// Create `parent_dir/<short_name>-XXXXXX`, unique per fetch
fn fresh_checkout_dir(parent_dir: &Path, short_name: &str) -> Result<PathBuf, Error> {
    let unavailable = |e: std::io::Error| {
        Error::Fetch(FetchError::CheckoutUnavailable {
            path: parent_dir.display().to_string(),
            source: e.to_string(),
        })
    };

    fs::create_dir_all(parent_dir).map_err(unavailable)?;
    let dir = tempfile::Builder::new()
        .prefix(&format!("{}-", short_name))
        .tempdir_in(parent_dir)
        .map_err(unavailable)?;
    debug!("Reserved checkout directory {}", dir.path().display());
    Ok(dir.keep())
}

fn clone_blocking(url: &str, dest: &Path) -> Result<(), Error> {
    match Repository::clone(url, dest) {
        Ok(_) => Ok(()),
        Err(e) => {
            // dest was created for this clone only
            let _ = fs::remove_dir_all(dest);
            Err(Error::Fetch(FetchError::CloneFailed {
                url: url.to_string(),
                source: e.message().to_string(),
            }))
        }
    }
}

/// Hash of the checked-out HEAD commit, if any
pub fn head_commit(checkout: &Path) -> Option<String> {
    let repo = Repository::open(checkout).ok()?;
    let head = repo.head().ok()?;
    let commit = head.peel_to_commit().ok()?;
    Some(commit.id().to_string())
}

/// Delete a checkout directory
pub fn remove_checkout(path: &Path) -> Result<(), Error> {
    fs::remove_dir_all(path).map_err(|e| {
        Error::Fetch(FetchError::CheckoutUnavailable {
            path: path.display().to_string(),
            source: e.to_string(),
        })
    })
}
