//! Repository list parsing.
//!
//! The list is plain text with one locator per line. `owner/name` lines are
//! GitHub repositories; anything that looks like a URL or a path is cloned
//! as written.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Where a repository is fetched from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RepoLocator {
    /// `owner/name` on GitHub (or the configured base)
    GitHub { owner: String, name: String },
    /// Full clone URL or local path
    Url { url: String },
}

impl RepoLocator {
    /// Parse a single non-empty line.
    ///
    /// Returns `None` when the line cannot name a checkout directory
    /// (`owner/..`, `.`, `a/b/c`).
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let locator = if looks_like_url(line) {
            RepoLocator::Url {
                url: line.to_string(),
            }
        } else {
            match line.split_once('/') {
                Some((owner, name)) if is_valid_name(owner) => RepoLocator::GitHub {
                    owner: owner.to_string(),
                    name: name.to_string(),
                },
                _ => RepoLocator::Url {
                    url: line.to_string(),
                },
            }
        };

        locator.has_valid_name().then_some(locator)
    }

    /// Check that the short name is a single, ordinary path component
    pub fn has_valid_name(&self) -> bool {
        is_valid_name(&self.short_name())
    }

    /// URL handed to git for cloning
    pub fn clone_url(&self, github_base: &str) -> String {
        match self {
            RepoLocator::GitHub { owner, name } => {
                format!("{}/{}/{}.git", github_base.trim_end_matches('/'), owner, name)
            }
            RepoLocator::Url { url } => url.clone(),
        }
    }

    /// Directory name for the checkout
    pub fn short_name(&self) -> String {
        match self {
            RepoLocator::GitHub { name, .. } => name.clone(),
            RepoLocator::Url { url } => {
                let last = url
                    .trim_end_matches('/')
                    .rsplit(['/', ':'])
                    .next()
                    .unwrap_or(url);
                last.strip_suffix(".git").unwrap_or(last).to_string()
            }
        }
    }
}

impl std::fmt::Display for RepoLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepoLocator::GitHub { owner, name } => write!(f, "{}/{}", owner, name),
            RepoLocator::Url { url } => write!(f, "{}", url),
        }
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', ':'])
}

fn looks_like_url(line: &str) -> bool {
    line.contains("://")
        || line.starts_with('/')
        || line.starts_with('.')
        || line.starts_with("git@")
        || line.ends_with(".git")
}

/// Parse repository list text.
///
/// Blank lines and `#` comments are skipped. Duplicates are dropped, keeping
/// the first occurrence.
pub fn parse_repo_list(text: &str) -> Vec<RepoLocator> {
    let mut seen = HashSet::new();
    let mut locators = Vec::new();

    for line in text.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some(locator) = RepoLocator::parse(line) else {
            warn!("Ignoring invalid repository locator: {}", line);
            continue;
        };
        if !seen.insert(locator.clone()) {
            warn!("Duplicate repository in list: {}", locator);
            continue;
        }
        locators.push(locator);
    }

    locators
}

/// Read and parse the repository list file
pub fn load_repo_list(path: &Path) -> Result<Vec<RepoLocator>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read repository list {}", path.display()))?;
    Ok(parse_repo_list(&text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_github_shorthand() {
        let locator = RepoLocator::parse("lowRISC/ibex").unwrap();
        assert_eq!(
            locator,
            RepoLocator::GitHub {
                owner: "lowRISC".to_string(),
                name: "ibex".to_string(),
            }
        );
        assert_eq!(
            locator.clone_url("https://github.com"),
            "https://github.com/lowRISC/ibex.git"
        );
        assert_eq!(locator.short_name(), "ibex");
    }

    #[test]
    fn test_clone_url_trims_base_slash() {
        let locator = RepoLocator::parse("a/b").unwrap();
        assert_eq!(
            locator.clone_url("https://example.org/"),
            "https://example.org/a/b.git"
        );
    }

    #[test]
    fn test_parse_full_url() {
        let locator = RepoLocator::parse("https://gitlab.com/group/core.git").unwrap();
        assert!(matches!(locator, RepoLocator::Url { .. }));
        assert_eq!(locator.short_name(), "core");
        assert_eq!(
            locator.clone_url("https://github.com"),
            "https://gitlab.com/group/core.git"
        );
    }

    #[test]
    fn test_parse_local_path() {
        let locator = RepoLocator::parse("/tmp/fixtures/adder/").unwrap();
        assert_eq!(locator.short_name(), "adder");
    }

    #[test]
    fn test_parse_ssh_url() {
        let locator = RepoLocator::parse("git@github.com:owner/fifo.git").unwrap();
        assert_eq!(locator.short_name(), "fifo");
    }

    #[test]
    fn test_list_skips_blank_and_comment_lines() {
        let text = "\n  owner/one  \n# comment\n\nowner/two\n   \n";
        let locators = parse_repo_list(text);
        assert_eq!(locators.len(), 2);
        assert_eq!(locators[0].to_string(), "owner/one");
        assert_eq!(locators[1].to_string(), "owner/two");
    }

    #[test]
    fn test_list_drops_duplicates() {
        let locators = parse_repo_list("a/b\nc/d\na/b\n");
        assert_eq!(locators.len(), 2);
        assert_eq!(locators[0].to_string(), "a/b");
        assert_eq!(locators[1].to_string(), "c/d");
    }

    #[test]
    fn test_rejects_names_that_escape_the_clone_dir() {
        for line in ["owner/..", "owner/.", ".", "./", "..", "/", "a/b/c", "owner/", "/tmp/.."] {
            assert_eq!(RepoLocator::parse(line), None, "accepted {:?}", line);
        }
    }

    #[test]
    fn test_list_skips_invalid_locators() {
        let locators = parse_repo_list("owner/..\n.\nowner/ok\n");
        assert_eq!(locators.len(), 1);
        assert_eq!(locators[0].to_string(), "owner/ok");
    }

    #[test]
    fn test_has_valid_name_on_constructed_locators() {
        let bad = RepoLocator::GitHub {
            owner: "o".to_string(),
            name: "..".to_string(),
        };
        assert!(!bad.has_valid_name());
        let good = RepoLocator::Url {
            url: "/srv/git/uart.git".to_string(),
        };
        assert!(good.has_valid_name());
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let result = load_repo_list(Path::new("/nonexistent/repos.txt"));
        assert!(result.is_err());
    }
}
