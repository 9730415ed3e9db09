//! Standalone snippet emission.
//!
//! Copies a component into the output directory with every `` `include ``
//! directive replaced by the contents of the included file, so the result
//! can be checked and used on its own.

use crate::error::{ArchiveError, Error, IoError, Result};
use regex::Regex;
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

const PREFIX_LEN: usize = 5;
const LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

fn include_directive() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"`include\s+"(?P<filename>[\w\./]+)""#).expect("include pattern is valid")
    })
}

/// Write `component` to `output_dir/filename` with includes expanded.
///
/// If the name is taken, a five-letter prefix and `_` are prepended until a
/// free name is found. Returns the path that was written.
pub fn archive(component: &Path, filename: &str, output_dir: &Path) -> Result<PathBuf> {
    let source = read_source(component)?;
    let expanded = expand_includes(component, &source)?;

    let output_path = free_output_path(component, filename, output_dir);
    fs::write(&output_path, expanded).map_err(|source| {
        Error::Io(IoError::FileWriteFailed {
            path: output_path.display().to_string(),
            source,
        })
    })?;

    debug!("Archived {} as {}", component.display(), output_path.display());
    Ok(output_path)
}

/// Replace each `include directive with the included file's text.
///
/// Included paths resolve against the component's directory. Only one level
/// is expanded.
pub fn expand_includes(component: &Path, source: &str) -> Result<String> {
    let base = component.parent().unwrap_or_else(|| Path::new("."));
    let mut out = String::with_capacity(source.len());
    let mut last = 0;

    for caps in include_directive().captures_iter(source) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.name("filename")) else {
            continue;
        };
        out.push_str(&source[last..whole.start()]);

        let included = fs::read_to_string(base.join(name.as_str())).map_err(|_| {
            Error::Archive(ArchiveError::IncludeMissing {
                component: component.display().to_string(),
                include: name.as_str().to_string(),
            })
        })?;
        out.push_str(&included);
        last = whole.end();
    }

    out.push_str(&source[last..]);
    Ok(out)
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::InvalidData {
            Error::Archive(ArchiveError::InvalidEncoding(path.display().to_string()))
        } else {
            Error::Io(IoError::FileReadFailed {
                path: path.display().to_string(),
                source,
            })
        }
    })
}

fn free_output_path(component: &Path, filename: &str, output_dir: &Path) -> PathBuf {
    let mut output_path = output_dir.join(filename);
    let mut attempt = 0u32;
    while output_path.exists() {
        output_path = output_dir.join(format!("{}{}", collision_prefix(component, attempt), filename));
        attempt += 1;
    }
    output_path
}

/// Five ASCII letters plus `_`, derived from the component path and attempt
fn collision_prefix(component: &Path, attempt: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(component.to_string_lossy().as_bytes());
    hasher.update(attempt.to_le_bytes());
    let digest = hasher.finalize();

    let mut prefix: String = digest
        .iter()
        .take(PREFIX_LEN)
        .map(|b| LETTERS[*b as usize % LETTERS.len()] as char)
        .collect();
    prefix.push('_');
    prefix
}
