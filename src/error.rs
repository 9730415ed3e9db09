//! Error types for rtl-collector
//!
//! Failures fall into a small set of kinds:
//! - Fetch errors (cloning or cleaning up a repository checkout)
//! - Synthesis errors (the external yosys check rejected a file set)
//! - Archive errors (expanding `include directives into a standalone file)
//! - File I/O (reading, writing, directory creation)
//!
//! Fetch, synthesis and archive errors only disqualify a single candidate.
//! The collection run keeps going.

use std::fmt;
use std::io;

/// Result type alias for rtl-collector operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for rtl-collector
#[derive(Debug)]
pub enum Error {
    /// Repository fetch errors
    Fetch(FetchError),
    /// Synthesis check errors
    Synth(SynthError),
    /// Standalone file emission errors
    Archive(ArchiveError),
    /// I/O errors
    Io(IoError),
}

/// Repository fetch errors
#[derive(Debug)]
pub enum FetchError {
    /// Clone of the remote failed (network, missing repo, auth)
    CloneFailed { url: String, source: String },
    /// Destination directory could not be prepared or removed
    CheckoutUnavailable { path: String, source: String },
    /// Background clone task panicked or was cancelled
    TaskFailed(String),
}

/// Synthesis check errors
#[derive(Debug)]
pub enum SynthError {
    /// The tool could not be started at all
    SpawnFailed { binary: String, source: String },
    /// The tool exited with a non-zero status
    ExitedUnexpectedly { status: Option<i32>, stderr: String },
    /// The tool did not finish within the configured timeout
    Timeout { secs: u64 },
    /// The tool succeeded but reported no top module
    TopModuleNotFound,
}

/// Standalone file emission errors
#[derive(Debug)]
pub enum ArchiveError {
    /// An `include directive names a file that cannot be read
    IncludeMissing { component: String, include: String },
    /// Component source is not valid UTF-8
    InvalidEncoding(String),
}

/// File I/O errors
#[derive(Debug)]
pub enum IoError {
    /// Failed to read file
    FileReadFailed { path: String, source: io::Error },
    /// Failed to write file
    FileWriteFailed { path: String, source: io::Error },
    /// Failed to create directory
    DirectoryCreateFailed { path: String, source: io::Error },
    /// Other I/O error
    Other(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Fetch(e) => write!(f, "Fetch error: {}", e),
            Error::Synth(e) => write!(f, "Synthesis error: {}", e),
            Error::Archive(e) => write!(f, "Archive error: {}", e),
            Error::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::CloneFailed { url, source } => {
                write!(f, "Failed to clone {}: {}", url, source)
            }
            FetchError::CheckoutUnavailable { path, source } => {
                write!(f, "Checkout directory {} unavailable: {}", path, source)
            }
            FetchError::TaskFailed(details) => {
                write!(f, "Clone task failed: {}", details)
            }
        }
    }
}

impl fmt::Display for SynthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SynthError::SpawnFailed { binary, source } => {
                write!(f, "Unknown: could not run {}: {}", binary, source)
            }
            SynthError::ExitedUnexpectedly { status, .. } => match status {
                Some(code) => write!(f, "Yosys exited unexpectedly (status {})", code),
                None => write!(f, "Yosys exited unexpectedly (killed by signal)"),
            },
            SynthError::Timeout { secs } => write!(f, "TIMEOUT after {}s", secs),
            SynthError::TopModuleNotFound => write!(f, "Top module not found"),
        }
    }
}

impl fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveError::IncludeMissing { component, include } => {
                write!(f, "Included file '{}' not found for {}", include, component)
            }
            ArchiveError::InvalidEncoding(path) => {
                write!(f, "Source is not valid UTF-8: {}", path)
            }
        }
    }
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IoError::FileReadFailed { path, source } => {
                write!(f, "Failed to read {}: {}", path, source)
            }
            IoError::FileWriteFailed { path, source } => {
                write!(f, "Failed to write {}: {}", path, source)
            }
            IoError::DirectoryCreateFailed { path, source } => {
                write!(f, "Failed to create directory {}: {}", path, source)
            }
            IoError::Other(source) => write!(f, "{}", source),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(IoError::FileReadFailed { source, .. })
            | Error::Io(IoError::FileWriteFailed { source, .. })
            | Error::Io(IoError::DirectoryCreateFailed { source, .. })
            | Error::Io(IoError::Other(source)) => Some(source),
            _ => None,
        }
    }
}

impl std::error::Error for FetchError {}
impl std::error::Error for SynthError {}
impl std::error::Error for ArchiveError {}
impl std::error::Error for IoError {}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(IoError::Other(err))
    }
}

impl From<SynthError> for Error {
    fn from(err: SynthError) -> Self {
        Error::Synth(err)
    }
}

impl From<FetchError> for Error {
    fn from(err: FetchError) -> Self {
        Error::Fetch(err)
    }
}

impl From<ArchiveError> for Error {
    fn from(err: ArchiveError) -> Self {
        Error::Archive(err)
    }
}

impl Error {
    /// Check if the error only disqualifies the current candidate
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            Error::Fetch(_) | Error::Synth(_) | Error::Archive(_)
        )
    }

    /// Get formatted context string for logging
    pub fn context(&self) -> String {
        match self {
            Error::Fetch(e) => format!("fetch: {}", e),
            Error::Synth(e) => format!("synth: {}", e),
            Error::Archive(e) => format!("archive: {}", e),
            Error::Io(e) => format!("io: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn test_fetch_error_display() {
        let err = Error::Fetch(FetchError::CloneFailed {
            url: "https://github.com/a/b.git".to_string(),
            source: "not found".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "Fetch error: Failed to clone https://github.com/a/b.git: not found"
        );
    }

    #[test]
    fn test_synth_error_reasons() {
        assert_eq!(
            SynthError::TopModuleNotFound.to_string(),
            "Top module not found"
        );
        assert_eq!(
            SynthError::Timeout { secs: 1000 }.to_string(),
            "TIMEOUT after 1000s"
        );
        assert_eq!(
            SynthError::ExitedUnexpectedly {
                status: Some(1),
                stderr: String::new(),
            }
            .to_string(),
            "Yosys exited unexpectedly (status 1)"
        );
    }

    #[test]
    fn test_archive_error_display() {
        let err = Error::Archive(ArchiveError::IncludeMissing {
            component: "rtl/top.sv".to_string(),
            include: "defs.svh".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "Archive error: Included file 'defs.svh' not found for rtl/top.sv"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io(IoError::Other(_))));
        assert!(!err.is_skippable());
    }

    #[test]
    fn test_is_skippable() {
        assert!(Error::from(SynthError::TopModuleNotFound).is_skippable());
        assert!(Error::from(FetchError::TaskFailed("cancelled".to_string())).is_skippable());
    }

    #[test]
    fn test_context() {
        let err = Error::Synth(SynthError::TopModuleNotFound);
        assert_eq!(err.context(), "synth: Top module not found");
    }

    #[test]
    fn test_error_source_chain() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::Io(IoError::Other(io_err));
        assert!(err.source().is_some());
    }
}
