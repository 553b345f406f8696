//! Pipeline error types.
//!
//! Every variant except [`Error::LookupUnavailable`] is fatal: it is raised at the
//! point of detection and unwinds to the orchestrator, which aborts the run.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an [`Error`], used by callers that only care
/// about the failure family (exit codes, summaries, tests).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Transport,
    ChecksumMismatch,
    CoordinateConflict,
    LookupUnavailable,
    Extraction,
    Install,
    Deploy,
    Io,
}

/// Errors that can occur while acquiring, verifying, staging or installing an artifact.
#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("failed to download artifact {artifact} from {url}: {reason}")]
    Transport {
        artifact: String,
        url: String,
        reason: String,
    },

    #[error("{0}")]
    ChecksumMismatch(String),

    #[error("{0}")]
    CoordinateConflict(String),

    #[error("central lookup unavailable: {0}")]
    LookupUnavailable(String),

    #[error("{0}")]
    Extraction(String),

    #[error("could not install artifact {artifact} to local repository: {reason}")]
    Install { artifact: String, reason: String },

    #[error("deployment of artifact {artifact} failed: {reason}")]
    Deploy { artifact: String, reason: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::ChecksumMismatch(_) => ErrorKind::ChecksumMismatch,
            Self::CoordinateConflict(_) => ErrorKind::CoordinateConflict,
            Self::LookupUnavailable(_) => ErrorKind::LookupUnavailable,
            Self::Extraction(_) => ErrorKind::Extraction,
            Self::Install { .. } => ErrorKind::Install,
            Self::Deploy { .. } => ErrorKind::Deploy,
            Self::Io { .. } => ErrorKind::Io,
        }
    }

    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
