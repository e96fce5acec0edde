use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use confparts_types::ContentIdentifier;
use thiserror::Error;

/// Failure of a single validation attempt.
///
/// Every variant is terminal for the attempt. The lines the program wrote to
/// standard error before failing are available through [`ValidationError::stderr`].
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Validation program '{program}' could not be started: {source}")]
    Launch {
        program: PathBuf,
        source: std::io::Error,
    },

    #[error("Validation program '{program}' rejected '{content_identifier}' ({status})")]
    Rejected {
        program: PathBuf,
        content_identifier: ContentIdentifier,
        status: ExitStatus,
        stderr: Vec<String>,
    },

    #[error("Validation program '{program}' did not finish within {timeout:?}")]
    TimedOut {
        program: PathBuf,
        timeout: Duration,
        stderr: Vec<String>,
    },

    #[error("I/O with validation program '{program}' failed: {source}")]
    Io {
        program: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write validated content to '{path}': {source}")]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ValidationError {
    /// Standard error lines captured before the failure.
    ///
    /// Empty when the program could not be started at all.
    pub fn stderr(&self) -> &[String] {
        match self {
            ValidationError::Rejected { stderr, .. } | ValidationError::TimedOut { stderr, .. } => {
                stderr
            }
            ValidationError::Launch { .. }
            | ValidationError::Io { .. }
            | ValidationError::Persist { .. } => &[],
        }
    }
}

pub type Result<T> = std::result::Result<T, ValidationError>;
