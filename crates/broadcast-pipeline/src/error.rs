//! Pipeline error type

use std::path::PathBuf;
use thiserror::Error;

use broadcast_core::{EnumerationError, ReflectionError, ResolveError, TemplateError};
use broadcast_parser::LocatorError;

/// Fatal outcome of a discovery or generation run
///
/// Recoverable reflection failures never surface here; they are reported
/// and the class is skipped.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Enumeration(#[from] EnumerationError),

    #[error(transparent)]
    Reflection(#[from] ReflectionError),

    #[error(transparent)]
    Locator(#[from] LocatorError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Reading the template or writing the artifact failed
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Missing autoload directories could not be healed
    #[error("Could not bootstrap class locator: {message}")]
    Bootstrap { message: String },

    /// A discovery task was cancelled before producing its result
    #[error("Discovery was cancelled")]
    Cancelled,

    /// A discovery task panicked
    #[error("Discovery task failed: {0}")]
    TaskFailed(String),
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn from_join(error: tokio::task::JoinError) -> Self {
        if error.is_cancelled() {
            Self::Cancelled
        } else {
            Self::TaskFailed(error.to_string())
        }
    }
}
