//! Parser and locator error types

use std::path::PathBuf;
use thiserror::Error;

/// Source that could not be tokenized or parsed
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct ParseError {
    /// 1-based line the problem was detected on
    pub line: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Specialized Result type for parser operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Failure building a class locator
#[derive(Debug, Error)]
pub enum LocatorError {
    /// A namespace prefix points at a directory that does not exist
    ///
    /// Recoverable by creating the directory and building the locator again.
    #[error("The directory \"{}\" for prefix \"{prefix}\" is not a directory", path.display())]
    MissingDirectory { prefix: String, path: PathBuf },

    #[error("Failed to index '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
