//! Error taxonomy for the discovery stages
//!
//! Only [`ReflectionError::NotFound`] is recoverable. Everything else aborts a run.

use std::path::PathBuf;
use thiserror::Error;

/// Failure reflecting a single class
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReflectionError {
    /// The identifier (or one of its ancestors) could not be resolved to a definition
    #[error("{message}")]
    NotFound {
        /// Class whose reflection was requested
        class: String,
        /// Description of what could not be located
        message: String,
    },

    /// The definition exists but its shape is unexpected (malformed source, cycles, ...)
    #[error("Failed to reflect \"{class}\": {message}")]
    Fatal {
        /// Class whose reflection was requested
        class: String,
        /// Underlying cause
        message: String,
    },
}

impl ReflectionError {
    pub fn not_found(class: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotFound {
            class: class.into(),
            message: message.into(),
        }
    }

    pub fn fatal(class: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fatal {
            class: class.into(),
            message: message.into(),
        }
    }

    /// Class the failure belongs to
    pub fn class(&self) -> &str {
        match self {
            Self::NotFound { class, .. } | Self::Fatal { class, .. } => class,
        }
    }

    /// Check if this error only drops the current item
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Failure listing source directories
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Failed to read manifest '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid manifest '{path}': {message}")]
    Manifest { path: PathBuf, message: String },
}

/// Failure turning directories into class identifiers
#[derive(Debug, Error)]
pub enum EnumerationError {
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse '{path}': {message}")]
    Parse { path: PathBuf, message: String },
}

/// Failure embedding the registry in its template
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Template does not contain the substitution point {0}")]
    MissingPlaceholder(&'static str),

    #[error("Failed to serialize registry: {0}")]
    Serialize(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_recoverable() {
        let err = ReflectionError::not_found("App\\Missing", "Class \"App\\Missing\" could not be found");
        assert!(err.is_recoverable());
        assert_eq!(err.class(), "App\\Missing");
        assert_eq!(err.to_string(), "Class \"App\\Missing\" could not be found");
    }

    #[test]
    fn test_fatal_is_not_recoverable() {
        let err = ReflectionError::fatal("App\\Broken", "unbalanced braces");
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("App\\Broken"));
    }
}
