//! Configuration errors

use std::path::PathBuf;
use thiserror::Error;

/// Errors loading or validating the tool configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config '{path}': {source}")]
    Io {
        /// Path of the configuration file
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for this schema.
    #[error("Failed to parse config '{path}': {message}")]
    Parse {
        /// Path of the configuration file
        path: PathBuf,
        /// Parser diagnostic
        message: String,
    },

    /// A field holds a value outside its allowed range.
    #[error("Invalid value for {field}: {value}")]
    InvalidValue {
        /// Dotted name of the offending field
        field: String,
        /// Description of the problem
        value: String,
    },
}
