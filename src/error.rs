//! @ai:module:intent Define error types for the tag injector
//! @ai:module:layer domain
//! @ai:module:public_api Error, Result
//! @ai:module:stateless true

use std::path::PathBuf;
use thiserror::Error;

/// @ai:intent Unified error type for all tag injection operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error at {path}:{line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("File {path} changed since it was parsed (bytes {start}..{end})")]
    StaleRegion {
        path: PathBuf,
        start: usize,
        end: usize,
    },

    #[error("Invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("No files match {0:?}")]
    NoMatches(String),

    #[error("Invalid config {path}: {message}")]
    Config { path: PathBuf, message: String },
}

impl Error {
    /// @ai:intent Name the processing phase that failed, for reports
    /// @ai:effects pure
    pub fn phase(&self) -> &'static str {
        match self {
            Error::Read { .. } => "read",
            Error::Write { .. } | Error::StaleRegion { .. } => "write",
            Error::Parse { .. } => "parse",
            Error::InvalidPattern { .. } | Error::NoMatches(_) => "input",
            Error::Config { .. } => "config",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
