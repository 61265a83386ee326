//! Error types for QuantumSink
//!
//! This module defines the error types used throughout the crate. Sink
//! operations report [`SinkError`] (and [`WriteError`] for writes, which also
//! carries the byte count accepted before the failure). Construction and
//! configuration report [`QuantumSinkError`].

use std::fmt;
use std::io;
use std::sync::Arc;
use thiserror::Error;

/// Error surfaced by a sink's `write` or `sync`.
///
/// `Clone` so that the buffering wrapper can keep the first failure and
/// report it again on every later operation.
#[derive(Error, Debug, Clone)]
pub enum SinkError {
    /// I/O error from the underlying device
    #[error("I/O error: {0}")]
    Io(#[source] Arc<io::Error>),

    /// The device accepted fewer bytes than requested without reporting an error
    #[error("short write")]
    ShortWrite,

    /// Errors from several destinations of a fan-out, none discarded
    #[error(transparent)]
    Multiple(MultiError),
}

impl SinkError {
    /// Combine two optional errors into one, keeping every constituent.
    ///
    /// `None + None` stays `None`, a single error is returned as is, and two
    /// errors become [`SinkError::Multiple`]. Nested aggregates are flattened.
    pub fn append(left: Option<SinkError>, right: Option<SinkError>) -> Option<SinkError> {
        match (left, right) {
            (None, None) => None,
            (Some(err), None) | (None, Some(err)) => Some(err),
            (Some(left), Some(right)) => {
                let mut errors = left.into_errors();
                errors.extend(right.into_errors());
                Some(SinkError::Multiple(MultiError { errors }))
            }
        }
    }

    /// Constituent errors: the inner list for an aggregate, otherwise `self`.
    pub fn errors(&self) -> Vec<&SinkError> {
        match self {
            SinkError::Multiple(multi) => multi.errors.iter().collect(),
            other => vec![other],
        }
    }

    fn into_errors(self) -> Vec<SinkError> {
        match self {
            SinkError::Multiple(multi) => multi.errors,
            other => vec![other],
        }
    }

    /// The `io::ErrorKind` of a single I/O error, if this is one
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            SinkError::Io(err) => Some(err.kind()),
            SinkError::ShortWrite => Some(io::ErrorKind::WriteZero),
            SinkError::Multiple(_) => None,
        }
    }
}

impl From<io::Error> for SinkError {
    fn from(err: io::Error) -> Self {
        SinkError::Io(Arc::new(err))
    }
}

impl From<SinkError> for io::Error {
    fn from(err: SinkError) -> Self {
        match err {
            SinkError::Io(inner) => match Arc::try_unwrap(inner) {
                Ok(inner) => inner,
                Err(shared) => io::Error::new(shared.kind(), SinkError::Io(shared)),
            },
            SinkError::ShortWrite => io::Error::new(io::ErrorKind::WriteZero, SinkError::ShortWrite),
            other => io::Error::other(other),
        }
    }
}

/// Several sink errors collapsed into one value.
#[derive(Debug, Clone)]
pub struct MultiError {
    errors: Vec<SinkError>,
}

impl MultiError {
    pub fn errors(&self) -> &[SinkError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for MultiError {}

/// A failed write, together with the bytes accepted before the failure.
#[derive(Error, Debug, Clone)]
#[error("{source} ({written} bytes written)")]
pub struct WriteError {
    pub written: usize,
    #[source]
    pub source: SinkError,
}

impl WriteError {
    pub fn new(written: usize, source: SinkError) -> Self {
        Self { written, source }
    }

    pub fn into_source(self) -> SinkError {
        self.source
    }
}

impl From<SinkError> for WriteError {
    fn from(source: SinkError) -> Self {
        Self { written: 0, source }
    }
}

impl From<io::Error> for WriteError {
    fn from(err: io::Error) -> Self {
        Self::from(SinkError::from(err))
    }
}

impl From<WriteError> for io::Error {
    fn from(err: WriteError) -> Self {
        err.source.into()
    }
}

/// Sink result type
pub type SinkResult<T> = std::result::Result<T, SinkError>;

/// Result of a sink write: bytes accepted, or the failure with a partial count
pub type WriteResult = std::result::Result<usize, WriteError>;

/// Error type for construction and configuration
#[derive(Error, Debug)]
pub enum QuantumSinkError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Configuration file not found
    #[error("Configuration file not found: {0}")]
    ConfigFileMissing(String),

    /// Invalid file path
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Global initialization errors
    #[error("Initialization error: {0}")]
    InitializationError(String),

    /// I/O errors while opening outputs
    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: io::Error,
    },

    /// TOML parsing errors
    #[error("TOML parsing error: {source}")]
    TomlError {
        #[from]
        source: toml::de::Error,
    },

    /// Errors reported by a sink during setup or teardown
    #[error("Sink error: {source}")]
    SinkError {
        #[from]
        source: SinkError,
    },

    /// Rolling file appender initialization errors
    #[error("Rolling file error: {source}")]
    RollingFileError {
        #[from]
        source: tracing_appender::rolling::InitError,
    },
}

/// Result type alias for QuantumSink construction and configuration
pub type Result<T> = std::result::Result<T, QuantumSinkError>;

impl QuantumSinkError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a new invalid path error
    pub fn invalid_path<S: Into<String>>(msg: S) -> Self {
        Self::InvalidPath(msg.into())
    }

    /// Get the error category for diagnostics
    pub fn category(&self) -> &'static str {
        match self {
            Self::ConfigError(_) | Self::ConfigFileMissing(_) | Self::InvalidPath(_) => "config",
            Self::ValidationError(_) => "validation",
            Self::InitializationError(_) => "initialization",
            Self::IoError { .. } => "io",
            Self::TomlError { .. } => "toml",
            Self::SinkError { .. } => "sink",
            Self::RollingFileError { .. } => "rolling_file",
        }
    }
}
