//! Error types shared by the download components.
//!
//! Errors carry a [`ErrorKind`] for matching, a human-readable message and an
//! optional boxed source, so callers can map them onto transport responses
//! without inspecting strings.

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;
use std::path::Path;

/// Type alias for boxed errors that are Send + Sync.
pub type BoxedError = Box<dyn StdError + Send + Sync>;

/// Result type alias for core operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error kind enumeration for categorizing core errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The file does not exist.
    FileNotFound,
    /// The file exists but cannot be opened for reading.
    FileNotReadable,
    /// The file exceeds what an in-process transfer is allowed to serve.
    FileTooLarge,
    /// A memory limit string could not be parsed.
    InvalidMemoryLimit,
    /// Any other I/O failure.
    Io,
}

impl ErrorKind {
    /// Returns the error kind as a string for categorization.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FileNotFound => "file_not_found",
            Self::FileNotReadable => "file_not_readable",
            Self::FileTooLarge => "file_too_large",
            Self::InvalidMemoryLimit => "invalid_memory_limit",
            Self::Io => "io",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Core error with structured information.
#[derive(Debug, thiserror::Error)]
#[error("{kind} error: {message}")]
pub struct Error {
    kind: ErrorKind,
    message: Cow<'static, str>,
    #[source]
    source: Option<BoxedError>,
}

impl Error {
    /// Creates a new [`Error`].
    #[inline]
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Attaches a source error to this error.
    #[inline]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error kind.
    #[must_use]
    #[inline]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error message.
    #[must_use]
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Creates a new file-not-found error for the given path.
    pub fn file_not_found(path: &Path) -> Self {
        Self::new(
            ErrorKind::FileNotFound,
            format!("file {} does not exist", path.display()),
        )
    }

    /// Creates a new file-not-readable error for the given path.
    pub fn file_not_readable(path: &Path) -> Self {
        Self::new(
            ErrorKind::FileNotReadable,
            format!("file {} is not readable", path.display()),
        )
    }

    /// Creates a new file-too-large error.
    pub fn file_too_large(size: u64, ceiling: u64) -> Self {
        Self::new(
            ErrorKind::FileTooLarge,
            format!("file of {size} bytes exceeds the {ceiling} byte in-process ceiling"),
        )
    }

    /// Creates a new memory limit parse error.
    pub fn invalid_memory_limit(value: &str) -> Self {
        Self::new(
            ErrorKind::InvalidMemoryLimit,
            format!("invalid memory limit {value:?}"),
        )
    }

    /// Creates a new I/O error.
    #[inline]
    pub fn io(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Io, message)
    }
}
