//! Error types for streaming extraction.
//!
//! Every variant names the phase that failed so the CLI can report it without
//! extra context.

use llm_tools_files::FilesError;
use std::fmt;
use thiserror::Error;
use tokio_util::codec::LinesCodecError;

/// Boxed error produced by a completion source.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Why a line could not be accepted by the block parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatErrorKind {
    /// A closing fence arrived before any `filepath` header.
    UnexpectedEndOfBlock,
    /// Content arrived inside a fence before any `filepath` header.
    UnexpectedLineInsideBlock,
    /// A `filepath` header carried no path.
    EmptyFilePath,
    /// The input ended while a record was still open (strict mode only).
    UnterminatedBlock,
}

impl FormatErrorKind {
    /// Returns a short description of the problem.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::UnexpectedEndOfBlock => "unexpected end of block",
            Self::UnexpectedLineInsideBlock => "unexpected line inside block",
            Self::EmptyFilePath => "empty file path",
            Self::UnterminatedBlock => "unterminated block at end of stream",
        }
    }
}

impl fmt::Display for FormatErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while streaming a completion into a file sink.
///
/// # Examples
///
/// ```
/// use llm_tools_stream::{FormatErrorKind, StreamError};
///
/// let err = StreamError::Format {
///     line: 3,
///     kind: FormatErrorKind::UnexpectedEndOfBlock,
/// };
/// assert!(err.is_format_error());
/// assert_eq!(err.to_string(), "parsing result: unexpected end of block (line 3)");
/// ```
#[derive(Error, Debug)]
pub enum StreamError {
    /// The model output broke the `filepath` + fenced block convention.
    #[error("parsing result: {kind} (line {line})")]
    Format {
        /// 1-based line number of the offending line
        line: usize,
        /// What was wrong with it
        kind: FormatErrorKind,
    },

    /// The completion source failed mid-stream.
    #[error("receiving completion: {0}")]
    Source(#[source] BoxError),

    /// A sink rejected a completed file.
    #[error("writing {path}: {source}")]
    Sink {
        /// Path of the record being dispatched
        path: String,
        /// Underlying sink error
        #[source]
        source: FilesError,
    },

    /// Writing into the in-process pipe failed.
    #[error("streaming result: {0}")]
    Pipe(#[source] std::io::Error),

    /// A line could not be read (too long, invalid UTF-8, or I/O failure).
    #[error("reading result: {0}")]
    Read(#[from] LinesCodecError),

    /// The producer task panicked or was aborted.
    #[error("producer task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl StreamError {
    /// Wraps a completion source error.
    pub fn source_error<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Source(Box::new(error))
    }

    /// Returns `true` for malformed model output.
    #[must_use]
    pub const fn is_format_error(&self) -> bool {
        matches!(self, Self::Format { .. })
    }

    /// Returns `true` if the completion source failed.
    #[must_use]
    pub const fn is_source_error(&self) -> bool {
        matches!(self, Self::Source(_))
    }

    /// Returns `true` if a sink rejected a file.
    #[must_use]
    pub const fn is_sink_error(&self) -> bool {
        matches!(self, Self::Sink { .. })
    }

    /// Returns `true` for pipe, line reading, or task failures.
    #[must_use]
    pub const fn is_internal_error(&self) -> bool {
        matches!(self, Self::Pipe(_) | Self::Read(_) | Self::Task(_))
    }

    /// Returns the format error kind, if this is a format error.
    #[must_use]
    pub const fn format_kind(&self) -> Option<FormatErrorKind> {
        match self {
            Self::Format { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Result type alias for streaming operations.
pub type Result<T> = std::result::Result<T, StreamError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_format_error_display() {
        let err = StreamError::Format {
            line: 7,
            kind: FormatErrorKind::UnexpectedLineInsideBlock,
        };
        assert_eq!(
            err.to_string(),
            "parsing result: unexpected line inside block (line 7)"
        );
        assert_eq!(
            err.format_kind(),
            Some(FormatErrorKind::UnexpectedLineInsideBlock)
        );
    }

    #[test]
    fn test_source_error_chain() {
        let err = StreamError::source_error(std::io::Error::other("connection reset"));
        assert!(err.is_source_error());
        assert!(!err.is_format_error());
        assert!(err.to_string().starts_with("receiving completion"));
        assert!(err.source().is_some());
        assert_eq!(err.format_kind(), None);
    }

    #[test]
    fn test_sink_error_display() {
        let err = StreamError::Sink {
            path: "a.go".to_string(),
            source: FilesError::PathNotRelative {
                path: "/a.go".to_string(),
            },
        };
        assert!(err.is_sink_error());
        assert!(err.to_string().starts_with("writing a.go"));
    }

    #[test]
    fn test_read_error_is_internal() {
        let err = StreamError::from(LinesCodecError::MaxLineLengthExceeded);
        assert!(err.is_internal_error());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StreamError>();
    }
}
