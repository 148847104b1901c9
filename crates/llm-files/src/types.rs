//! Core types for virtual files.
//!
//! This module defines the generated-file record, the validated relative path
//! used when a record is written to disk, and the error type shared by all
//! sinks.
//!
//! # Examples
//!
//! ```
//! use llm_tools_files::{FilePath, VirtualFile};
//!
//! let path = FilePath::new("mocks/user_store.go").unwrap();
//! let file = VirtualFile::new(path.as_str(), "package mocks\n");
//!
//! assert_eq!(file.path, "mocks/user_store.go");
//! assert_eq!(file.size(), 14);
//! ```

use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while validating or dispatching files.
///
/// All variants include the offending path and implement `is_xxx()` methods
/// for classification.
///
/// # Examples
///
/// ```
/// use llm_tools_files::FilesError;
///
/// let error = FilesError::InvalidPathComponent {
///     path: "../escape.go".to_string(),
/// };
///
/// assert!(error.is_invalid_path());
/// assert!(!error.is_io_error());
/// ```
#[derive(Error, Debug)]
pub enum FilesError {
    /// Path is empty or malformed
    #[error("Invalid path: {path}")]
    InvalidPath {
        /// The invalid path
        path: String,
    },

    /// Path is absolute where a relative path is required
    #[error("Path must be relative: {path}")]
    PathNotRelative {
        /// The absolute path
        path: String,
    },

    /// Path contains a parent directory reference ('..')
    #[error("Path contains invalid components: {path}")]
    InvalidPathComponent {
        /// The path with invalid components
        path: String,
    },

    /// Reading or writing failed
    #[error("I/O error at {path}: {source}")]
    IoError {
        /// The path (or stream label) involved in the failed operation
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl FilesError {
    /// Returns `true` if this is any kind of path validation error.
    #[must_use]
    pub const fn is_invalid_path(&self) -> bool {
        matches!(
            self,
            Self::InvalidPath { .. }
                | Self::PathNotRelative { .. }
                | Self::InvalidPathComponent { .. }
        )
    }

    /// Returns `true` if this is an I/O error.
    ///
    /// # Examples
    ///
    /// ```
    /// use llm_tools_files::FilesError;
    ///
    /// let error = FilesError::IoError {
    ///     path: "out/a.go".to_string(),
    ///     source: std::io::Error::other("disk full"),
    /// };
    /// assert!(error.is_io_error());
    /// ```
    #[must_use]
    pub const fn is_io_error(&self) -> bool {
        matches!(self, Self::IoError { .. })
    }

    /// Returns the path the error refers to.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::InvalidPath { path }
            | Self::PathNotRelative { path }
            | Self::InvalidPathComponent { path }
            | Self::IoError { path, .. } => path,
        }
    }
}

/// A validated relative output path.
///
/// `FilePath` uses Unix-style separators on all platforms:
/// - Must not be empty
/// - Must be relative (no leading '/', no drive prefix like `C:`)
/// - Free of parent directory references ('..')
///
/// Backslashes are normalized to forward slashes, so paths produced by a
/// model on any platform resolve the same way under the output root.
///
/// # Examples
///
/// ```
/// use llm_tools_files::FilePath;
///
/// let path = FilePath::new("mocks\\store.go").unwrap();
/// assert_eq!(path.as_str(), "mocks/store.go");
///
/// assert!(FilePath::new("/etc/passwd").is_err());
/// assert!(FilePath::new("mocks/../../escape.go").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilePath(String);

impl FilePath {
    /// Creates a new `FilePath`.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::InvalidPath` if the path is empty or contains a
    /// NUL byte, `FilesError::PathNotRelative` if it is absolute, and
    /// `FilesError::InvalidPathComponent` if any component is `..`.
    pub fn new(path: impl AsRef<str>) -> Result<Self> {
        let normalized = path.as_ref().replace('\\', "/");

        if normalized.is_empty() || normalized.contains('\0') {
            return Err(FilesError::InvalidPath { path: normalized });
        }

        if normalized.starts_with('/') || has_drive_prefix(&normalized) {
            return Err(FilesError::PathNotRelative { path: normalized });
        }

        if normalized.split('/').any(|component| component == "..") {
            return Err(FilesError::InvalidPathComponent { path: normalized });
        }

        Ok(Self(normalized))
    }

    /// Returns the path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the path as a `Path` reference.
    #[must_use]
    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

impl fmt::Display for FilePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<Path> for FilePath {
    fn as_ref(&self) -> &Path {
        self.as_path()
    }
}

/// A generated file recovered from a model response.
///
/// The path is whatever the response announced; it is validated only when a
/// sink needs to resolve it (see [`FilePath`]). Content is built up line by
/// line while the file's code block is open, each line terminated by `\n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualFile {
    /// Relative output location, as announced in the response
    pub path: String,
    /// Accumulated file content
    pub content: String,
}

impl VirtualFile {
    /// Creates a file with the given path and content.
    #[must_use]
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Creates a file with empty content.
    #[must_use]
    pub fn empty(path: impl Into<String>) -> Self {
        Self::new(path, String::new())
    }

    /// Appends one line of content followed by a newline.
    ///
    /// # Examples
    ///
    /// ```
    /// use llm_tools_files::VirtualFile;
    ///
    /// let mut file = VirtualFile::empty("a.go");
    /// file.push_line("package a");
    /// file.push_line("");
    /// assert_eq!(file.content, "package a\n\n");
    /// ```
    pub fn push_line(&mut self, line: &str) {
        self.content.push_str(line);
        self.content.push('\n');
    }

    /// Returns the size of the content in bytes.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.content.len()
    }
}

/// Type alias for file operation results.
pub type Result<T> = std::result::Result<T, FilesError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_path_new_valid() {
        let path = FilePath::new("mocks/store.go").unwrap();
        assert_eq!(path.as_str(), "mocks/store.go");
        assert_eq!(path.to_string(), "mocks/store.go");
    }

    #[test]
    fn test_file_path_allows_dot_components() {
        let path = FilePath::new("./mocks/store.go").unwrap();
        assert_eq!(path.as_str(), "./mocks/store.go");
    }

    #[test]
    fn test_file_path_allows_dots_in_names() {
        assert!(FilePath::new("mocks/store..go").is_ok());
        assert!(FilePath::new("..hidden/file.go").is_ok());
    }

    #[test]
    fn test_file_path_empty_fails() {
        let err = FilePath::new("").unwrap_err();
        assert!(matches!(err, FilesError::InvalidPath { .. }));
    }

    #[test]
    fn test_file_path_nul_fails() {
        let err = FilePath::new("a\0b.go").unwrap_err();
        assert!(matches!(err, FilesError::InvalidPath { .. }));
    }

    #[test]
    fn test_file_path_absolute_fails() {
        let err = FilePath::new("/etc/passwd").unwrap_err();
        assert!(matches!(err, FilesError::PathNotRelative { .. }));

        let err = FilePath::new("C:\\Windows\\system.ini").unwrap_err();
        assert!(matches!(err, FilesError::PathNotRelative { .. }));
    }

    #[test]
    fn test_file_path_parent_dir_fails() {
        let err = FilePath::new("mocks/../../escape.go").unwrap_err();
        assert!(matches!(err, FilesError::InvalidPathComponent { .. }));
        assert!(err.is_invalid_path());
        assert_eq!(err.path(), "mocks/../../escape.go");

        assert!(FilePath::new("..\\escape.go").is_err());
    }

    #[test]
    fn test_file_path_normalizes_backslashes() {
        let path = FilePath::new("mocks\\sub\\store.go").unwrap();
        assert_eq!(path.as_str(), "mocks/sub/store.go");
        let as_path: &Path = path.as_ref();
        assert_eq!(as_path.to_str(), Some("mocks/sub/store.go"));
    }

    #[test]
    fn test_virtual_file_push_line() {
        let mut file = VirtualFile::empty("a.go");
        assert_eq!(file.size(), 0);

        file.push_line("func A(){}");
        assert_eq!(file.content, "func A(){}\n");
        assert_eq!(file.size(), 11);
    }

    #[test]
    fn test_files_error_classification() {
        let io = FilesError::IoError {
            path: "<stdout>".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"),
        };
        assert!(io.is_io_error());
        assert!(!io.is_invalid_path());
        assert!(io.to_string().contains("<stdout>"));
    }

    #[test]
    fn test_types_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<VirtualFile>();
        assert_send_sync::<FilePath>();
        assert_send_sync::<FilesError>();
    }
}
