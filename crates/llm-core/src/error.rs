//! Error types for llm-tools.
//!
//! This module provides the error hierarchy for configuration handling and
//! argument validation. Streaming, filesystem, and HTTP failures have their
//! own error types in the crates that produce them.
//!
//! # Examples
//!
//! ```
//! use llm_tools_core::{Error, Result};
//!
//! fn require_package(name: &str) -> Result<()> {
//!     if name.is_empty() {
//!         return Err(Error::ConfigError {
//!             message: "package name is required".to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//!
//! let err = require_package("").unwrap_err();
//! assert!(err.is_config_error());
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for llm-tools core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    ///
    /// Raised when required parameters or credentials are missing, or when
    /// the configuration location cannot be determined.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration problem
        message: String,
    },

    /// Invalid argument error.
    ///
    /// Raised when CLI arguments or function parameters are invalid.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O failure while reading or writing a configuration file.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// Path involved in the failed operation
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The configuration file exists but is not valid TOML for [`crate::Config`].
    #[error("failed to parse config file {}: {source}", path.display())]
    ConfigParse {
        /// Path of the malformed file
        path: PathBuf,
        /// Underlying TOML error
        #[source]
        source: toml::de::Error,
    },

    /// The configuration could not be encoded as TOML.
    #[error("failed to encode config: {source}")]
    ConfigEncode {
        /// Underlying TOML error
        #[source]
        source: toml::ser::Error,
    },
}

impl Error {
    /// Returns `true` if this is a configuration error.
    ///
    /// # Examples
    ///
    /// ```
    /// use llm_tools_core::Error;
    ///
    /// let err = Error::ConfigError {
    ///     message: "openai api key is required".to_string(),
    /// };
    /// assert!(err.is_config_error());
    /// ```
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::ConfigError { .. })
    }

    /// Returns `true` if this is an invalid argument error.
    #[must_use]
    pub const fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// Returns `true` if the error came from reading, writing, or decoding
    /// the configuration file.
    #[must_use]
    pub const fn is_file_error(&self) -> bool {
        matches!(
            self,
            Self::Io { .. } | Self::ConfigParse { .. } | Self::ConfigEncode { .. }
        )
    }
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
