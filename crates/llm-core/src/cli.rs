//! Value types shared by the `llm-tools` commands.
//!
//! # Examples
//!
//! ```
//! use llm_tools_core::cli::{ExitCode, OutputFormat};
//!
//! assert_eq!("json".parse::<OutputFormat>()?, OutputFormat::Json);
//! assert_eq!(ExitCode::INVALID_INPUT.as_i32(), 2);
//! # Ok::<(), llm_tools_core::Error>(())
//! ```

use std::fmt;
use std::str::FromStr;

/// How informational results (config paths, summaries) are printed.
///
/// Generated files never pass through a formatter; they are written by a
/// file sink as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    Json,
    /// Uncolored `key: value` lines
    Text,
    /// Colored, indented output for terminals
    #[default]
    Pretty,
}

impl OutputFormat {
    /// Every format, in the order shown in help text.
    pub const ALL: [Self; 3] = [Self::Json, Self::Text, Self::Pretty];

    /// Name accepted by `--format`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Text => "text",
            Self::Pretty => "pretty",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = crate::Error;

    /// Parses a format name, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|format| format.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let names: Vec<_> = Self::ALL.iter().map(Self::as_str).collect();
                crate::Error::InvalidArgument(format!(
                    "unknown output format '{s}', expected one of: {}",
                    names.join(", ")
                ))
            })
    }
}

/// Process exit status reported by `llm-tools`.
///
/// Scripts can tell bad input apart from a failing completion service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Command completed (0).
    pub const SUCCESS: Self = Self(0);

    /// Any failure without a more specific code (1).
    pub const ERROR: Self = Self(1);

    /// Missing or invalid flags, arguments, or config values (2).
    pub const INVALID_INPUT: Self = Self(2);

    /// The completion service rejected the request or failed mid-stream (3).
    pub const SERVICE_ERROR: Self = Self(3);

    /// Numeric status for [`std::process::exit`].
    #[must_use]
    pub const fn as_i32(&self) -> i32 {
        self.0
    }

    /// Returns `true` for [`ExitCode::SUCCESS`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.0 == Self::SUCCESS.0
    }
}
