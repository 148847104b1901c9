//! Command implementations for the llm-tools CLI.
//!
//! Each command module validates its arguments, executes the operation, and
//! formats informational output according to the requested format.

pub mod autocompletion;
pub mod config;
pub mod generate;

use llm_tools_core::cli::ExitCode;
use llm_tools_openai::OpenAiError;
use llm_tools_stream::StreamError;

/// Maps a failed command to the process exit code.
///
/// Configuration and argument problems give [`ExitCode::INVALID_INPUT`],
/// failures of the completion service give [`ExitCode::SERVICE_ERROR`], and
/// anything else gives [`ExitCode::ERROR`].
///
/// # Examples
///
/// ```
/// use llm_tools_cli::commands::exit_code_for;
/// use llm_tools_core::{Error, cli::ExitCode};
///
/// let err = anyhow::Error::new(Error::ConfigError {
///     message: "package name is required".to_string(),
/// });
/// assert_eq!(exit_code_for(&err), ExitCode::INVALID_INPUT);
///
/// let err = anyhow::anyhow!("disk full");
/// assert_eq!(exit_code_for(&err), ExitCode::ERROR);
/// ```
#[must_use]
pub fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    for cause in err.chain() {
        if let Some(core) = cause.downcast_ref::<llm_tools_core::Error>()
            && (core.is_config_error() || core.is_invalid_argument())
        {
            return ExitCode::INVALID_INPUT;
        }
        if cause.downcast_ref::<OpenAiError>().is_some() {
            return ExitCode::SERVICE_ERROR;
        }
        if let Some(stream) = cause.downcast_ref::<StreamError>()
            && stream.is_source_error()
        {
            return ExitCode::SERVICE_ERROR;
        }
    }
    ExitCode::ERROR
}
