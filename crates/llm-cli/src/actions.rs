//! Action type definitions for CLI commands.
//!
//! Defines the action enums used by various commands.

use clap::Subcommand;

/// Configuration file actions.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigAction {
    /// Print the location of the config file
    Where,

    /// Store values in the config file
    Set {
        /// OpenAI API key used by generate-interface-mocks
        #[arg(long = "openai-api-key")]
        openai_api_key: Option<String>,
    },

    /// Show the current configuration with secrets masked
    Show,
}
