//! llm-tools CLI.
//!
//! Command-line tools that use large language models to generate code.
//!
//! # Architecture
//!
//! The CLI is organized around subcommands:
//! - `config` - Inspect and update `~/.llm-tools/config.toml`
//! - `generate-interface-mocks` - Generate mock implementations of an interface
//! - `auto-completion` - Install a shell completion script
//!
//! # Examples
//!
//! ```bash
//! # Store the API key once
//! llm-tools config set --openai-api-key=sk-...
//!
//! # Write mocks for an interface into ./mocks
//! llm-tools generate-interface-mocks --package=mocks \
//!     --interface-file=store.go --output-folder=mocks
//! ```

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use llm_tools_cli::commands::{self, generate::GenerateArgs};
use llm_tools_cli::{ConfigAction, exit_code_for};
use llm_tools_core::ConfigPaths;
use llm_tools_core::cli::{ExitCode, OutputFormat};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line tools that use large language models to generate code.
#[derive(Parser, Debug)]
#[command(name = "llm-tools")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(long, env = "DEBUG", global = true)]
    debug: bool,

    /// Use another config file
    #[arg(long, global = true, hide = true)]
    config: Option<PathBuf>,

    /// Output format (json, text, pretty)
    #[arg(long = "format", global = true, default_value = "pretty")]
    format: String,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage the config file.
    Config {
        /// Config action to perform
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate mock implementations of an interface.
    ///
    /// Sends the interface file to the model and writes each generated file
    /// into the output folder as it streams in.
    ///
    /// # Examples
    ///
    /// ```bash
    /// llm-tools generate-interface-mocks --package=mocks \
    ///     --interface-file=store.go --output-folder=mocks
    /// ```
    GenerateInterfaceMocks(GenerateArgs),

    /// Install shell auto-completion.
    ///
    /// Writes the completion script next to the config file and prints the
    /// line to add to your shell profile.
    AutoCompletion {
        /// Target shell (guessed from the environment if omitted)
        #[arg(long, value_enum)]
        shell: Option<Shell>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.debug)?;

    let exit_code = match execute_command(cli).await {
        Ok(code) => code,
        Err(err) => {
            tracing::debug!(error = ?err, "command failed");
            eprintln!("Error: {err:#}");
            exit_code_for(&err)
        }
    };

    std::process::exit(exit_code.as_i32());
}

/// Initializes logging.
///
/// Logs go to stderr so stdout stays clean for generated files.
///
/// # Errors
///
/// Returns an error if logging initialization fails.
fn init_logging(debug: bool) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()?;

    Ok(())
}

/// Executes the specified CLI command.
///
/// # Errors
///
/// Returns an error if the output format is invalid, the config location
/// cannot be resolved, or the command fails.
async fn execute_command(cli: Cli) -> Result<ExitCode> {
    let output_format = cli.format.parse::<OutputFormat>()?;

    let paths = match cli.config {
        Some(path) => ConfigPaths::with_config_file(path),
        None => ConfigPaths::from_home()?,
    };

    match cli.command {
        Commands::Config { action } => commands::config::run(action, &paths, output_format).await,
        Commands::GenerateInterfaceMocks(args) => {
            commands::generate::run(args, &paths, output_format).await
        }
        Commands::AutoCompletion { shell } => {
            let mut cmd = Cli::command();
            commands::autocompletion::run(shell, &mut cmd, &paths, output_format).await
        }
    }
}
