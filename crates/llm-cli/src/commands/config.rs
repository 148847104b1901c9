//! Config command implementation.
//!
//! Inspects and updates the persisted configuration file. The file lives at
//! `~/.llm-tools/config.toml` unless `--config` points elsewhere.

use crate::actions::ConfigAction;
use anyhow::{Context, Result};
use llm_tools_core::cli::{ExitCode, OutputFormat};
use llm_tools_core::{Config, ConfigPaths, Error};
use serde::Serialize;
use tracing::{debug, info};

/// Result of `config where`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WhereResult {
    /// Config file location
    pub path: String,
}

/// Result of `config set`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetResult {
    /// Config file location
    pub path: String,
    /// Whether the file was written
    pub updated: bool,
    /// Human-readable outcome
    pub message: String,
}

/// Result of `config show`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShowResult {
    /// Config file location
    pub path: String,
    /// Whether the file exists
    pub exists: bool,
    /// Stored values with secrets masked
    pub config: Config,
}

/// Runs the config command.
///
/// # Errors
///
/// Returns an error if the config file is missing (for `where`), cannot be
/// read or written, or output formatting fails.
pub async fn run(
    action: ConfigAction,
    paths: &ConfigPaths,
    output_format: OutputFormat,
) -> Result<ExitCode> {
    match action {
        ConfigAction::Where => {
            let result = where_config(paths)?;
            // The bare path is easier to use from scripts
            if output_format == OutputFormat::Json {
                print_result(&result, output_format)?;
            } else {
                println!("{}", result.path);
            }
        }
        ConfigAction::Set { openai_api_key } => {
            let result = set_config(paths, openai_api_key.as_deref())?;
            print_result(&result, output_format)?;
        }
        ConfigAction::Show => {
            let result = show_config(paths)?;
            print_result(&result, output_format)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Returns the config file location, failing if the file does not exist.
///
/// # Errors
///
/// Returns [`Error::ConfigError`] if there is no config file.
pub fn where_config(paths: &ConfigPaths) -> Result<WhereResult> {
    let path = paths.config_file();
    if !paths.config_exists()? {
        return Err(Error::ConfigError {
            message: format!(
                "no config file at {}; run `llm-tools config set` to create one",
                path.display()
            ),
        }
        .into());
    }

    Ok(WhereResult {
        path: path.display().to_string(),
    })
}

/// Stores the given values, writing the file only when something changed.
///
/// # Errors
///
/// Returns an error if the existing file cannot be loaded or the new one
/// cannot be saved.
pub fn set_config(paths: &ConfigPaths, openai_api_key: Option<&str>) -> Result<SetResult> {
    let mut config = Config::load(paths).context("failed to load config")?;

    let changed = openai_api_key.is_some_and(|key| config.set_openai_api_key(key));
    let path = paths.config_file().display().to_string();

    if !changed {
        debug!(path = %path, "config unchanged, not writing");
        return Ok(SetResult {
            path,
            updated: false,
            message: "nothing to update".to_string(),
        });
    }

    config.save(paths).context("failed to save config")?;
    info!(path = %path, "config updated");

    Ok(SetResult {
        path,
        updated: true,
        message: "config saved".to_string(),
    })
}

/// Loads the config for display with secrets masked.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be loaded.
pub fn show_config(paths: &ConfigPaths) -> Result<ShowResult> {
    let exists = paths.config_exists()?;
    let config = Config::load(paths).context("failed to load config")?;

    Ok(ShowResult {
        path: paths.config_file().display().to_string(),
        exists,
        config: config.redacted(),
    })
}

fn print_result<T: Serialize>(result: &T, output_format: OutputFormat) -> Result<()> {
    let formatted = crate::formatters::format_output(result, output_format)
        .context("failed to format config output")?;
    println!("{formatted}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn paths(dir: &TempDir) -> ConfigPaths {
        ConfigPaths::in_dir(dir.path().join(".llm-tools"))
    }

    #[test]
    fn test_where_missing_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let err = where_config(&paths(&dir)).unwrap_err();

        let core = err.downcast_ref::<Error>().unwrap();
        assert!(core.is_config_error());
        assert!(err.to_string().contains("no config file"));
    }

    #[test]
    fn test_where_existing_file() {
        let dir = TempDir::new().unwrap();
        let paths = paths(&dir);
        set_config(&paths, Some("sk-test-1234567890")).unwrap();

        let result = where_config(&paths).unwrap();
        assert_eq!(result.path, paths.config_file().display().to_string());
    }

    #[test]
    fn test_set_writes_then_noop() {
        let dir = TempDir::new().unwrap();
        let paths = paths(&dir);

        let first = set_config(&paths, Some("sk-test-1234567890")).unwrap();
        assert!(first.updated);
        assert!(paths.config_file().exists());

        let second = set_config(&paths, Some("sk-test-1234567890")).unwrap();
        assert!(!second.updated);

        let loaded = Config::load(&paths).unwrap();
        assert_eq!(loaded.openai_api_key.as_deref(), Some("sk-test-1234567890"));
    }

    #[test]
    fn test_set_without_values_does_not_create_file() {
        let dir = TempDir::new().unwrap();
        let paths = paths(&dir);

        let result = set_config(&paths, None).unwrap();
        assert!(!result.updated);
        assert!(!paths.config_file().exists());
    }

    #[test]
    fn test_show_masks_key() {
        let dir = TempDir::new().unwrap();
        let paths = paths(&dir);
        set_config(&paths, Some("sk-test-abcdef7890")).unwrap();

        let result = show_config(&paths).unwrap();
        assert!(result.exists);
        assert_eq!(result.config.openai_api_key.as_deref(), Some("****7890"));
    }

    #[test]
    fn test_show_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let result = show_config(&paths(&dir)).unwrap();
        assert!(!result.exists);
        assert_eq!(result.config, Config::default());
    }

    #[tokio::test]
    async fn test_run_set_returns_success() {
        let dir = TempDir::new().unwrap();
        let paths = paths(&dir);
        let action = ConfigAction::Set {
            openai_api_key: Some("sk-test-1234567890".to_string()),
        };

        let code = run(action, &paths, OutputFormat::Json).await.unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
    }
}
