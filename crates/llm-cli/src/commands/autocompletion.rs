//! Auto-completion command implementation.
//!
//! Installs a completion script next to the config file and prints the line
//! that loads it from the shell profile.

use anyhow::{Context, Result};
use clap::{Command, ValueEnum};
use clap_complete::{Shell, generate};
use llm_tools_core::ConfigPaths;
use llm_tools_core::Error;
use llm_tools_core::cli::{ExitCode, OutputFormat};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// Result of `auto-completion`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AutoCompletionResult {
    /// Shell the script was generated for
    pub shell: String,
    /// Script location
    pub path: String,
    /// Whether the script was written by this run
    pub created: bool,
    /// Line to add to the shell profile
    pub profile_line: String,
}

/// Runs the auto-completion command.
///
/// Uses `shell` when given, otherwise guesses from the environment.
///
/// # Errors
///
/// Returns an error if the shell cannot be determined or the script cannot
/// be written.
pub async fn run(
    shell: Option<Shell>,
    cmd: &mut Command,
    paths: &ConfigPaths,
    output_format: OutputFormat,
) -> Result<ExitCode> {
    let shell = match shell {
        Some(shell) => shell,
        None => detect_shell(|name| std::env::var(name).ok())?,
    };

    let result = install(shell, cmd, paths)?;

    if output_format == OutputFormat::Json {
        let formatted = crate::formatters::format_output(&result, output_format)
            .context("failed to format auto-completion output")?;
        println!("{formatted}");
    } else {
        println!("{}", result.profile_line);
    }

    Ok(ExitCode::SUCCESS)
}

/// Guesses the current shell from environment variables.
///
/// `ZSH_VERSION` and `BASH_VERSION` are checked first, then the executable
/// name in `SHELL`.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if no supported shell is found.
///
/// # Examples
///
/// ```
/// use clap_complete::Shell;
/// use llm_tools_cli::commands::autocompletion::detect_shell;
///
/// let shell = detect_shell(|name| (name == "SHELL").then(|| "/usr/bin/fish".to_string()))?;
/// assert_eq!(shell, Shell::Fish);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn detect_shell(env: impl Fn(&str) -> Option<String>) -> Result<Shell> {
    if env("ZSH_VERSION").is_some() {
        return Ok(Shell::Zsh);
    }
    if env("BASH_VERSION").is_some() {
        return Ok(Shell::Bash);
    }

    let shell_path = env("SHELL").unwrap_or_default();
    let name = Path::new(&shell_path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    Shell::from_str(name, true).map_err(|_| {
        let shown = if name.is_empty() { "unknown" } else { name };
        Error::InvalidArgument(format!(
            "unsupported shell '{shown}', pass --shell with one of: bash, zsh, fish, elvish, powershell"
        ))
        .into()
    })
}

/// Writes the completion script for `shell` unless it already exists.
///
/// Each shell has its own script file, so installing for one shell never
/// reuses another shell's script.
///
/// # Errors
///
/// Returns an error if the config directory or script cannot be written.
pub fn install(shell: Shell, cmd: &mut Command, paths: &ConfigPaths) -> Result<AutoCompletionResult> {
    let path = paths.autocomplete_file(&shell.to_string());

    let exists = path
        .try_exists()
        .with_context(|| format!("failed to check {}", path.display()))?;

    if exists {
        debug!(path = %path.display(), "completion script already installed");
    } else {
        let mut script = Vec::new();
        let name = cmd.get_name().to_string();
        generate(shell, cmd, name, &mut script);

        std::fs::create_dir_all(paths.config_dir())
            .with_context(|| format!("failed to create {}", paths.config_dir().display()))?;
        std::fs::write(&path, script)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(shell = %shell, path = %path.display(), "completion script installed");
    }

    Ok(AutoCompletionResult {
        shell: shell.to_string(),
        path: path.display().to_string(),
        created: !exists,
        profile_line: profile_line(shell, &path),
    })
}

fn profile_line(shell: Shell, script: &Path) -> String {
    match shell {
        Shell::PowerShell => format!(". '{}'", script.display()),
        _ => format!("source '{}'", script.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_of(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn command() -> Command {
        Command::new("llm-tools").subcommand(Command::new("config"))
    }

    #[test]
    fn test_detect_shell_zsh_version_wins() {
        let env = env_of(&[("ZSH_VERSION", "5.9"), ("BASH_VERSION", "5.2"), ("SHELL", "/bin/fish")]);
        assert_eq!(detect_shell(env).unwrap(), Shell::Zsh);
    }

    #[test]
    fn test_detect_shell_bash_version() {
        let env = env_of(&[("BASH_VERSION", "5.2"), ("SHELL", "/bin/zsh")]);
        assert_eq!(detect_shell(env).unwrap(), Shell::Bash);
    }

    #[test]
    fn test_detect_shell_from_shell_path() {
        let env = env_of(&[("SHELL", "/usr/local/bin/zsh")]);
        assert_eq!(detect_shell(env).unwrap(), Shell::Zsh);
    }

    #[test]
    fn test_detect_shell_unsupported() {
        let env = env_of(&[("SHELL", "/bin/tcsh")]);
        let err = detect_shell(env).unwrap_err();
        assert!(err.downcast_ref::<Error>().unwrap().is_invalid_argument());
        assert!(err.to_string().contains("tcsh"));
    }

    #[test]
    fn test_detect_shell_nothing_set() {
        let err = detect_shell(env_of(&[])).unwrap_err();
        assert!(err.to_string().contains("unknown"));
    }

    #[test]
    fn test_install_writes_once() {
        let dir = TempDir::new().unwrap();
        let paths = ConfigPaths::in_dir(dir.path().join(".llm-tools"));
        let script_path = paths.autocomplete_file("bash");

        let first = install(Shell::Bash, &mut command(), &paths).unwrap();
        assert!(first.created);
        assert_eq!(first.path, script_path.display().to_string());
        let script = std::fs::read_to_string(&script_path).unwrap();
        assert!(script.contains("llm-tools"));

        std::fs::write(&script_path, "custom").unwrap();
        let second = install(Shell::Bash, &mut command(), &paths).unwrap();
        assert!(!second.created);
        assert_eq!(std::fs::read_to_string(&script_path).unwrap(), "custom");
    }

    #[test]
    fn test_install_second_shell_gets_its_own_script() {
        let dir = TempDir::new().unwrap();
        let paths = ConfigPaths::in_dir(dir.path());

        let zsh = install(Shell::Zsh, &mut command(), &paths).unwrap();
        let bash = install(Shell::Bash, &mut command(), &paths).unwrap();

        assert!(zsh.created);
        assert!(bash.created);
        assert_ne!(zsh.path, bash.path);
        assert!(bash.profile_line.contains("autocomplete.bash"));

        let zsh_script = std::fs::read_to_string(&zsh.path).unwrap();
        let bash_script = std::fs::read_to_string(&bash.path).unwrap();
        assert!(zsh_script.starts_with("#compdef"));
        assert!(!bash_script.starts_with("#compdef"));
        assert!(bash_script.contains("complete "));
    }

    #[test]
    fn test_profile_line() {
        assert_eq!(
            profile_line(Shell::Zsh, Path::new("/home/user/.llm-tools/autocomplete.zsh")),
            "source '/home/user/.llm-tools/autocomplete.zsh'"
        );
        assert_eq!(
            profile_line(
                Shell::PowerShell,
                Path::new("/home/user/.llm-tools/autocomplete.powershell")
            ),
            ". '/home/user/.llm-tools/autocomplete.powershell'"
        );
    }
}
