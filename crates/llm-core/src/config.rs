//! Persisted user configuration.
//!
//! Configuration is stored as TOML with kebab-case keys so that the file
//! reads the same as the command-line flags it provides defaults for:
//!
//! ```toml
//! openai-api-key = "sk-..."
//! ```
//!
//! The file location is an explicit [`ConfigPaths`] value. It is resolved
//! once at startup (from the home directory or a `--config` override) and
//! handed to every command that needs it.
//!
//! # Examples
//!
//! ```
//! use llm_tools_core::{Config, ConfigPaths};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let paths = ConfigPaths::in_dir(dir.path());
//!
//! // Missing file loads as defaults
//! let mut config = Config::load(&paths).unwrap();
//! assert!(config.openai_api_key.is_none());
//!
//! assert!(config.set_openai_api_key("sk-test"));
//! config.save(&paths).unwrap();
//!
//! let reloaded = Config::load(&paths).unwrap();
//! assert_eq!(reloaded.openai_api_key.as_deref(), Some("sk-test"));
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the per-user directory under the home directory.
pub const CONFIG_DIR_NAME: &str = ".llm-tools";

/// File name of the TOML configuration file.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// File name stem of the installed shell completion scripts.
///
/// Each shell gets its own file, `autocomplete.<shell>`.
pub const AUTOCOMPLETE_FILE_NAME: &str = "autocomplete";

/// Location of the configuration file and its sibling files.
///
/// # Examples
///
/// ```
/// use llm_tools_core::ConfigPaths;
/// use std::path::Path;
///
/// let paths = ConfigPaths::in_dir("/home/user/.llm-tools");
/// assert_eq!(
///     paths.config_file(),
///     Path::new("/home/user/.llm-tools/config.toml")
/// );
/// assert_eq!(
///     paths.autocomplete_file("zsh"),
///     Path::new("/home/user/.llm-tools/autocomplete.zsh")
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    config_file: PathBuf,
}

impl ConfigPaths {
    /// Resolves the default location, `~/.llm-tools/config.toml`.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if the home directory cannot be determined.
    pub fn from_home() -> Result<Self> {
        let home = dirs::home_dir().ok_or_else(|| Error::ConfigError {
            message: "failed to determine user home directory".to_string(),
        })?;
        Ok(Self::in_dir(home.join(CONFIG_DIR_NAME)))
    }

    /// Uses `config.toml` inside the given directory.
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            config_file: dir.as_ref().join(CONFIG_FILE_NAME),
        }
    }

    /// Uses an explicit configuration file path.
    ///
    /// Sibling files such as the completion script live next to it.
    #[must_use]
    pub fn with_config_file(path: impl Into<PathBuf>) -> Self {
        Self {
            config_file: path.into(),
        }
    }

    /// Path of the TOML configuration file.
    #[must_use]
    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    /// Directory that holds the configuration file.
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        self.config_file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }

    /// Path of the completion script installed for `shell`.
    #[must_use]
    pub fn autocomplete_file(&self, shell: &str) -> PathBuf {
        self.config_dir().join(format!("{AUTOCOMPLETE_FILE_NAME}.{shell}"))
    }

    /// Checks whether the configuration file exists.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file metadata cannot be read for a reason
    /// other than the file not existing.
    pub fn config_exists(&self) -> Result<bool> {
        self.config_file.try_exists().map_err(|source| Error::Io {
            path: self.config_file.clone(),
            source,
        })
    }
}

/// Reusable configuration for llm-tools commands.
///
/// Values here act as defaults for command-line flags; explicit flags and
/// environment variables take precedence.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// OpenAI API key used by `generate-interface-mocks`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field(
                "openai_api_key",
                &self.openai_api_key.as_deref().map(mask_secret),
            )
            .finish()
    }
}

impl Config {
    /// Loads the configuration file, or returns defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read and
    /// `Error::ConfigParse` if it is not valid TOML.
    pub fn load(paths: &ConfigPaths) -> Result<Self> {
        let path = paths.config_file();

        if !paths.config_exists()? {
            debug!(path = %path.display(), "config file does not exist, nothing to load");
            return Ok(Self::default());
        }

        debug!(path = %path.display(), "loading config file");
        let content = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = toml::from_str(&content).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(path = %path.display(), "config file loaded");
        Ok(config)
    }

    /// Saves the configuration, creating its directory when needed.
    ///
    /// On Unix the directory is created with mode `0700` and the file with
    /// mode `0600`, since it holds credentials.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigEncode` if serialization fails and `Error::Io`
    /// if the directory or file cannot be written.
    pub fn save(&self, paths: &ConfigPaths) -> Result<()> {
        let dir = paths.config_dir();
        create_private_dir(dir)?;

        let toml_str = toml::to_string_pretty(self).map_err(|source| Error::ConfigEncode { source })?;

        let path = paths.config_file();
        debug!(path = %path.display(), "saving config file");
        write_private_file(path, toml_str.as_bytes())?;
        debug!(path = %path.display(), "config file saved");

        Ok(())
    }

    /// Updates the API key, returning `true` if the stored value changed.
    ///
    /// Empty keys are ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use llm_tools_core::Config;
    ///
    /// let mut config = Config::default();
    /// assert!(config.set_openai_api_key("sk-1"));
    /// assert!(!config.set_openai_api_key("sk-1"));
    /// assert!(!config.set_openai_api_key(""));
    /// ```
    pub fn set_openai_api_key(&mut self, key: &str) -> bool {
        if key.is_empty() || self.openai_api_key.as_deref() == Some(key) {
            return false;
        }
        self.openai_api_key = Some(key.to_string());
        true
    }

    /// Returns a copy that is safe to display, with secrets masked.
    #[must_use]
    pub fn redacted(&self) -> Self {
        Self {
            openai_api_key: self.openai_api_key.as_deref().map(mask_secret),
        }
    }
}

/// Masks a secret, keeping at most the last four characters visible.
///
/// # Examples
///
/// ```
/// use llm_tools_core::config::mask_secret;
///
/// assert_eq!(mask_secret("sk-abcdefgh1234"), "****1234");
/// assert_eq!(mask_secret("short"), "****");
/// ```
#[must_use]
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{tail}")
}

fn create_private_dir(dir: &Path) -> Result<()> {
    let io_err = |source| Error::Io {
        path: dir.to_path_buf(),
        source,
    };

    if dir.try_exists().map_err(io_err)? {
        return Ok(());
    }

    debug!(dir = %dir.display(), "creating config directory");
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir).map_err(io_err)
}

fn write_private_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let io_err = |source| Error::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path).map_err(io_err)?;
    file.write_all(bytes).map_err(io_err)?;
    file.flush().map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_paths_in_dir() {
        let paths = ConfigPaths::in_dir("/tmp/llm");
        assert_eq!(paths.config_file(), Path::new("/tmp/llm/config.toml"));
        assert_eq!(paths.config_dir(), Path::new("/tmp/llm"));
        assert_eq!(
            paths.autocomplete_file("bash"),
            Path::new("/tmp/llm/autocomplete.bash")
        );
    }

    #[test]
    fn test_paths_with_bare_file_name() {
        let paths = ConfigPaths::with_config_file("config.toml");
        assert_eq!(paths.config_dir(), Path::new("."));
        assert_eq!(
            paths.autocomplete_file("fish"),
            Path::new("./autocomplete.fish")
        );
    }

    #[test]
    fn test_load_missing_returns_default() {
        let dir = TempDir::new().unwrap();
        let paths = ConfigPaths::in_dir(dir.path().join("nested"));

        assert!(!paths.config_exists().unwrap());
        let config = Config::load(&paths).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_creates_directory() {
        let dir = TempDir::new().unwrap();
        let paths = ConfigPaths::in_dir(dir.path().join("a").join("b"));

        let config = Config {
            openai_api_key: Some("sk-saved".to_string()),
        };
        config.save(&paths).unwrap();

        assert!(paths.config_exists().unwrap());
        assert_eq!(Config::load(&paths).unwrap(), config);
    }

    #[cfg(unix)]
    #[test]
    fn test_save_uses_private_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let paths = ConfigPaths::in_dir(dir.path().join("private"));
        Config::default().save(&paths).unwrap();

        let dir_mode = fs::metadata(paths.config_dir()).unwrap().permissions().mode();
        let file_mode = fs::metadata(paths.config_file()).unwrap().permissions().mode();
        assert_eq!(dir_mode & 0o777, 0o700);
        assert_eq!(file_mode & 0o777, 0o600);
    }

    #[test]
    fn test_kebab_case_keys() {
        let config = Config {
            openai_api_key: Some("sk-kebab".to_string()),
        };
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("openai-api-key"));

        let parsed: Config = toml::from_str("openai-api-key = \"sk-parsed\"\n").unwrap();
        assert_eq!(parsed.openai_api_key.as_deref(), Some("sk-parsed"));
    }

    #[test]
    fn test_empty_config_serializes_to_empty_document() {
        let toml_str = toml::to_string(&Config::default()).unwrap();
        assert!(toml_str.trim().is_empty());
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = TempDir::new().unwrap();
        let paths = ConfigPaths::in_dir(dir.path());
        fs::write(paths.config_file(), "openai-api-key = [").unwrap();

        let err = Config::load(&paths).unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
        assert!(err.is_file_error());
    }

    #[test]
    fn test_set_openai_api_key_reports_changes() {
        let mut config = Config::default();
        assert!(config.set_openai_api_key("sk-one"));
        assert!(!config.set_openai_api_key("sk-one"));
        assert!(config.set_openai_api_key("sk-two"));
        assert!(!config.set_openai_api_key(""));
        assert_eq!(config.openai_api_key.as_deref(), Some("sk-two"));
    }

    #[test]
    fn test_debug_does_not_leak_key() {
        let config = Config {
            openai_api_key: Some("sk-very-secret-value".to_string()),
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-very-secret"));
        assert!(debug.contains("****alue"));
    }

    #[test]
    fn test_redacted() {
        let config = Config {
            openai_api_key: Some("sk-0123456789".to_string()),
        };
        assert_eq!(
            config.redacted().openai_api_key.as_deref(),
            Some("****6789")
        );
        assert_eq!(Config::default().redacted(), Config::default());
    }

    #[test]
    fn test_mask_secret_multibyte() {
        assert_eq!(mask_secret("ключ-секретный-1"), "****ый-1");
    }
}
