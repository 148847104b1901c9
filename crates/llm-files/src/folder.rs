//! Sink that writes files under a root folder on disk.

use crate::sink::FileSink;
use crate::types::{FilePath, FilesError, Result, VirtualFile};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Writes each dispatched file to `<root>/<path>`.
///
/// Paths are validated as [`FilePath`] before anything touches the disk, so a
/// response cannot escape the root with `..` or an absolute path. Parent
/// directories are created as needed and existing files are overwritten.
///
/// # Examples
///
/// ```
/// use llm_tools_files::{FileSink, FolderSink, VirtualFile};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let dir = tempfile::tempdir().unwrap();
/// let sink = FolderSink::new(dir.path()).unwrap();
///
/// sink.dispatch(&VirtualFile::new("mocks/a.go", "package mocks\n"))
///     .await
///     .unwrap();
///
/// let written = std::fs::read_to_string(dir.path().join("mocks/a.go")).unwrap();
/// assert_eq!(written, "package mocks\n");
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FolderSink {
    root: PathBuf,
}

impl FolderSink {
    /// Creates a sink rooted at `root`, expanding a leading `~`.
    ///
    /// The folder does not need to exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` is not valid UTF-8 or if `~` is used and the
    /// home directory cannot be determined.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            root: expand_tilde(root.as_ref())?,
        })
    }

    /// Returns the output root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a record path to its location under the root.
    ///
    /// # Errors
    ///
    /// Returns a path validation error if `path` is empty, absolute, or
    /// contains `..`.
    pub fn resolve(&self, path: &str) -> Result<PathBuf> {
        let path = FilePath::new(path)?;
        Ok(self.root.join(path.as_path()))
    }
}

#[async_trait]
impl FileSink for FolderSink {
    async fn dispatch(&self, file: &VirtualFile) -> Result<()> {
        let disk_path = self.resolve(&file.path)?;
        write_file_atomic(&disk_path, file.content.as_bytes()).await?;
        tracing::info!(path = %disk_path.display(), bytes = file.size(), "wrote file");
        Ok(())
    }
}

fn expand_tilde(path: &Path) -> Result<PathBuf> {
    let path_str = path.to_str().ok_or_else(|| FilesError::InvalidPath {
        path: path.display().to_string(),
    })?;

    let rest = if path_str == "~" {
        ""
    } else if let Some(rest) = path_str.strip_prefix("~/") {
        rest
    } else {
        return Ok(path.to_path_buf());
    };

    let home = dirs::home_dir().ok_or_else(|| FilesError::IoError {
        path: path_str.to_string(),
        source: std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "cannot determine home directory",
        ),
    })?;

    Ok(if rest.is_empty() { home } else { home.join(rest) })
}

/// Writes `content` to a hidden sibling temp file, then renames it over
/// `disk_path`. The temp file is removed if the rename fails.
async fn write_file_atomic(disk_path: &Path, content: &[u8]) -> Result<()> {
    let io_error = |path: &Path, source| FilesError::IoError {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = disk_path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| io_error(parent, e))?;
    }

    let file_name = disk_path
        .file_name()
        .ok_or_else(|| FilesError::InvalidPath {
            path: disk_path.display().to_string(),
        })?
        .to_string_lossy();
    let temp_path = disk_path.with_file_name(format!(".{file_name}.tmp"));

    fs::write(&temp_path, content)
        .await
        .map_err(|e| io_error(&temp_path, e))?;

    if let Err(e) = fs::rename(&temp_path, disk_path).await {
        if let Err(cleanup) = fs::remove_file(&temp_path).await {
            tracing::warn!(path = %temp_path.display(), error = %cleanup, "failed to remove temp file");
        }
        return Err(io_error(disk_path, e));
    }

    Ok(())
}
