//! In-memory sink for tests and dry runs.

use crate::sink::FileSink;
use crate::types::{Result, VirtualFile};
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Collects dispatched files in dispatch order.
///
/// # Examples
///
/// ```
/// use llm_tools_files::{FileSink, MemorySink, VirtualFile};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let sink = MemorySink::new();
/// sink.dispatch(&VirtualFile::new("a.go", "A\n")).await.unwrap();
/// sink.dispatch(&VirtualFile::new("b.go", "B\n")).await.unwrap();
///
/// let paths: Vec<_> = sink.into_files().into_iter().map(|f| f.path).collect();
/// assert_eq!(paths, ["a.go", "b.go"]);
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MemorySink {
    files: Mutex<Vec<VirtualFile>>,
}

impl MemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the collected files.
    #[must_use]
    pub fn files(&self) -> Vec<VirtualFile> {
        self.lock().clone()
    }

    /// Returns the number of collected files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if nothing has been dispatched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Consumes the sink and returns the collected files.
    #[must_use]
    pub fn into_files(self) -> Vec<VirtualFile> {
        self.files.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    // A panic while holding the lock cannot leave the Vec half-updated.
    fn lock(&self) -> MutexGuard<'_, Vec<VirtualFile>> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl FileSink for MemorySink {
    async fn dispatch(&self, file: &VirtualFile) -> Result<()> {
        self.lock().push(file.clone());
        Ok(())
    }
}
