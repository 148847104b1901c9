//! The output capability shared by every destination for generated files.

use crate::types::{Result, VirtualFile};
use async_trait::async_trait;
use std::sync::Arc;

/// A destination for completed files.
///
/// The parser calls [`dispatch`](FileSink::dispatch) once per completed
/// record, in stream order, and waits for it to finish before reading further.
/// A returned error aborts the stream.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use llm_tools_files::{FileSink, Result, VirtualFile};
///
/// #[derive(Debug)]
/// struct Discard;
///
/// #[async_trait]
/// impl FileSink for Discard {
///     async fn dispatch(&self, _file: &VirtualFile) -> Result<()> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait FileSink: Send + Sync {
    /// Stores or displays one completed file.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError`](crate::FilesError) if the path is rejected or
    /// the underlying write fails.
    async fn dispatch(&self, file: &VirtualFile) -> Result<()>;
}

#[async_trait]
impl<T: FileSink + ?Sized> FileSink for Box<T> {
    async fn dispatch(&self, file: &VirtualFile) -> Result<()> {
        (**self).dispatch(file).await
    }
}

#[async_trait]
impl<T: FileSink + ?Sized> FileSink for Arc<T> {
    async fn dispatch(&self, file: &VirtualFile) -> Result<()> {
        (**self).dispatch(file).await
    }
}
