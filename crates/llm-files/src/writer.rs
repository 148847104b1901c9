//! Sink that renders files as envelopes onto an async writer.

use crate::envelope::{DEFAULT_LANGUAGE, render_envelope};
use crate::sink::FileSink;
use crate::types::{FilesError, Result, VirtualFile};
use async_trait::async_trait;
use std::fmt;
use tokio::io::{AsyncWrite, AsyncWriteExt, Stdout};
use tokio::sync::Mutex;

/// Writes each dispatched file to an async writer using the envelope format.
///
/// Writes are serialized through a mutex and flushed after every record, so
/// output order mirrors dispatch order.
///
/// # Examples
///
/// ```
/// use llm_tools_files::{FileSink, VirtualFile, WriterSink};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let sink = WriterSink::new(Vec::new(), "go");
/// sink.dispatch(&VirtualFile::new("a.go", "package a\n")).await.unwrap();
///
/// let out = String::from_utf8(sink.into_inner()).unwrap();
/// assert_eq!(out, "filepath: `a.go`\n```go\npackage a\n```\n");
/// # }
/// ```
pub struct WriterSink<W> {
    writer: Mutex<W>,
    language: String,
    label: String,
}

impl<W> WriterSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    /// Creates a sink over `writer` that tags fences with `language`.
    #[must_use]
    pub fn new(writer: W, language: impl Into<String>) -> Self {
        Self {
            writer: Mutex::new(writer),
            language: language.into(),
            label: "<writer>".to_string(),
        }
    }

    /// Sets the name used for the destination in error messages.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Returns the fence language tag.
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Consumes the sink and returns the underlying writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl WriterSink<Stdout> {
    /// Creates a sink that prints files to standard output.
    #[must_use]
    pub fn stdout(language: impl Into<String>) -> Self {
        Self::new(tokio::io::stdout(), language).with_label("<stdout>")
    }
}

impl Default for WriterSink<Stdout> {
    fn default() -> Self {
        Self::stdout(DEFAULT_LANGUAGE)
    }
}

impl<W> fmt::Debug for WriterSink<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterSink")
            .field("language", &self.language)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<W> FileSink for WriterSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn dispatch(&self, file: &VirtualFile) -> Result<()> {
        let rendered = render_envelope(file, &self.language);
        let mut writer = self.writer.lock().await;

        let io_error = |source| FilesError::IoError {
            path: self.label.clone(),
            source,
        };
        writer.write_all(rendered.as_bytes()).await.map_err(io_error)?;
        writer.flush().await.map_err(io_error)?;

        tracing::debug!(path = %file.path, bytes = file.size(), "wrote file to {}", self.label);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    #[tokio::test]
    async fn test_writer_sink_preserves_order() {
        let sink = WriterSink::new(Vec::new(), "go");
        sink.dispatch(&VirtualFile::new("a.go", "A\n")).await.unwrap();
        sink.dispatch(&VirtualFile::new("b.go", "B\n")).await.unwrap();

        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            out,
            "filepath: `a.go`\n```go\nA\n```\nfilepath: `b.go`\n```go\nB\n```\n"
        );
    }

    #[tokio::test]
    async fn test_writer_sink_language() {
        let sink = WriterSink::new(Vec::new(), "python");
        assert_eq!(sink.language(), "python");
        sink.dispatch(&VirtualFile::new("a.py", "pass\n")).await.unwrap();
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert!(out.contains("```python\n"));
    }

    struct BrokenWriter;

    impl AsyncWrite for BrokenWriter {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<std::io::Result<usize>> {
            Poll::Ready(Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "closed",
            )))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_writer_sink_write_failure() {
        let sink = WriterSink::new(BrokenWriter, "go").with_label("<broken>");
        let err = sink
            .dispatch(&VirtualFile::new("a.go", "A\n"))
            .await
            .unwrap_err();
        assert!(err.is_io_error());
        assert_eq!(err.path(), "<broken>");
    }
}
