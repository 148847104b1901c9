//! Producer/parser harness.
//!
//! A completion arrives as a stream of text deltas whose boundaries have no
//! relation to line boundaries. [`Pipeline::run`] writes the deltas into an
//! in-process duplex pipe from a spawned producer task while the calling task
//! reads lines from the other end and dispatches completed files.
//!
//! The pipe buffer is small, so the producer waits whenever the parser falls
//! behind. Both units are always awaited; the first error either one records
//! is returned. A parser failure cancels the producer, and a producer failure
//! closes its end of the pipe so the parser sees end of stream.

use crate::error::{Result, StreamError};
use crate::parser::{ParseSummary, ParserOptions, parse};
use futures::{Stream, StreamExt};
use llm_tools_files::FileSink;
use std::pin::pin;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::io::{AsyncWriteExt, DuplexStream};
use tokio_util::sync::CancellationToken;

/// Default duplex buffer size in bytes.
pub const DEFAULT_PIPE_CAPACITY: usize = 64;

/// Counters from the producer side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProducerStats {
    /// Non-empty deltas written into the pipe
    pub deltas: usize,
    /// Bytes written into the pipe
    pub bytes: usize,
}

/// Result of a successful run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Producer counters
    pub producer: ProducerStats,
    /// Parser counters
    pub parse: ParseSummary,
}

/// Streams deltas through the block parser into a sink.
///
/// # Examples
///
/// ```
/// use futures::stream;
/// use llm_tools_files::MemorySink;
/// use llm_tools_stream::{Pipeline, ParserOptions};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let deltas = ["filepath: `a.g", "o`\n```go\nfunc A", "(){}\n```\n"]
///     .map(|d| Ok::<_, std::io::Error>(d.to_string()));
/// let sink = MemorySink::new();
///
/// let summary = Pipeline::new(ParserOptions::default())
///     .run(stream::iter(deltas), &sink)
///     .await
///     .unwrap();
///
/// assert_eq!(summary.parse.dispatched, 1);
/// assert_eq!(sink.files()[0].content, "func A(){}\n");
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    options: ParserOptions,
    pipe_capacity: usize,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(ParserOptions::default())
    }
}

impl Pipeline {
    /// Creates a pipeline with the given parser options.
    #[must_use]
    pub const fn new(options: ParserOptions) -> Self {
        Self {
            options,
            pipe_capacity: DEFAULT_PIPE_CAPACITY,
        }
    }

    /// Sets the duplex buffer size (minimum 1 byte).
    #[must_use]
    pub fn with_pipe_capacity(mut self, capacity: usize) -> Self {
        self.pipe_capacity = capacity.max(1);
        self
    }

    /// Returns the parser options.
    #[must_use]
    pub const fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Drains `source` into the parser and dispatches completed files to
    /// `sink`.
    ///
    /// Must be called from within a tokio runtime; the producer runs on a
    /// spawned task.
    ///
    /// # Errors
    ///
    /// Returns the first error recorded by either side:
    /// [`StreamError::Source`] if the source fails, [`StreamError::Format`] or
    /// [`StreamError::Sink`] if parsing or dispatch fails, and pipe or task
    /// errors otherwise.
    pub async fn run<St, E, S>(&self, source: St, sink: &S) -> Result<RunSummary>
    where
        St: Stream<Item = std::result::Result<String, E>> + Send + 'static,
        E: std::error::Error + Send + Sync + 'static,
        S: FileSink + ?Sized,
    {
        let (writer, mut reader) = tokio::io::duplex(self.pipe_capacity);
        let cancel = CancellationToken::new();
        let errors = Arc::new(FirstError::default());

        tracing::debug!(capacity = self.pipe_capacity, "starting stream pipeline");

        let handle = {
            let cancel = cancel.clone();
            let errors = Arc::clone(&errors);
            tokio::spawn(async move {
                let mut writer = writer;
                let result = produce(source, &mut writer, &cancel).await;
                // Record before the write half drops so the parser's view of
                // end of stream never wins the race.
                let stats = match result {
                    Ok(stats) => Some(stats),
                    Err(e) => {
                        errors.record(e);
                        None
                    }
                };
                drop(writer);
                stats
            })
        };

        let producer = async {
            match handle.await {
                Ok(stats) => stats,
                Err(e) => {
                    errors.record(StreamError::Task(e));
                    None
                }
            }
        };

        let parser = async {
            // The read half stays alive until the error is recorded and the
            // producer cancelled, so the producer never sees a broken pipe
            // first.
            match parse(&mut reader, sink, self.options.clone()).await {
                Ok(summary) => Some(summary),
                Err(e) => {
                    errors.record(e);
                    cancel.cancel();
                    None
                }
            }
        };

        let (producer, parse) = tokio::join!(producer, parser);

        if let Some(err) = errors.take() {
            tracing::debug!(error = %err, "stream pipeline failed");
            return Err(err);
        }

        let summary = RunSummary {
            producer: producer.unwrap_or_default(),
            parse: parse.unwrap_or_default(),
        };
        tracing::info!(
            deltas = summary.producer.deltas,
            bytes = summary.producer.bytes,
            lines = summary.parse.lines,
            files = summary.parse.dispatched,
            "stream complete"
        );
        Ok(summary)
    }
}

/// Writes every non-empty delta into the pipe, then shuts it down.
///
/// Returns quietly if `cancel` fires.
async fn produce<St, E>(
    source: St,
    writer: &mut DuplexStream,
    cancel: &CancellationToken,
) -> Result<ProducerStats>
where
    St: Stream<Item = std::result::Result<String, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    let mut source = pin!(source);
    let mut stats = ProducerStats::default();

    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::debug!("producer cancelled");
                return Ok(stats);
            }
            next = source.next() => next,
        };

        let Some(delta) = next else { break };
        let delta = delta.map_err(StreamError::source_error)?;
        if delta.is_empty() {
            continue;
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::debug!("producer cancelled");
                return Ok(stats);
            }
            written = writer.write_all(delta.as_bytes()) => written.map_err(StreamError::Pipe)?,
        }

        stats.deltas += 1;
        stats.bytes += delta.len();
    }

    writer.shutdown().await.map_err(StreamError::Pipe)?;
    Ok(stats)
}

/// Holds the first error recorded by either side of the pipe.
#[derive(Debug, Default)]
struct FirstError(Mutex<Option<StreamError>>);

impl FirstError {
    fn record(&self, err: StreamError) {
        let mut slot = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(err);
        } else {
            tracing::debug!(error = %err, "ignoring error after first failure");
        }
    }

    fn take(&self) -> Option<StreamError> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use llm_tools_files::MemorySink;

    fn deltas(parts: &[&str]) -> impl Stream<Item = std::io::Result<String>> + Send + 'static {
        let owned: Vec<_> = parts.iter().map(|p| Ok((*p).to_string())).collect();
        stream::iter(owned)
    }

    #[tokio::test]
    async fn test_zero_deltas() {
        let sink = MemorySink::new();
        let summary = Pipeline::default().run(deltas(&[]), &sink).await.unwrap();

        assert_eq!(summary, RunSummary::default());
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_empty_deltas_are_skipped() {
        let sink = MemorySink::new();
        let summary = Pipeline::default()
            .run(deltas(&["", "filepath: `a.go`\n```go\nA\n```\n", ""]), &sink)
            .await
            .unwrap();

        assert_eq!(summary.producer.deltas, 1);
        assert_eq!(sink.len(), 1);
    }

    #[tokio::test]
    async fn test_small_pipe_capacity() {
        let sink = MemorySink::new();
        let text = "filepath: `a.go`\n```go\npackage a\n\nfunc A() {}\n```\n";
        let summary = Pipeline::default()
            .with_pipe_capacity(1)
            .run(deltas(&[text]), &sink)
            .await
            .unwrap();

        assert_eq!(summary.producer.bytes, text.len());
        assert_eq!(
            sink.files()[0].content,
            "package a\n\nfunc A() {}\n"
        );
    }

    #[tokio::test]
    async fn test_format_error_is_returned() {
        let sink = MemorySink::new();
        let err = Pipeline::default()
            .run(deltas(&["```go\n", "oops\n", "```\n"]), &sink)
            .await
            .unwrap_err();

        assert!(err.is_format_error());
    }

    #[test]
    fn test_first_error_wins() {
        let errors = FirstError::default();
        errors.record(StreamError::Pipe(std::io::Error::other("first")));
        errors.record(StreamError::source_error(std::io::Error::other("second")));

        let err = errors.take().unwrap();
        assert!(matches!(err, StreamError::Pipe(_)));
        assert!(errors.take().is_none());
    }
}
