//! Line-oriented parser for `filepath` headers and fenced code blocks.
//!
//! The parser is a small state machine. [`BlockParser`] consumes one line at a
//! time and returns a completed [`VirtualFile`] whenever a block closes;
//! [`parse`] drives it over any async reader and hands each completed file to
//! a [`FileSink`] before reading the next line.
//!
//! # Line categories
//!
//! Evaluated in order:
//!
//! 1. A line starting with `filepath` starts a new record. The `filepath: `
//!    prefix, surrounding backticks, and whitespace are stripped from the path.
//! 2. A bare fence while a block is open closes it and dispatches the record.
//! 3. A fence tagged with the configured language opens a block.
//! 4. Any other line inside a block is appended to the current record.
//! 5. Everything else is prose and is discarded.
//!
//! # Examples
//!
//! ```
//! use llm_tools_stream::{BlockParser, ParserOptions};
//!
//! let text = "Here you go:\nfilepath: `a.go`\n```go\nfunc A(){}\n```\n";
//! let files = BlockParser::collect(text, ParserOptions::default()).unwrap();
//!
//! assert_eq!(files.len(), 1);
//! assert_eq!(files[0].path, "a.go");
//! assert_eq!(files[0].content, "func A(){}\n");
//! ```

use crate::error::{FormatErrorKind, Result, StreamError};
use futures::StreamExt;
use llm_tools_files::envelope::{FENCE, FILEPATH_MARKER, FILEPATH_PREFIX};
use llm_tools_files::{DEFAULT_LANGUAGE, FileSink, VirtualFile};
use tokio::io::AsyncRead;
use tokio_util::codec::{FramedRead, LinesCodec};

/// Longest accepted line in bytes.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 64 * 1024;

/// Parser configuration.
///
/// # Examples
///
/// ```
/// use llm_tools_stream::ParserOptions;
///
/// let options = ParserOptions::default().with_language("rust").strict(true);
/// assert_eq!(options.language, "rust");
/// assert!(options.strict);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserOptions {
    /// Language tag that must follow the fence on opening lines
    pub language: String,
    /// Fail instead of warning when input ends with an open record
    pub strict: bool,
    /// Maximum line length in bytes
    pub max_line_length: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            strict: false,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

impl ParserOptions {
    /// Sets the fence language tag.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Enables or disables strict end-of-stream checking.
    #[must_use]
    pub const fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Sets the maximum line length in bytes.
    #[must_use]
    pub const fn with_max_line_length(mut self, max: usize) -> Self {
        self.max_line_length = max;
        self
    }
}

/// Counters reported when a parse finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseSummary {
    /// Lines read
    pub lines: usize,
    /// Records handed to the sink
    pub dispatched: usize,
    /// Prose lines outside any block
    pub discarded: usize,
}

/// Incremental parser state.
///
/// Holds only the current record; completed records are returned from
/// [`feed`](Self::feed) and never retained. The current record stays current
/// after its block closes, so a second block without a new header appends to
/// it and returns it again.
#[derive(Debug)]
pub struct BlockParser {
    options: ParserOptions,
    fence_open: String,
    current: Option<VirtualFile>,
    inside_block: bool,
    // Set by a header, cleared when the record is dispatched.
    pending: bool,
    summary: ParseSummary,
}

impl BlockParser {
    /// Creates a parser with no current record.
    #[must_use]
    pub fn new(options: ParserOptions) -> Self {
        let fence_open = format!("{FENCE}{}", options.language);
        Self {
            options,
            fence_open,
            current: None,
            inside_block: false,
            pending: false,
            summary: ParseSummary::default(),
        }
    }

    /// Returns `true` while a fenced block is open.
    #[must_use]
    pub const fn is_inside_block(&self) -> bool {
        self.inside_block
    }

    /// Returns the current record, if any header has been seen.
    #[must_use]
    pub const fn current(&self) -> Option<&VirtualFile> {
        self.current.as_ref()
    }

    /// Returns the counters so far.
    #[must_use]
    pub const fn summary(&self) -> ParseSummary {
        self.summary
    }

    /// Consumes one line (without its terminator).
    ///
    /// Returns the completed record when `line` closes a block.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Format`] when a block closes or receives content
    /// before any header, or when a header has an empty path.
    pub fn feed(&mut self, line: &str) -> Result<Option<VirtualFile>> {
        self.summary.lines += 1;
        let line_no = self.summary.lines;
        let format_error = |kind| StreamError::Format {
            line: line_no,
            kind,
        };

        if line.starts_with(FILEPATH_MARKER) {
            let path = header_path(line);
            if path.is_empty() {
                return Err(format_error(FormatErrorKind::EmptyFilePath));
            }
            if self.pending {
                tracing::debug!(
                    line = line_no,
                    "abandoning unclosed record for new header"
                );
            }
            tracing::debug!(line = line_no, path, "file header");
            self.current = Some(VirtualFile::empty(path));
            self.pending = true;
            return Ok(None);
        }

        let is_bare_fence = line.trim_end() == FENCE;

        if is_bare_fence && self.inside_block {
            self.inside_block = false;
            let Some(file) = &self.current else {
                return Err(format_error(FormatErrorKind::UnexpectedEndOfBlock));
            };
            self.pending = false;
            self.summary.dispatched += 1;
            tracing::debug!(line = line_no, path = %file.path, bytes = file.size(), "block closed");
            return Ok(Some(file.clone()));
        }

        if line.starts_with(&self.fence_open) {
            self.inside_block = true;
            tracing::debug!(line = line_no, "block opened");
            return Ok(None);
        }

        if self.inside_block {
            let Some(file) = &mut self.current else {
                return Err(format_error(FormatErrorKind::UnexpectedLineInsideBlock));
            };
            file.push_line(line);
            return Ok(None);
        }

        self.summary.discarded += 1;
        Ok(None)
    }

    /// Ends the parse and returns the counters.
    ///
    /// An open record at end of input is dropped with a warning, or rejected
    /// in strict mode.
    ///
    /// # Errors
    ///
    /// Returns [`FormatErrorKind::UnterminatedBlock`] in strict mode when a
    /// record or block is still open.
    pub fn finish(self) -> Result<ParseSummary> {
        if self.pending || self.inside_block {
            let path = self.current.as_ref().map(|f| f.path.as_str());
            if self.options.strict {
                return Err(StreamError::Format {
                    line: self.summary.lines,
                    kind: FormatErrorKind::UnterminatedBlock,
                });
            }
            tracing::warn!(
                path = path.unwrap_or("<none>"),
                "input ended inside an open block; partial file dropped"
            );
        }
        Ok(self.summary)
    }

    /// Parses a complete string and returns every dispatched record.
    ///
    /// # Errors
    ///
    /// Returns the first format error.
    pub fn collect(text: &str, options: ParserOptions) -> Result<Vec<VirtualFile>> {
        let mut parser = Self::new(options);
        let mut files = Vec::new();
        for line in text.lines() {
            if let Some(file) = parser.feed(line)? {
                files.push(file);
            }
        }
        parser.finish()?;
        Ok(files)
    }
}

fn header_path(line: &str) -> &str {
    line.strip_prefix(FILEPATH_PREFIX)
        .unwrap_or(line)
        .trim()
        .trim_matches('`')
        .trim()
}

/// Reads lines from `reader` and dispatches each completed record to `sink`.
///
/// Each dispatch completes before the next line is read. Lines may end in
/// `\n` or `\r\n`; a final line without a terminator is still processed.
///
/// # Errors
///
/// Returns the first format, read, or sink error. Records after the failing
/// point are never dispatched.
///
/// # Examples
///
/// ```
/// use llm_tools_files::MemorySink;
/// use llm_tools_stream::{ParserOptions, parse};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let input: &[u8] = b"filepath: `a.go`\r\n```go\r\nfunc A(){}\r\n```";
/// let sink = MemorySink::new();
///
/// let summary = parse(input, &sink, ParserOptions::default()).await.unwrap();
///
/// assert_eq!(summary.dispatched, 1);
/// assert_eq!(sink.files()[0].content, "func A(){}\n");
/// # }
/// ```
pub async fn parse<R, S>(reader: R, sink: &S, options: ParserOptions) -> Result<ParseSummary>
where
    R: AsyncRead + Unpin,
    S: FileSink + ?Sized,
{
    let codec = LinesCodec::new_with_max_length(options.max_line_length);
    let mut lines = FramedRead::new(reader, codec);
    let mut parser = BlockParser::new(options);

    while let Some(line) = lines.next().await {
        let line = line?;
        tracing::trace!(line = %line, "read line");
        if let Some(file) = parser.feed(&line)? {
            sink.dispatch(&file)
                .await
                .map_err(|source| StreamError::Sink {
                    path: file.path.clone(),
                    source,
                })?;
        }
    }

    parser.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use llm_tools_files::{MemorySink, render_envelope};

    fn collect(text: &str) -> Result<Vec<VirtualFile>> {
        BlockParser::collect(text, ParserOptions::default())
    }

    #[test]
    fn test_two_blocks_in_order() {
        let text = "filepath: `a.go`\n```go\nfunc A(){}\n```\nfilepath: `b.go`\n```go\nfunc B(){}\n```\n";
        let files = collect(text).unwrap();
        assert_eq!(
            files,
            vec![
                VirtualFile::new("a.go", "func A(){}\n"),
                VirtualFile::new("b.go", "func B(){}\n"),
            ]
        );
    }

    #[test]
    fn test_prose_is_discarded() {
        let text = "Sure! Here are the mocks.\n\nfilepath: `a.go`\nSome words\n```go\npackage a\n```\nThat's all.\n";
        let mut parser = BlockParser::new(ParserOptions::default());
        let mut files = Vec::new();
        for line in text.lines() {
            files.extend(parser.feed(line).unwrap());
        }
        let summary = parser.finish().unwrap();

        assert_eq!(files, vec![VirtualFile::new("a.go", "package a\n")]);
        assert_eq!(summary.lines, 8);
        assert_eq!(summary.dispatched, 1);
        assert_eq!(summary.discarded, 4);
    }

    #[test]
    fn test_header_variants() {
        for header in [
            "filepath: `mocks/a.go`",
            "filepath: mocks/a.go",
            "filepath: `mocks/a.go`  ",
            "filepath:  ` mocks/a.go ` ",
        ] {
            let text = format!("{header}\n```go\nx\n```\n");
            let files = collect(&text).unwrap();
            assert_eq!(files[0].path, "mocks/a.go", "header: {header:?}");
        }
    }

    #[test]
    fn test_empty_header_path_fails() {
        let err = collect("filepath: ``\n```go\nx\n```\n").unwrap_err();
        assert_eq!(err.format_kind(), Some(FormatErrorKind::EmptyFilePath));
        assert!(matches!(err, StreamError::Format { line: 1, .. }));
    }

    #[test]
    fn test_close_without_header_fails() {
        let err = collect("```go\n```\n").unwrap_err();
        assert_eq!(
            err.format_kind(),
            Some(FormatErrorKind::UnexpectedEndOfBlock)
        );
        assert!(matches!(err, StreamError::Format { line: 2, .. }));
    }

    #[test]
    fn test_content_without_header_fails() {
        let err = collect("intro\n```go\npackage a\n```\n").unwrap_err();
        assert_eq!(
            err.format_kind(),
            Some(FormatErrorKind::UnexpectedLineInsideBlock)
        );
        assert!(matches!(err, StreamError::Format { line: 3, .. }));
    }

    #[test]
    fn test_bare_fence_outside_block_is_prose() {
        let text = "```\nfilepath: `a.go`\n```go\nA\n```\n```\n";
        let files = collect(text).unwrap();
        assert_eq!(files, vec![VirtualFile::new("a.go", "A\n")]);
    }

    #[test]
    fn test_other_language_fence_is_not_opened() {
        let text = "filepath: `a.go`\n```python\nprint()\n```\n";
        let files = collect(text).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_custom_language() {
        let options = ParserOptions::default().with_language("rust");
        let text = "filepath: `src/lib.rs`\n```rust\npub fn a() {}\n```\n";
        let files = BlockParser::collect(text, options).unwrap();
        assert_eq!(files, vec![VirtualFile::new("src/lib.rs", "pub fn a() {}\n")]);
    }

    #[test]
    fn test_empty_language_accepts_bare_open() {
        let options = ParserOptions::default().with_language("");
        let text = "filepath: `notes.txt`\n```\nhello\n```\n";
        let files = BlockParser::collect(text, options).unwrap();
        assert_eq!(files, vec![VirtualFile::new("notes.txt", "hello\n")]);
    }

    #[test]
    fn test_blank_and_indented_lines_are_preserved() {
        let text = "filepath: `a.go`\n```go\npackage a\n\n\tfunc A() {}\n```\n";
        let files = collect(text).unwrap();
        assert_eq!(files[0].content, "package a\n\n\tfunc A() {}\n");
    }

    #[test]
    fn test_fence_close_tolerates_trailing_whitespace() {
        let files = collect("filepath: `a.go`\n```go\nA\n```   \n").unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_second_block_without_header_redispatches() {
        let text = "filepath: `a.go`\n```go\nA\n```\n```go\nB\n```\n";
        let files = collect(text).unwrap();
        assert_eq!(
            files,
            vec![
                VirtualFile::new("a.go", "A\n"),
                VirtualFile::new("a.go", "A\nB\n"),
            ]
        );
    }

    #[test]
    fn test_header_inside_block_switches_record() {
        let text = "filepath: `a.go`\n```go\nA\nfilepath: `b.go`\nB\n```\n";
        let files = collect(text).unwrap();
        assert_eq!(files, vec![VirtualFile::new("b.go", "B\n")]);
    }

    #[test]
    fn test_unclosed_trailing_block_lenient() {
        let text = "filepath: `a.go`\n```go\nA\n```\nfilepath: `b.go`\n```go\nB\n";
        let files = collect(text).unwrap();
        assert_eq!(files, vec![VirtualFile::new("a.go", "A\n")]);
    }

    #[test]
    fn test_unclosed_trailing_block_strict() {
        let options = ParserOptions::default().strict(true);
        let text = "filepath: `a.go`\n```go\nA\n";
        let err = BlockParser::collect(text, options).unwrap_err();
        assert_eq!(err.format_kind(), Some(FormatErrorKind::UnterminatedBlock));
        assert!(matches!(err, StreamError::Format { line: 3, .. }));
    }

    #[test]
    fn test_strict_accepts_closed_input() {
        let options = ParserOptions::default().strict(true);
        let files = BlockParser::collect("filepath: `a.go`\n```go\nA\n```\nbye\n", options).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_envelope_round_trip() {
        let files = vec![
            VirtualFile::new("mocks/a.go", "package mocks\n\nfunc A() {}\n"),
            VirtualFile::new("mocks/empty.go", ""),
            VirtualFile::new("mocks/b.go", "package mocks\n"),
        ];
        let text: String = files.iter().map(|f| render_envelope(f, "go")).collect();
        assert_eq!(collect(&text).unwrap(), files);
    }

    #[test]
    fn test_rendered_content_without_final_newline_gains_one() {
        let text = render_envelope(&VirtualFile::new("a.go", "x"), "go");
        assert_eq!(collect(&text).unwrap(), vec![VirtualFile::new("a.go", "x\n")]);
    }

    #[tokio::test]
    async fn test_parse_reader_with_crlf_and_missing_final_newline() {
        let input: &[u8] = b"filepath: `a.go`\r\n```go\r\nA\r\n```";
        let sink = MemorySink::new();
        let summary = parse(input, &sink, ParserOptions::default()).await.unwrap();

        assert_eq!(summary.lines, 4);
        assert_eq!(sink.files(), vec![VirtualFile::new("a.go", "A\n")]);
    }

    #[tokio::test]
    async fn test_parse_rejects_overlong_line() {
        let mut input = b"filepath: `a.go`\n```go\n".to_vec();
        input.extend(std::iter::repeat_n(b'x', 128));
        input.extend(b"\n```\n");

        let sink = MemorySink::new();
        let options = ParserOptions::default().with_max_line_length(64);
        let err = parse(input.as_slice(), &sink, options).await.unwrap_err();

        assert!(matches!(err, StreamError::Read(_)));
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_parse_empty_input() {
        let sink = MemorySink::new();
        let summary = parse(&b""[..], &sink, ParserOptions::default()).await.unwrap();
        assert_eq!(summary, ParseSummary::default());
        assert!(sink.is_empty());
    }
}
