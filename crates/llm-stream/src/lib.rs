//! Streaming extraction of generated files from model output.
//!
//! Model responses announce each file with a `filepath` header followed by a
//! fenced code block. This crate recovers those files while the response is
//! still arriving:
//!
//! - [`BlockParser`]: the line-level state machine
//! - [`parse`]: drives the parser over an async reader into a
//!   [`FileSink`](llm_tools_files::FileSink)
//! - [`Pipeline`]: connects a stream of text deltas to the parser through an
//!   in-process pipe, with backpressure and cancellation
//!
//! # Examples
//!
//! ```
//! use futures::stream;
//! use llm_tools_files::MemorySink;
//! use llm_tools_stream::Pipeline;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let response = "Here are your mocks.\n\
//!                 filepath: `mocks/store.go`\n\
//!                 ```go\n\
//!                 package mocks\n\
//!                 ```\n";
//! let deltas = stream::iter(
//!     response
//!         .as_bytes()
//!         .chunks(7)
//!         .map(|c| Ok::<_, std::io::Error>(String::from_utf8_lossy(c).into_owned())),
//! );
//!
//! let sink = MemorySink::new();
//! Pipeline::default().run(deltas, &sink).await.unwrap();
//!
//! assert_eq!(sink.files()[0].path, "mocks/store.go");
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod error;
pub mod parser;
pub mod pipeline;

pub use error::{BoxError, FormatErrorKind, Result, StreamError};
pub use parser::{BlockParser, DEFAULT_MAX_LINE_LENGTH, ParseSummary, ParserOptions, parse};
pub use pipeline::{DEFAULT_PIPE_CAPACITY, Pipeline, ProducerStats, RunSummary};
