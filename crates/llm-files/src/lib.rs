//! Virtual files and output sinks for llm-tools.
//!
//! A [`VirtualFile`] is one generated file recovered from a model response:
//! a relative path plus its text content. Completed files are handed to a
//! [`FileSink`], which stores or displays them.
//!
//! # Features
//!
//! - **Strong types**: validated relative [`FilePath`]s and typed errors
//! - **Envelope rendering**: the same `filepath:` + fenced block convention
//!   the parser reads, see [`render_envelope`]
//! - **Sinks**: write to a folder ([`FolderSink`]), to any async writer such
//!   as stdout ([`WriterSink`]), or collect in memory ([`MemorySink`])
//!
//! # Examples
//!
//! ```
//! use llm_tools_files::{FileSink, MemorySink, VirtualFile};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let sink = MemorySink::new();
//! sink.dispatch(&VirtualFile::new("mocks/store.go", "package mocks\n"))
//!     .await
//!     .unwrap();
//!
//! assert_eq!(sink.len(), 1);
//! assert_eq!(sink.files()[0].path, "mocks/store.go");
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

pub mod envelope;
pub mod folder;
pub mod memory;
pub mod sink;
pub mod types;
pub mod writer;

// Re-export main types
pub use envelope::{DEFAULT_LANGUAGE, render_envelope};
pub use folder::FolderSink;
pub use memory::MemorySink;
pub use sink::FileSink;
pub use types::{FilePath, FilesError, Result, VirtualFile};
pub use writer::WriterSink;
