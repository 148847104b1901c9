//! llm-tools CLI library.
//!
//! Exposes the command implementations and output formatters used by the
//! `llm-tools` binary so they can be tested directly.

#![allow(clippy::unused_async)]
#![allow(clippy::missing_errors_doc)]

pub mod actions;
pub mod commands;
pub mod formatters;

pub use actions::ConfigAction;
pub use commands::exit_code_for;
