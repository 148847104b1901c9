//! Core types, configuration, and errors for llm-tools.
//!
//! This crate provides the foundational types shared by the other crates in
//! the workspace.
//!
//! # Architecture
//!
//! The core consists of:
//! - Error hierarchy with contextual information
//! - CLI value types (`OutputFormat`, `ExitCode`)
//! - The persisted user configuration and its explicit location
//!   (`Config`, `ConfigPaths`)

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod error;

pub mod cli;
pub mod config;

pub use config::{Config, ConfigPaths};
pub use error::{Error, Result};
