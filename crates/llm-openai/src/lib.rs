//! Streaming chat-completions client for llm-tools.
//!
//! Sends a chat request with `stream: true` and exposes the response as a
//! stream of text deltas, ready to feed into the block parser. Also carries
//! the prompt used to generate interface mocks.
//!
//! # Examples
//!
//! ```no_run
//! use llm_tools_openai::{ChatCompletionRequest, DEFAULT_MODEL, OpenAiClient, mock_generation_messages};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let messages = mock_generation_messages("mocks", "type Store interface{}", "go")?;
//! let request = ChatCompletionRequest::new(DEFAULT_MODEL, messages);
//!
//! let client = OpenAiClient::new(std::env::var("OPENAI_API_KEY")?)?;
//! let deltas = client.stream_chat(&request).await?;
//! # drop(deltas);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod client;
mod error;
pub mod prompt;
pub mod sse;
mod types;

pub use client::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_READ_TIMEOUT, DeltaStream, OpenAiClient};
pub use error::{OpenAiError, Result};
pub use prompt::{PromptError, mock_generation_messages};
pub use sse::decode_deltas;
pub use types::{ChatCompletionRequest, ChatMessage, ChatRole};
