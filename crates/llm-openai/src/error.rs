//! Error types for the completion client.

use thiserror::Error;
use tokio_util::codec::LinesCodecError;

/// Errors raised while requesting or decoding a streamed completion.
///
/// # Examples
///
/// ```
/// use llm_tools_openai::OpenAiError;
///
/// let err = OpenAiError::Status {
///     status: 401,
///     body: "invalid api key".to_string(),
/// };
/// assert!(err.is_auth_error());
/// assert!(err.is_status_error());
/// ```
#[derive(Error, Debug)]
pub enum OpenAiError {
    /// No API key was supplied.
    #[error("openai api key is required")]
    MissingApiKey,

    /// The HTTP request could not be sent or the connection failed.
    #[error("sending completion request: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("completion request failed with status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, as text
        body: String,
    },

    /// The service reported an error inside the event stream.
    #[error("completion service error: {message}")]
    Api {
        /// Error message from the service
        message: String,
        /// Error type, when the service provided one
        kind: Option<String>,
    },

    /// A stream chunk was not valid JSON of the expected shape.
    #[error("decoding stream chunk: {0}")]
    Decode(#[from] serde_json::Error),

    /// The response body could not be read as lines.
    #[error("reading response stream: {0}")]
    Stream(#[from] LinesCodecError),
}

impl OpenAiError {
    /// Returns `true` for connection and transport failures.
    #[must_use]
    pub const fn is_transport_error(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Stream(_))
    }

    /// Returns `true` if the service answered with a non-success status.
    #[must_use]
    pub const fn is_status_error(&self) -> bool {
        matches!(self, Self::Status { .. })
    }

    /// Returns `true` if the service rejected the credentials.
    #[must_use]
    pub const fn is_auth_error(&self) -> bool {
        matches!(self, Self::MissingApiKey | Self::Status { status: 401, .. })
    }

    /// Returns `true` for errors reported inside the event stream.
    #[must_use]
    pub const fn is_api_error(&self) -> bool {
        matches!(self, Self::Api { .. })
    }

    /// Returns `true` if a chunk could not be decoded.
    #[must_use]
    pub const fn is_decode_error(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, OpenAiError>;
