//! Streaming chat-completions client.

use crate::error::{OpenAiError, Result};
use crate::sse::decode_deltas;
use crate::types::ChatCompletionRequest;
use futures::Stream;
use reqwest::header;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::pin::Pin;
use std::time::Duration;

/// Default API origin.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Default model for mock generation.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest silence allowed between two chunks of a response body.
///
/// Completions stream for as long as the model keeps producing tokens, so
/// there is no deadline on the whole request.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(120);

/// Stream of text deltas from a completion.
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Client for the streamed chat-completions endpoint.
///
/// The API key is held as a [`SecretString`] and never appears in `Debug`
/// output.
///
/// # Examples
///
/// ```no_run
/// use futures::TryStreamExt;
/// use llm_tools_openai::{ChatCompletionRequest, ChatMessage, OpenAiClient};
///
/// # async fn run() -> llm_tools_openai::Result<()> {
/// let client = OpenAiClient::new("sk-...")?;
/// let request = ChatCompletionRequest::new("gpt-3.5-turbo", vec![ChatMessage::user("hi")]);
///
/// let text: String = client.stream_chat(&request).await?.try_collect().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

impl OpenAiClient {
    /// Creates a client for the default API origin.
    ///
    /// # Errors
    ///
    /// Returns [`OpenAiError::MissingApiKey`] if `api_key` is empty, or
    /// [`OpenAiError::Request`] if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(OpenAiError::MissingApiKey);
        }

        Ok(Self {
            http: http_client(DEFAULT_READ_TIMEOUT)?,
            api_key: SecretString::from(api_key),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Points the client at another origin, such as a local test server.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Replaces the idle read timeout between body chunks.
    ///
    /// # Errors
    ///
    /// Returns [`OpenAiError::Request`] if the HTTP client cannot be rebuilt.
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Result<Self> {
        self.http = http_client(read_timeout)?;
        Ok(self)
    }

    /// Returns the API origin.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends `request` and returns the completion as a stream of text deltas.
    ///
    /// # Errors
    ///
    /// Returns [`OpenAiError::Request`] if the request cannot be sent and
    /// [`OpenAiError::Status`] for a non-success response. Errors while the
    /// body streams are yielded by the returned stream.
    pub async fn stream_chat(&self, request: &ChatCompletionRequest) -> Result<DeltaStream> {
        let url = format!("{}{CHAT_COMPLETIONS_PATH}", self.base_url);
        tracing::debug!(
            url = %url,
            model = %request.model,
            messages = request.messages.len(),
            "requesting completion"
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .header(header::ACCEPT, "text/event-stream")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(OpenAiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(status = status.as_u16(), "completion stream opened");
        Ok(Box::pin(decode_deltas(response.bytes_stream())))
    }
}

fn http_client(read_timeout: Duration) -> Result<reqwest::Client> {
    let http = reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .read_timeout(read_timeout)
        .build()?;
    Ok(http)
}

impl fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"****")
            .finish_non_exhaustive()
    }
}
