//! Server-sent event decoding for streamed completions.
//!
//! The response body is a sequence of lines. Each `data: {json}` line carries
//! one chunk whose first choice holds the next piece of text; `data: [DONE]`
//! ends the stream. Comment lines, `event:` fields, and blank separators are
//! skipped.

use crate::error::{OpenAiError, Result};
use crate::types::StreamChunk;
use bytes::Bytes;
use futures::{Stream, StreamExt, TryStreamExt, future};
use tokio_util::codec::{FramedRead, LinesCodec};
use tokio_util::io::StreamReader;

/// Longest accepted event line in bytes.
pub const MAX_EVENT_LINE_LENGTH: usize = 1024 * 1024;

const DATA_FIELD: &str = "data:";
const DONE_MARKER: &str = "[DONE]";

#[derive(Debug, PartialEq, Eq)]
enum SseEvent {
    Delta(String),
    Done,
}

/// Turns a raw response body into a stream of text deltas.
///
/// Empty deltas are skipped. The stream ends at `[DONE]` or when the body
/// ends; an error event from the service is yielded as
/// [`OpenAiError::Api`].
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use futures::{TryStreamExt, stream};
/// use llm_tools_openai::decode_deltas;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let body = stream::iter([Ok::<_, std::io::Error>(Bytes::from_static(
///     b"data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\ndata: [DONE]\n\n",
/// ))]);
///
/// let deltas: Vec<String> = decode_deltas(body).try_collect().await.unwrap();
/// assert_eq!(deltas, ["Hi"]);
/// # }
/// ```
pub fn decode_deltas<S, E>(body: S) -> impl Stream<Item = Result<String>> + Send + 'static
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
    E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
{
    let reader = StreamReader::new(body.map(|chunk| chunk.map_err(std::io::Error::other)));
    let codec = LinesCodec::new_with_max_length(MAX_EVENT_LINE_LENGTH);

    FramedRead::new(reader, codec)
        .map_err(OpenAiError::from)
        .try_filter_map(|line| future::ready(decode_line(&line)))
        .try_take_while(|event| future::ready(Ok(*event != SseEvent::Done)))
        .map_ok(|event| match event {
            SseEvent::Delta(text) => text,
            SseEvent::Done => String::new(),
        })
}

fn decode_line(line: &str) -> Result<Option<SseEvent>> {
    let Some(data) = line.strip_prefix(DATA_FIELD) else {
        return Ok(None);
    };
    let data = data.trim();
    if data.is_empty() {
        return Ok(None);
    }
    if data == DONE_MARKER {
        tracing::debug!("completion stream done");
        return Ok(Some(SseEvent::Done));
    }

    let chunk: StreamChunk = serde_json::from_str(data)?;
    if let Some(error) = chunk.error {
        return Err(OpenAiError::Api {
            message: error.message,
            kind: error.kind,
        });
    }

    let content = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .unwrap_or_default();

    Ok((!content.is_empty()).then_some(SseEvent::Delta(content)))
}
