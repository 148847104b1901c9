//! Test helpers for llm-tools.
//!
//! [`serve_once`] binds a local port, accepts a single connection, records
//! the request, and answers with a canned [`Reply`]. It stands in for the
//! chat-completions API in integration tests.
//!
//! # Examples
//!
//! ```
//! use llm_tools_testing::{Reply, serve_once, sse_body};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let (url, server) = serve_once(Reply::event_stream(sse_body(&["hello"]))).await;
//! assert!(url.starts_with("http://127.0.0.1:"));
//! # server.abort();
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Final event of a completion stream.
pub const SSE_DONE: &str = "data: [DONE]\n\n";

/// Request received by the fake server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedRequest {
    /// Request line and headers
    pub head: String,
    /// Request body
    pub body: String,
}

impl CapturedRequest {
    /// Parses the request body as JSON.
    ///
    /// # Panics
    ///
    /// Panics if the body is not valid JSON.
    #[must_use]
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("request body is JSON")
    }

    /// Returns `true` if a header line matches `name: value`, ignoring case.
    #[must_use]
    pub fn has_header(&self, name: &str, value: &str) -> bool {
        self.head.lines().any(|line| {
            line.split_once(':').is_some_and(|(n, v)| {
                n.trim().eq_ignore_ascii_case(name) && v.trim().eq_ignore_ascii_case(value)
            })
        })
    }
}

/// Response the fake server sends back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    status_line: String,
    content_type: String,
    chunks: Vec<String>,
    gap: Duration,
}

impl Reply {
    /// `200 OK` event stream sent in one write.
    #[must_use]
    pub fn event_stream(body: impl Into<String>) -> Self {
        Self::status("HTTP/1.1 200 OK", "text/event-stream", body)
    }

    /// Reply with an arbitrary status line and content type.
    #[must_use]
    pub fn status(
        status_line: impl Into<String>,
        content_type: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            status_line: status_line.into(),
            content_type: content_type.into(),
            chunks: vec![body.into()],
            gap: Duration::ZERO,
        }
    }

    /// `200 OK` event stream written chunk by chunk, waiting `gap` before
    /// each chunk.
    ///
    /// The body has no `Content-Length` and ends when the connection closes.
    #[must_use]
    pub fn dripped(chunks: Vec<String>, gap: Duration) -> Self {
        Self {
            status_line: "HTTP/1.1 200 OK".to_string(),
            content_type: "text/event-stream".to_string(),
            chunks,
            gap,
        }
    }

    fn head(&self) -> String {
        let mut head = format!(
            "{}\r\nContent-Type: {}\r\nConnection: close\r\n",
            self.status_line, self.content_type
        );
        if self.gap.is_zero() {
            let length: usize = self.chunks.iter().map(String::len).sum();
            head.push_str(&format!("Content-Length: {length}\r\n"));
        }
        head.push_str("\r\n");
        head
    }
}

/// One server-sent event carrying a content delta.
#[must_use]
pub fn sse_event(delta: &str) -> String {
    let chunk = serde_json::json!({
        "choices": [{ "index": 0, "delta": { "content": delta } }]
    });
    format!("data: {chunk}\n\n")
}

/// Event stream with one event per delta, closed by [`SSE_DONE`].
#[must_use]
pub fn sse_body(deltas: &[&str]) -> String {
    let mut body: String = deltas.iter().map(|delta| sse_event(delta)).collect();
    body.push_str(SSE_DONE);
    body
}

/// Serves one request on a fresh local port.
///
/// Returns the base URL and a handle that resolves to the captured request
/// once the reply has been written.
///
/// # Panics
///
/// Panics if no local port can be bound. The server task panics if the
/// connection fails before the reply is written.
pub async fn serve_once(reply: Reply) -> (String, JoinHandle<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind local port");
    let addr = listener.local_addr().expect("local address");

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept connection");
        let request = read_request(&mut socket).await;

        socket
            .write_all(reply.head().as_bytes())
            .await
            .expect("write response head");
        for chunk in &reply.chunks {
            if !reply.gap.is_zero() {
                tokio::time::sleep(reply.gap).await;
            }
            socket.write_all(chunk.as_bytes()).await.expect("write chunk");
            socket.flush().await.expect("flush chunk");
        }
        socket.shutdown().await.expect("close connection");

        request
    });

    (format!("http://{addr}"), handle)
}

async fn read_request(socket: &mut TcpStream) -> CapturedRequest {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = socket.read(&mut chunk).await.expect("read request");
        assert!(n > 0, "connection closed before headers");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);
    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.expect("read request body");
        assert!(n > 0, "connection closed before body");
        buf.extend_from_slice(&chunk[..n]);
    }

    CapturedRequest {
        head,
        body: String::from_utf8_lossy(&buf[header_end..]).to_string(),
    }
}
