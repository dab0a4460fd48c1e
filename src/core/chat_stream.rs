use std::fmt;
use std::time::Duration;

use futures_util::StreamExt;
use memchr::memchr;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::{GenerateContentRequest, GenerateContentResponse};
use crate::utils::auth::add_auth_headers;
use crate::utils::url::construct_api_url;

/// Why a turn's stream could not be produced or was cut short.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamError {
    /// No live session exists to send the turn through.
    NoSession,
    /// The request never got a response (DNS, TLS, connection reset, ...).
    Transport(String),
    /// The API answered with a non-success status.
    Status { status: u16, detail: String },
    /// A stream payload was an error object or could not be understood.
    Payload(String),
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::NoSession => write!(f, "Chat session not initialized"),
            StreamError::Transport(detail) => write!(f, "Request failed: {detail}"),
            StreamError::Status { status, detail } => write!(f, "HTTP {status}: {detail}"),
            StreamError::Payload(detail) => write!(f, "Stream error: {detail}"),
        }
    }
}

impl std::error::Error for StreamError {}

#[derive(Clone, Debug, PartialEq)]
pub enum StreamMessage {
    Chunk(String),
    Error(StreamError),
    End,
}

fn extract_data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim_start)
}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .or_else(|| value.get("error").and_then(|v| v.as_str()))
        .or_else(|| value.get("message").and_then(|v| v.as_str()))?;

    let collapsed = summary.split_whitespace().collect::<Vec<_>>().join(" ");
    Some(collapsed.trim().to_string())
}

/// Condenses an API error body into one line suitable for diagnostics.
pub fn format_api_error(error_text: &str) -> String {
    let trimmed = error_text.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Ok(json_value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Some(summary) = extract_error_summary(&json_value).filter(|s| !s.is_empty()) {
            return summary;
        }
        return json_value.to_string();
    }

    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Interprets one SSE `data:` payload. Returns the text increment, `None` for
/// payloads that carry no text, or an error for error objects and garbage.
fn parse_data_payload(payload: &str) -> Result<Option<String>, StreamError> {
    if payload.trim().is_empty() {
        return Ok(None);
    }

    let value: serde_json::Value = serde_json::from_str(payload)
        .map_err(|_| StreamError::Payload(format_api_error(payload)))?;
    if value.get("error").is_some() {
        return Err(StreamError::Payload(format_api_error(payload)));
    }

    let response: GenerateContentResponse = serde_json::from_value(value)
        .map_err(|_| StreamError::Payload(format_api_error(payload)))?;
    Ok(response.text().filter(|text| !text.is_empty()))
}

/// Handles one SSE line, forwarding any text increment. An error payload
/// terminates the stream.
fn process_sse_line(
    line: &str,
    tx: &mpsc::UnboundedSender<(StreamMessage, u64)>,
    stream_id: u64,
) -> Result<(), StreamError> {
    let Some(payload) = extract_data_payload(line) else {
        return Ok(());
    };

    if let Some(text) = parse_data_payload(payload)? {
        let _ = tx.send((StreamMessage::Chunk(text), stream_id));
    }
    Ok(())
}

pub struct StreamParams {
    pub client: reqwest::Client,
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub request: GenerateContentRequest,
    pub cancel_token: CancellationToken,
    pub stream_id: u64,
}

impl fmt::Debug for StreamParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamParams")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("contents", &self.request.contents.len())
            .field("stream_id", &self.stream_id)
            .finish_non_exhaustive()
    }
}

pub fn stream_url(base_url: &str, model: &str) -> String {
    construct_api_url(
        base_url,
        &format!("models/{model}:streamGenerateContent?alt=sse"),
    )
}

async fn run_stream(
    params: StreamParams,
    tx: &mpsc::UnboundedSender<(StreamMessage, u64)>,
) -> Result<(), StreamError> {
    let StreamParams {
        client,
        base_url,
        api_key,
        model,
        request,
        cancel_token,
        stream_id,
    } = params;

    let http_request = client
        .post(stream_url(&base_url, &model))
        .header("Content-Type", "application/json");
    let http_request = add_auth_headers(http_request, &api_key);

    let response = http_request
        .json(&request)
        .send()
        .await
        .map_err(|err| StreamError::Transport(err.to_string()))?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "<no body>".to_string());
        return Err(StreamError::Status {
            status,
            detail: format_api_error(&error_text),
        });
    }

    let mut stream = response.bytes_stream();
    let mut buffer: Vec<u8> = Vec::new();

    while let Some(chunk) = stream.next().await {
        if cancel_token.is_cancelled() {
            return Ok(());
        }

        let chunk_bytes = chunk.map_err(|err| StreamError::Transport(err.to_string()))?;
        buffer.extend_from_slice(&chunk_bytes);

        while let Some(newline_pos) = memchr(b'\n', &buffer) {
            let line = match std::str::from_utf8(&buffer[..newline_pos]) {
                Ok(s) => s.trim().to_string(),
                Err(err) => {
                    warn!(stream_id, "invalid UTF-8 in stream: {err}");
                    buffer.drain(..=newline_pos);
                    continue;
                }
            };
            buffer.drain(..=newline_pos);
            process_sse_line(&line, tx, stream_id)?;
        }
    }

    // A final event may arrive without a trailing newline.
    if let Ok(rest) = std::str::from_utf8(&buffer) {
        process_sse_line(rest.trim(), tx, stream_id)?;
    }
    Ok(())
}

/// Spawns per-turn stream tasks and funnels their increments, tagged with the
/// turn's stream id, into one channel consumed by the UI loop.
#[derive(Clone)]
pub struct ChatStreamService {
    tx: mpsc::UnboundedSender<(StreamMessage, u64)>,
}

impl ChatStreamService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(StreamMessage, u64)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn spawn_stream(&self, params: StreamParams) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let cancel_token = params.cancel_token.clone();
            let stream_id = params.stream_id;
            debug!(stream_id, model = %params.model, "starting model stream");
            tokio::select! {
                result = run_stream(params, &tx) => {
                    if let Err(err) = result {
                        warn!(stream_id, "model stream failed: {err}");
                        let _ = tx.send((StreamMessage::Error(err), stream_id));
                    }
                    let _ = tx.send((StreamMessage::End, stream_id));
                }
                _ = cancel_token.cancelled() => {
                    debug!(stream_id, "model stream cancelled");
                }
            }
        });
    }

    /// Simulated reply used when no live model is engaged.
    pub fn spawn_demo_reply(
        &self,
        reply: String,
        delay: Duration,
        cancel_token: CancellationToken,
        stream_id: u64,
    ) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    let _ = tx.send((StreamMessage::Chunk(reply), stream_id));
                    let _ = tx.send((StreamMessage::End, stream_id));
                }
                _ = cancel_token.cancelled() => {}
            }
        });
    }

    #[cfg(test)]
    pub fn send_for_test(&self, message: StreamMessage, stream_id: u64) {
        let _ = self.tx.send((message, stream_id));
    }
}
