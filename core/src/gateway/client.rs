//! HTTP transport to OpenAI-compatible chat-completions endpoints.
//!
//! Every provider in the table speaks the same wire shape (`POST
//! {base_url}/chat/completions`), which is what lets the gateway treat
//! "primary" and "secondary" as interchangeable weighted entries rather than
//! hardcoding a vendor SDK per provider.

use std::time::Duration;

use futures::Stream;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::config::ProviderSpec;
use super::events::ErrorCategory;

/// Per-call knobs layered on top of the provider's fixed `model`/`timeout`.
/// Mirrors the "optional `system`, `temperature`, `max_tokens`, `tools`,
/// `timeout`" input shape from the gateway's contract; `timeout` itself is a
/// provider-table property rather than a per-call one in this transport.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl GenerateOptions {
    pub fn with_temperature(temperature: f32) -> Self {
        Self {
            temperature: Some(temperature),
            max_tokens: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Debug, Deserialize, Default)]
struct StreamDelta {
    content: Option<String>,
}

/// A transport-level failure, already categorized the way the retry loop
/// needs it (whether it should count against the circuit, whether it's
/// retryable at all).
#[derive(Debug, Clone)]
pub struct TransportError {
    pub category: ErrorCategory,
    pub message: String,
    pub retry_after_s: Option<u64>,
}

impl TransportError {
    /// Auth and content-filter failures are caller/config problems, not
    /// provider outages, so they must not trip the circuit breaker.
    pub fn counts_against_circuit(&self) -> bool {
        !matches!(
            self.category,
            ErrorCategory::Auth | ErrorCategory::ContentFilter
        )
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category,
            ErrorCategory::RateLimited | ErrorCategory::Timeout | ErrorCategory::TransientNetwork
        )
    }
}

/// Thin wrapper over a single `reqwest::Client`, shared across providers.
#[derive(Clone)]
pub struct ProviderClient {
    http: reqwest::Client,
}

impl ProviderClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    /// Issue a single non-streaming chat-completion call and return the raw
    /// assistant message content, unparsed.
    pub async fn generate_text(
        &self,
        provider: &ProviderSpec,
        system_prompt: &str,
        user_prompt: &str,
        options: &GenerateOptions,
    ) -> Result<String, TransportError> {
        let body = ChatCompletionRequest {
            model: &provider.model,
            messages: vec![
                WireMessage {
                    role: "system",
                    content: system_prompt,
                },
                WireMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            response_format: None,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            stream: false,
        };

        self.send(provider, &body).await
    }

    /// Issue a chat-completion call requesting JSON-shaped output. The
    /// caller is still responsible for running the result through
    /// [`super::normalize::normalize_json_response`] and schema validation —
    /// this only sets the `response_format` hint providers honor loosely at
    /// best.
    pub async fn generate_object(
        &self,
        provider: &ProviderSpec,
        system_prompt: &str,
        user_prompt: &str,
        options: &GenerateOptions,
    ) -> Result<String, TransportError> {
        let body = ChatCompletionRequest {
            model: &provider.model,
            messages: vec![
                WireMessage {
                    role: "system",
                    content: system_prompt,
                },
                WireMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            response_format: Some(serde_json::json!({ "type": "json_object" })),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            stream: false,
        };

        self.send(provider, &body).await
    }

    /// Issue a streaming chat-completion call, yielding each text delta as
    /// it arrives over the wire (server-sent-events framing:
    /// `data: {...}\n\n`, terminated by `data: [DONE]`).
    pub async fn generate_stream(
        &self,
        provider: &ProviderSpec,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<impl Stream<Item = Result<String, TransportError>>, TransportError> {
        let body = ChatCompletionRequest {
            model: &provider.model,
            messages: vec![
                WireMessage {
                    role: "system",
                    content: system_prompt,
                },
                WireMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            response_format: None,
            temperature: None,
            max_tokens: None,
            stream: true,
        };

        let url = format!("{}/chat/completions", provider.base_url.trim_end_matches('/'));
        let response = self
            .http
            .post(&url)
            .timeout(provider.timeout)
            .bearer_auth(&provider.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_http_status(status, &response_body_text(response).await));
        }

        let byte_stream = response.bytes_stream();
        let state = (byte_stream, String::new(), false);

        let output = futures::stream::unfold(state, |(mut byte_stream, mut buffer, done)| async move {
            if done {
                return None;
            }
            loop {
                if let Some((event, rest)) = split_next_sse_event(&buffer) {
                    buffer = rest;
                    match parse_sse_data_line(&event) {
                        SseOutcome::Delta(text) => {
                            return Some((Ok(text), (byte_stream, buffer, false)));
                        }
                        SseOutcome::Done => {
                            return Some((Ok(String::new()), (byte_stream, buffer, true)));
                        }
                        SseOutcome::Skip => continue,
                    }
                }

                match byte_stream.next().await {
                    Some(Ok(chunk)) => {
                        buffer.push_str(&String::from_utf8_lossy(&chunk));
                    }
                    Some(Err(e)) => {
                        return Some((
                            Err(classify_reqwest_error(&e)),
                            (byte_stream, buffer, true),
                        ));
                    }
                    None => return None,
                }
            }
        })
        .filter(|item| {
            let keep = !matches!(item, Ok(s) if s.is_empty());
            futures::future::ready(keep)
        });

        Ok(output)
    }

    async fn send(
        &self,
        provider: &ProviderSpec,
        body: &ChatCompletionRequest<'_>,
    ) -> Result<String, TransportError> {
        let url = format!("{}/chat/completions", provider.base_url.trim_end_matches('/'));

        let response = self
            .http
            .post(&url)
            .timeout(provider.timeout)
            .bearer_auth(&provider.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_http_status(status, &response_body_text(response).await));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| TransportError {
                category: ErrorCategory::Other,
                message: format!("malformed response body: {e}"),
                retry_after_s: None,
            })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| TransportError {
                category: ErrorCategory::Other,
                message: "provider returned no choices".to_string(),
                retry_after_s: None,
            })
    }
}

impl Default for ProviderClient {
    fn default() -> Self {
        Self::new()
    }
}

async fn response_body_text(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string())
}

fn classify_reqwest_error(err: &reqwest::Error) -> TransportError {
    let category = if err.is_timeout() {
        ErrorCategory::Timeout
    } else {
        ErrorCategory::TransientNetwork
    };
    TransportError {
        category,
        message: err.to_string(),
        retry_after_s: None,
    }
}

fn classify_http_status(status: reqwest::StatusCode, body: &str) -> TransportError {
    use reqwest::StatusCode;
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => TransportError {
            category: ErrorCategory::Auth,
            message: format!("provider rejected credentials ({status}): {body}"),
            retry_after_s: None,
        },
        StatusCode::TOO_MANY_REQUESTS => TransportError {
            category: ErrorCategory::RateLimited,
            message: format!("rate limited ({status}): {body}"),
            retry_after_s: parse_retry_after(body),
        },
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => TransportError {
            category: ErrorCategory::Timeout,
            message: format!("provider timed out ({status}): {body}"),
            retry_after_s: None,
        },
        s if s.as_u16() == 413 => TransportError {
            category: ErrorCategory::ContextLimit,
            message: format!("context limit exceeded ({status}): {body}"),
            retry_after_s: None,
        },
        StatusCode::BAD_REQUEST if body.to_lowercase().contains("content") => TransportError {
            category: ErrorCategory::ContentFilter,
            message: format!("content filtered ({status}): {body}"),
            retry_after_s: None,
        },
        s if s.is_server_error() => TransportError {
            category: ErrorCategory::TransientNetwork,
            message: format!("provider server error ({status}): {body}"),
            retry_after_s: None,
        },
        _ => TransportError {
            category: ErrorCategory::Other,
            message: format!("unexpected status ({status}): {body}"),
            retry_after_s: None,
        },
    }
}

/// Best-effort parse of a numeric `retry_after` hint embedded in a JSON
/// error body (providers are inconsistent about header vs body placement).
fn parse_retry_after(body: &str) -> Option<u64> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("retry_after")
        .or_else(|| value.get("error").and_then(|e| e.get("retry_after")))
        .and_then(|v| v.as_u64())
}

enum SseOutcome {
    Delta(String),
    Done,
    Skip,
}

/// Split the next complete `\n\n`-terminated SSE event off the front of
/// `buffer`, returning the event text and the remaining buffer.
fn split_next_sse_event(buffer: &str) -> Option<(String, String)> {
    let idx = buffer.find("\n\n")?;
    let event = buffer[..idx].to_string();
    let rest = buffer[idx + 2..].to_string();
    Some((event, rest))
}

/// Parse a single SSE event (one or more `data: ...` lines) into either a
/// text delta, the terminal `[DONE]` marker, or a line worth skipping
/// (comments, keep-alives, empty deltas).
fn parse_sse_data_line(event: &str) -> SseOutcome {
    for line in event.lines() {
        let Some(data) = line.strip_prefix("data:") else {
            continue;
        };
        let data = data.trim();
        if data == "[DONE]" {
            return SseOutcome::Done;
        }
        let Ok(chunk) = serde_json::from_str::<StreamChunk>(data) else {
            continue;
        };
        if let Some(content) = chunk.choices.into_iter().next().and_then(|c| c.delta.content) {
            if !content.is_empty() {
                return SseOutcome::Delta(content);
            }
        }
    }
    SseOutcome::Skip
}

/// Smallest sleep between retry attempts, per the exponential backoff
/// schedule: `initial_delay * backoff_factor.powi(attempt)`.
pub fn backoff_delay(initial: Duration, factor: f64, attempt: u32) -> Duration {
    let millis = (initial.as_millis() as f64) * factor.powi(attempt as i32);
    Duration::from_millis(millis.round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_geometrically() {
        let d0 = backoff_delay(Duration::from_millis(1000), 2.0, 0);
        let d1 = backoff_delay(Duration::from_millis(1000), 2.0, 1);
        let d2 = backoff_delay(Duration::from_millis(1000), 2.0, 2);
        assert_eq!(d0, Duration::from_millis(1000));
        assert_eq!(d1, Duration::from_millis(2000));
        assert_eq!(d2, Duration::from_millis(4000));
    }

    #[test]
    fn auth_and_content_filter_do_not_count_against_circuit() {
        let auth = TransportError {
            category: ErrorCategory::Auth,
            message: "x".into(),
            retry_after_s: None,
        };
        let filtered = TransportError {
            category: ErrorCategory::ContentFilter,
            message: "x".into(),
            retry_after_s: None,
        };
        assert!(!auth.counts_against_circuit());
        assert!(!filtered.counts_against_circuit());
    }

    #[test]
    fn timeout_and_rate_limit_count_against_circuit_and_are_retryable() {
        let timeout = TransportError {
            category: ErrorCategory::Timeout,
            message: "x".into(),
            retry_after_s: None,
        };
        assert!(timeout.counts_against_circuit());
        assert!(timeout.is_retryable());
    }

    #[test]
    fn retry_after_parsed_from_body() {
        let body = r#"{"retry_after": 30}"#;
        assert_eq!(parse_retry_after(body), Some(30));
    }

    #[test]
    fn splits_one_complete_sse_event_off_buffer() {
        let buffer = "data: {\"a\":1}\n\ndata: {\"a\":2}\n\n";
        let (event, rest) = split_next_sse_event(buffer).unwrap();
        assert_eq!(event, "data: {\"a\":1}");
        assert_eq!(rest, "data: {\"a\":2}\n\n");
    }

    #[test]
    fn incomplete_event_yields_no_split() {
        let buffer = "data: {\"a\":1}";
        assert!(split_next_sse_event(buffer).is_none());
    }

    #[test]
    fn parses_delta_content_from_stream_chunk() {
        let event = "data: {\"choices\":[{\"delta\":{\"content\":\"hello\"}}]}";
        match parse_sse_data_line(event) {
            SseOutcome::Delta(text) => assert_eq!(text, "hello"),
            _ => panic!("expected delta"),
        }
    }

    #[test]
    fn recognizes_done_marker() {
        assert!(matches!(parse_sse_data_line("data: [DONE]"), SseOutcome::Done));
    }

    #[test]
    fn skips_empty_delta_chunks() {
        let event = "data: {\"choices\":[{\"delta\":{}}]}";
        assert!(matches!(parse_sse_data_line(event), SseOutcome::Skip));
    }
}
