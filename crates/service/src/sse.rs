//! SSE chunk framing for `/api/update-canvas` when the caller asks for a
//! streamed `clarification` or `information` response (§6). Lines of
//! `data: <json>\n\n`; chunk kinds `{header, content, citation, follow_up,
//! done}` plus a terminal `error` kind on failure (§7). Clients tolerate
//! unknown kinds, so nothing here needs a closed enum at the wire level.

use std::convert::Infallible;

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{self, Stream};
use serde::Serialize;
use serde_json::json;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SseChunk {
    Header { title: String },
    Content { text: String },
    Citation { reference: String },
    FollowUp { suggestion: String },
    Done,
    Error { message: String, request_id: String },
}

impl SseChunk {
    fn to_event(&self) -> Event {
        Event::default().data(serde_json::to_string(self).unwrap_or_else(|_| json!({}).to_string()))
    }
}

/// Frame a fixed sequence of chunks (the Intent Engine has already produced
/// the whole response by the time this is called — there is no mid-flight
/// cancellation boundary inside a single `/api/update-canvas` turn) as an
/// SSE response body.
pub fn sse_response(chunks: Vec<SseChunk>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events: Vec<Result<Event, Infallible>> = chunks.iter().map(|c| Ok(c.to_event())).collect();
    Sse::new(stream::iter(events)).keep_alive(KeepAlive::default())
}

pub fn clarification_chunks(
    questions: &[canvas_core::schema::requests::ClarificationQuestion],
    changes_summary: &str,
) -> Vec<SseChunk> {
    let mut chunks = vec![SseChunk::Header { title: "Clarification needed".to_string() }];
    for q in questions {
        chunks.push(SseChunk::Content { text: q.question.clone() });
    }
    chunks.push(SseChunk::Content { text: changes_summary.to_string() });
    chunks.push(SseChunk::Done);
    chunks
}

pub fn information_chunks(response: &str, citations: &[String], follow_ups: &[String]) -> Vec<SseChunk> {
    let mut chunks = vec![SseChunk::Header { title: "Answer".to_string() }];
    chunks.push(SseChunk::Content { text: response.to_string() });
    for citation in citations {
        chunks.push(SseChunk::Citation { reference: citation.clone() });
    }
    for follow_up in follow_ups {
        chunks.push(SseChunk::FollowUp { suggestion: follow_up.clone() });
    }
    chunks.push(SseChunk::Done);
    chunks
}

pub fn error_chunks(message: &str, request_id: &str) -> Vec<SseChunk> {
    vec![SseChunk::Error { message: message.to_string(), request_id: request_id.to_string() }]
}
