//! Minimal decoder for `text/event-stream` response bodies.
//!
//! Only the `data:` field matters to the providers we speak to, so comments,
//! event names, and retry hints are dropped.

use crate::errors::AgentError;
use futures::{stream, Stream, StreamExt};
use std::collections::VecDeque;

/// Decodes the `data:` payloads of an SSE response body, one event per item.
///
/// Transport failures map to [`AgentError::AiStream`] and terminate the
/// stream. A trailing line without a newline is discarded, which is safe
/// here because every SSE event is newline-terminated.
pub(crate) fn data_events(
    response: reqwest::Response,
) -> impl Stream<Item = Result<String, AgentError>> + Send {
    let body = response.bytes_stream().boxed();
    stream::unfold(
        (body, Vec::new(), VecDeque::new()),
        |(mut body, mut buf, mut pending)| async move {
            loop {
                if let Some(payload) = pending.pop_front() {
                    return Some((Ok(payload), (body, buf, pending)));
                }
                match body.next().await {
                    Some(Ok(chunk)) => {
                        buf.extend_from_slice(&chunk);
                        drain_data_lines(&mut buf, &mut pending);
                    }
                    Some(Err(e)) => {
                        return Some((
                            Err(AgentError::AiStream(e.to_string())),
                            (body, buf, pending),
                        ));
                    }
                    None => return None,
                }
            }
        },
    )
}

/// Splits complete lines off the front of `buf`, queueing `data:` payloads.
fn drain_data_lines(buf: &mut Vec<u8>, pending: &mut VecDeque<String>) {
    while let Some(pos) = buf.iter().position(|&b| b == b'\n') {
        let line: Vec<u8> = buf.drain(..=pos).collect();
        let line = String::from_utf8_lossy(&line);
        let line = line.trim_end_matches(['\r', '\n']);
        if let Some(payload) = line.strip_prefix("data:") {
            pending.push_back(payload.trim_start().to_string());
        }
    }
}
