//! SSE frame decoding for JSON-RPC payloads.
//!
//! Streamable HTTP servers answer either with a `text/event-stream` body:
//!
//! ```text
//! event: message
//! data: {"jsonrpc":"2.0","id":1,"result":{}}
//!
//! ```
//!
//! or with a bare JSON document. Both are accepted. Nothing in here returns an
//! error: an undecodable body is `None` (or an empty list) and the caller
//! decides what that means.

use serde_json::Value;

/// SSE sentinel some servers send after the last event.
const DONE_SENTINEL: &str = "[DONE]";

/// Decode the JSON payload of a response body.
///
/// All `data:` lines are concatenated in order. Without any `data:` line the
/// whole body is parsed as JSON.
pub fn parse_frame(raw: &str) -> Option<Value> {
    let data: Vec<&str> = raw.lines().filter_map(data_field).collect();

    if data.is_empty() {
        return parse_bare(raw);
    }

    serde_json::from_str(&data.join("\n")).ok()
}

/// Decode every event in a response body.
///
/// Events are separated by blank lines; each event's `data:` lines form one
/// payload. If no single event parses, the body is handed to [`parse_frame`].
pub fn parse_frames(raw: &str) -> Vec<Value> {
    let events = split_events(raw);
    if events.is_empty() {
        return parse_bare(raw).into_iter().collect();
    }

    let parsed: Vec<Value> = events
        .iter()
        .filter_map(|lines| serde_json::from_str(&lines.join("\n")).ok())
        .collect();

    if parsed.is_empty() {
        parse_frame(raw).into_iter().collect()
    } else {
        parsed
    }
}

/// Whether a body uses SSE framing at all.
pub fn looks_like_sse(raw: &str) -> bool {
    raw.lines().any(|line| {
        let line = line.trim_start_matches('\u{feff}').trim_start();
        line.starts_with("data:") || line.starts_with("event:")
    })
}

/// Payload of a `data:` line, minus one optional leading space.
fn data_field(line: &str) -> Option<&str> {
    let line = line.trim_start_matches('\u{feff}').trim_start();
    let rest = line.strip_prefix("data:")?;
    let rest = rest.strip_prefix(' ').unwrap_or(rest);
    let rest = rest.strip_suffix('\r').unwrap_or(rest);
    if rest.trim() == DONE_SENTINEL {
        None
    } else {
        Some(rest)
    }
}

/// Group `data:` payloads by event.
fn split_events(raw: &str) -> Vec<Vec<&str>> {
    let mut events = Vec::new();
    let mut current = Vec::new();

    for line in raw.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                events.push(std::mem::take(&mut current));
            }
            continue;
        }
        if let Some(data) = data_field(line) {
            current.push(data);
        }
    }
    if !current.is_empty() {
        events.push(current);
    }

    events
}

fn parse_bare(raw: &str) -> Option<Value> {
    let trimmed = raw.trim_start_matches('\u{feff}').trim();
    if trimmed.is_empty() {
        return None;
    }
    serde_json::from_str(trimmed).ok()
}
