//! Formatting of replies for the chat front end.

use serde_json::Value;

const TRUNCATION_MARKER: &str = "...\n\n[Truncated]";

/// Format a successful tool result.
///
/// Output that parses as JSON is pretty-printed inside a `json` fence.
/// Replies longer than `limit` characters drop the fence and are cut on a
/// character boundary.
pub fn format_tool_reply(tool: &str, output: &str, limit: usize) -> String {
    let header = format!("✅ Tool: {}\n\n", tool);

    let pretty = serde_json::from_str::<Value>(output.trim())
        .ok()
        .filter(|v| v.is_object() || v.is_array())
        .and_then(|v| serde_json::to_string_pretty(&v).ok());

    let (full, body) = match pretty {
        Some(json) => (format!("{}```json\n{}\n```", header, json), json),
        None => (format!("{}{}", header, output), output.to_string()),
    };

    if char_len(&full) <= limit {
        return full;
    }
    format!(
        "{}{}",
        header,
        truncate(&body, limit.saturating_sub(char_len(&header)))
    )
}

/// Format an error for the user, within `limit` characters.
pub fn format_error_reply(error: &str, limit: usize) -> String {
    truncate(&format!("❌ {}", error), limit)
}

/// Cut `text` to at most `limit` characters, marker included, unless `limit`
/// is shorter than the marker itself.
pub fn truncate(text: &str, limit: usize) -> String {
    if char_len(text) <= limit {
        return text.to_string();
    }
    let keep = limit.saturating_sub(char_len(TRUNCATION_MARKER));
    let cut = text
        .char_indices()
        .nth(keep)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());
    let mut out = text[..cut].to_string();
    out.push_str(TRUNCATION_MARKER);
    out
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
