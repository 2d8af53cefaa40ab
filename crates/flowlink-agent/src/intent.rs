//! Tool-call extraction from free-form model output.
//!
//! Three shapes are recognised, tried in this order:
//!
//! ```text
//! ACTION: call_tool
//! TOOL: get_weather
//! ARGUMENTS: {"city": "Kuala Lumpur"}
//! ```
//!
//! a fenced JSON block such as `{"tool": "get_weather", "arguments": {...}}`,
//! and the inline form `call tool get_weather with {...}`.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

/// Keys naming the tool inside a fenced JSON block.
const TOOL_KEYS: &[&str] = &["tool", "name", "tool_name"];

/// Keys holding the arguments inside a fenced JSON block.
const ARGUMENT_KEYS: &[&str] = &["arguments", "args", "parameters"];

static INLINE_CALL: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bcall\s+tool\s+[`"']?([A-Za-z0-9_.\-]+)[`"']?\s+with\b"#).ok()
});

/// A tool call found in model output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedIntent {
    /// Tool to call; `None` when the text is not a tool call.
    pub tool_name: Option<String>,
    /// Arguments; empty when absent or malformed.
    pub arguments: Map<String, Value>,
}

impl ExtractedIntent {
    fn call(name: &str, arguments: Map<String, Value>) -> Option<Self> {
        let name = clean_name(name)?;
        Some(Self {
            tool_name: Some(name),
            arguments,
        })
    }

    /// Whether a tool name was found.
    pub fn is_tool_call(&self) -> bool {
        self.tool_name.is_some()
    }
}

/// Find a tool call in `text`.
///
/// Never fails: text without a recognised marker yields no tool name, and
/// malformed arguments yield an empty map.
pub fn extract_tool_call(text: &str) -> ExtractedIntent {
    let intent = action_block(text)
        .or_else(|| fenced_json(text))
        .or_else(|| inline_call(text))
        .unwrap_or_default();

    if let Some(name) = &intent.tool_name {
        tracing::debug!(tool = %name, arguments = intent.arguments.len(), "extracted tool call");
    }
    intent
}

/// `ACTION: call_tool` / `TOOL:` / `ARGUMENTS:` lines.
fn action_block(text: &str) -> Option<ExtractedIntent> {
    let has_action = text.lines().any(|line| {
        field(line, "ACTION").is_some_and(|v| v.trim().eq_ignore_ascii_case("call_tool"))
    });
    if !has_action {
        return None;
    }

    let name = text.lines().find_map(|line| field(line, "TOOL"))?;

    let arguments = find_label(text, "ARGUMENTS:")
        .map(|idx| parse_arguments(&text[idx..]))
        .unwrap_or_default();

    ExtractedIntent::call(name, arguments)
}

/// A fenced code block holding a JSON object with a tool name.
fn fenced_json(text: &str) -> Option<ExtractedIntent> {
    let mut rest = text;
    while let Some(open) = rest.find("```") {
        let after = &rest[open + 3..];
        let close = after.find("```")?;
        let block = &after[..close];
        rest = &after[close + 3..];

        // Drop an info string such as `json`.
        let body = match block.find('\n') {
            Some(nl) if !block[..nl].contains('{') => &block[nl + 1..],
            _ => block,
        };

        let Some(object) = balanced_object(body) else {
            continue;
        };
        let Ok(Value::Object(map)) = serde_json::from_str::<Value>(object) else {
            continue;
        };

        let Some(name) = TOOL_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
        else {
            continue;
        };

        let arguments = ARGUMENT_KEYS
            .iter()
            .find_map(|key| map.get(*key))
            .map(arguments_from_value)
            .unwrap_or_default();

        if let Some(intent) = ExtractedIntent::call(name, arguments) {
            return Some(intent);
        }
    }
    None
}

/// `call tool <name> with {...}`, case-insensitive.
fn inline_call(text: &str) -> Option<ExtractedIntent> {
    let caps = INLINE_CALL.as_ref()?.captures(text)?;
    let name = caps.get(1)?.as_str();
    let end = caps.get(0)?.end();
    ExtractedIntent::call(name, parse_arguments(&text[end..]))
}

/// Value of a `LABEL: value` line, label matched case-insensitively.
fn field<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let line = line.trim().trim_start_matches(['*', '-', ' ']);
    let (key, value) = line.split_once(':')?;
    let key = key.trim().trim_matches('*');
    key.eq_ignore_ascii_case(label).then_some(value.trim())
}

/// Byte offset just past `label`, matched case-insensitively.
fn find_label(text: &str, label: &str) -> Option<usize> {
    let upper = text.to_ascii_uppercase();
    upper.find(label).map(|idx| idx + label.len())
}

/// Parse the first balanced JSON object in `text` as an argument map.
fn parse_arguments(text: &str) -> Map<String, Value> {
    balanced_object(text)
        .and_then(|object| serde_json::from_str::<Value>(object).ok())
        .map(|v| arguments_from_value(&v))
        .unwrap_or_default()
}

fn arguments_from_value(value: &Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map.clone(),
        // Some models double-encode the arguments.
        Value::String(s) => parse_arguments(s),
        _ => Map::new(),
    }
}

/// The first `{...}` in `text` with balanced braces, skipping braces inside
/// JSON strings. `None` if there is no `{` or it never closes.
fn balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

fn clean_name(raw: &str) -> Option<String> {
    let name = raw
        .trim()
        .trim_matches(|c: char| matches!(c, '`' | '"' | '\'' | '*'))
        .split_whitespace()
        .next()?
        .trim_end_matches([',', '.', ';']);
    (!name.is_empty()).then(|| name.to_string())
}
