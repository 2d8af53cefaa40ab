//! System prompts handed to the chat model.

use std::fmt::Write;

use flowlink_mcp::ToolInfo;
use serde_json::Value;

/// System prompt for conversational queries.
pub const GENERAL_PROMPT: &str =
    "You are a helpful assistant. Answer questions conversationally.";

/// Response format the intent extractor understands.
const TOOL_CALL_FORMAT: &str = "\
Response format for tool calls:
ACTION: call_tool
TOOL: exact_tool_name
ARGUMENTS: {
    \"parameter\": value
}";

/// Build the system prompt for workflow queries.
///
/// Each tool is listed with its description and parameters as
/// `"name": type (required|optional) - description`.
pub fn build_tool_prompt(tools: &[ToolInfo]) -> String {
    let mut prompt =
        String::from("You are an assistant that can call tools through an MCP server.\n\n");

    prompt.push_str("Available tools:\n");
    if tools.is_empty() {
        prompt.push_str("No tools available\n");
    }
    for tool in tools {
        let description = tool.description.as_deref().unwrap_or("No description");
        let _ = writeln!(prompt, "- {}: {}", tool.name, description);
        let _ = writeln!(prompt, "  Parameters: {{{}}}", describe_parameters(tool));
    }

    prompt.push_str("\nIMPORTANT: Use EXACT tool names and parameter names.\n\n");
    prompt.push_str(TOOL_CALL_FORMAT);
    prompt
}

fn describe_parameters(tool: &ToolInfo) -> String {
    let Some(properties) = tool
        .input_schema
        .as_ref()
        .and_then(|schema| schema.get("properties"))
        .and_then(Value::as_object)
    else {
        return "No parameters".to_string();
    };
    if properties.is_empty() {
        return "No parameters".to_string();
    }

    let required = tool.required_parameters();
    properties
        .iter()
        .map(|(name, details)| {
            let kind = details.get("type").and_then(Value::as_str).unwrap_or("string");
            let requirement = if required.contains(&name.as_str()) {
                "required"
            } else {
                "optional"
            };
            match details.get("description").and_then(Value::as_str) {
                Some(desc) if !desc.is_empty() => {
                    format!("\"{}\": {} ({}) - {}", name, kind, requirement, desc)
                }
                _ => format!("\"{}\": {} ({})", name, kind, requirement),
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
