//! Chat-side routing for the flowlink MCP bridge.
//!
//! Turns a user's message into either a conversational answer or an MCP tool
//! call:
//!
//! ```text
//! query ─▶ classify ─▶ prompt ─▶ ChatModel ─▶ extract_tool_call ─┬─▶ invoker ─▶ reply
//!                                                                └─▶ model text
//! ```
//!
//! The language model sits behind [`ChatModel`]. [`DirectModel`] treats the
//! user's text as the model output, which lets an operator drive tools by
//! writing the `ACTION: call_tool` format by hand.

pub mod bridge;
pub mod classify;
pub mod error;
pub mod intent;
pub mod model;
pub mod prompt;
pub mod reply;

pub use bridge::{Bridge, BridgeStatus};
pub use classify::{QueryKind, classify_query};
pub use error::{AgentError, Result};
pub use intent::{ExtractedIntent, extract_tool_call};
pub use model::{ChatModel, DirectModel, MockModel};
pub use prompt::{GENERAL_PROMPT, build_tool_prompt};
pub use reply::{format_error_reply, format_tool_reply};
