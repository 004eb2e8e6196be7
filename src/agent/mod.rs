//! Tool-calling agent for article retrieval.
//!
//! An alternative to rule-based extraction: the model issues its own
//! `search_news` calls and the last search that found articles becomes the
//! context for the answer.

mod runner;
mod tools;

pub use runner::{
    Agent, AgentFinding, AgentResponse, ModelTurn, OpenAiToolChat, ToolCallRecord, ToolChat,
};
pub use tools::{parse_tool_call, tool_definitions, ToolCall, ToolContext, ToolOutput};

#[cfg(test)]
pub(crate) use runner::testing;
