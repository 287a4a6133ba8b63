//! Agent-level streaming events.
//!
//! The streaming executor turns provider chunks into higher-level events
//! the conversation shell renders incrementally. Multi-round tool use is
//! transparent: the consumer sees one flat event sequence per turn,
//! terminated by exactly one `Done` or `Error`.

use docsmith_core::message::Message;
use serde::{Deserialize, Serialize};

/// Events emitted by the agent during streaming execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentStreamEvent {
    /// Partial text from the model, forwarded as it arrives.
    TextDelta { content: String },

    /// Emitted once per turn when accumulated text passed the cap;
    /// deltas keep flowing but are no longer accumulated.
    Truncated { limit: usize },

    /// A tool call index was seen for the first time.
    ToolCallStarted { id: String, name: String },

    /// Tool execution finished (successfully or not).
    ToolCallCompleted {
        id: String,
        name: String,
        success: bool,
        output: String,
    },

    /// The turn is complete. `messages` holds everything appended during
    /// the turn (assistant tool-call messages, tool results, and the
    /// final assistant message), in order.
    Done {
        messages: Vec<Message>,
        rounds: u32,
        tool_calls_made: usize,
    },

    /// A run-level failure; the turn cannot proceed.
    Error { message: String },
}

impl AgentStreamEvent {
    /// Short name for logging and display.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::TextDelta { .. } => "text_delta",
            Self::Truncated { .. } => "truncated",
            Self::ToolCallStarted { .. } => "tool_call_started",
            Self::ToolCallCompleted { .. } => "tool_call_completed",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }
}
