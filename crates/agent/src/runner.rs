//! The agent loop — blocking execution mode.
//!
//! One call to [`AgentRunner::process`] is one turn: it repeatedly sends
//! the message list to the model, executes any requested tools, and
//! returns the first tool-free response's text. Tool failures become
//! structured tool results the model can react to; provider failures
//! propagate, tagged with the backend name.

use docsmith_core::error::{Error, ProviderError, Result};
use docsmith_core::message::{Conversation, Message, MessageToolCall};
use docsmith_core::provider::{Provider, ProviderRequest};
use docsmith_core::tool::{ToolCall, ToolRegistry, ToolResult};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default cap on tool rounds within a single turn.
pub(crate) const DEFAULT_MAX_ROUNDS: u32 = 25;

/// Default trailing-history window, in messages.
pub(crate) const DEFAULT_HISTORY_LIMIT: usize = 40;

/// The core agent runner, shared by the blocking and streaming modes.
pub struct AgentRunner {
    /// The LLM provider to use
    pub(crate) provider: Arc<dyn Provider>,

    /// The model to use
    pub(crate) model: String,

    /// Temperature setting
    pub(crate) temperature: f32,

    /// Default max tokens per response
    pub(crate) max_tokens: Option<u32>,

    /// Tool registry
    pub(crate) tools: Arc<ToolRegistry>,

    /// System instructions, sent first every turn
    pub(crate) system_prompt: String,

    /// Maximum tool rounds per turn
    pub(crate) max_rounds: u32,

    /// Trailing-history window applied at assembly
    pub(crate) history_limit: usize,
}

impl AgentRunner {
    /// Create a new agent runner.
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        temperature: f32,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
            max_tokens: None,
            tools,
            system_prompt: crate::prompt::SYSTEM_PROMPT.to_string(),
            max_rounds: DEFAULT_MAX_ROUNDS,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// Set the default max tokens per model response.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Set the maximum number of tool rounds per turn.
    pub fn with_max_rounds(mut self, max: u32) -> Self {
        self.max_rounds = max;
        self
    }

    /// Set the trailing-history window (in messages).
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Replace the default system instructions.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Assemble the message list for a turn: system instructions first,
    /// then the trailing window of the conversation (which already ends
    /// with the new user message). The stored conversation is not mutated.
    pub(crate) fn assemble(&self, conversation: &Conversation) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.history_limit + 1);
        messages.push(Message::system(&self.system_prompt));
        messages.extend_from_slice(conversation.trailing(self.history_limit));
        messages
    }

    pub(crate) fn provider_error(&self, source: ProviderError) -> Error {
        Error::provider(self.provider.name(), source)
    }

    /// Execute one tool call. Never fails: unknown tools and execution
    /// errors become structured failure results so the conversation can
    /// continue.
    pub(crate) async fn execute_tool(&self, tc: &MessageToolCall) -> ToolResult {
        let call = ToolCall {
            id: tc.id.clone(),
            name: tc.name.clone(),
            arguments: tc.arguments.clone(),
        };
        match self.tools.execute(&call).await {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = %tc.name, error = %e, "Tool execution failed");
                ToolResult::failure(&tc.id, e)
            }
        }
    }

    /// Process a user turn and return the final text response.
    ///
    /// Messages produced during the turn (assistant tool-call messages,
    /// tool results, the final assistant message) are appended to the
    /// conversation in order.
    pub async fn process(&self, conversation: &mut Conversation) -> Result<String> {
        info!(
            conversation_id = %conversation.id,
            messages = conversation.messages.len(),
            "Processing turn"
        );

        let mut messages = self.assemble(conversation);
        let tool_definitions = self.tools.definitions();
        let mut rounds = 0u32;

        loop {
            rounds += 1;
            if rounds > self.max_rounds {
                warn!(
                    conversation_id = %conversation.id,
                    rounds,
                    "Tool round cap exceeded"
                );
                return Err(Error::TooManyToolRounds {
                    rounds: self.max_rounds,
                });
            }

            debug!(conversation_id = %conversation.id, round = rounds, "Agent round");

            let request = ProviderRequest {
                model: self.model.clone(),
                messages: messages.clone(),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                tools: tool_definitions.clone(),
                stream: false,
            };

            let response = self
                .provider
                .complete(request)
                .await
                .map_err(|e| self.provider_error(e))?;

            // A tool-free response is the final answer.
            if response.message.tool_calls.is_empty() {
                let response_text = response.message.content.clone();
                conversation.push(response.message);
                return Ok(response_text);
            }

            debug!(
                tool_count = response.message.tool_calls.len(),
                "Executing tool calls"
            );

            let tool_calls = response.message.tool_calls.clone();
            messages.push(response.message.clone());
            conversation.push(response.message);

            // Sequential execution, in the order the calls were issued;
            // results correlate by call id.
            for tc in &tool_calls {
                let result = self.execute_tool(tc).await;
                let message = Message::tool_result(&tc.id, &result.output);
                messages.push(message.clone());
                conversation.push(message);
            }
        }
    }
}
