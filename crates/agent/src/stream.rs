//! Streaming execution mode.
//!
//! [`AgentRunner::process_streaming`] returns immediately with an event
//! receiver; a spawned task drives the turn and pushes events as the
//! model stream arrives. Multi-round tool use is handled by an iterative
//! loop over the growing message list — never by recursive re-entry — so
//! the call stack stays flat across any number of rounds, and the same
//! round cap as the blocking mode applies.

use crate::runner::AgentRunner;
use crate::stream_event::AgentStreamEvent;
use docsmith_core::error::Error;
use docsmith_core::message::{Conversation, Message, MessageToolCall};
use docsmith_core::provider::{Provider, ProviderRequest, ToolCallDelta};
use std::collections::BTreeMap;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Accumulated text stops growing past this many bytes; deltas are still
/// forwarded to the consumer for display.
pub const STREAM_TEXT_CAP: usize = 50 * 1024;

/// One in-progress tool call, assembled from stream fragments.
#[derive(Debug, Default)]
struct ToolCallAccumulator {
    id: String,
    name: String,
    arguments: String,
}

impl ToolCallAccumulator {
    fn into_tool_call(self) -> MessageToolCall {
        MessageToolCall {
            id: self.id,
            name: self.name,
            arguments: self.arguments,
        }
    }
}

/// Transient per-response state: accumulated text (capped), and the
/// tool-call accumulators keyed by stream index.
struct StreamState {
    text: String,
    capped: bool,
    calls: BTreeMap<u32, ToolCallAccumulator>,
}

impl StreamState {
    fn new() -> Self {
        Self {
            text: String::new(),
            capped: false,
            calls: BTreeMap::new(),
        }
    }

    /// Fold a text delta into the accumulated text, respecting the cap.
    /// Returns true if this delta tripped the cap (emit the notice once).
    fn accumulate_text(&mut self, content: &str) -> bool {
        if self.capped {
            return false;
        }
        let remaining = STREAM_TEXT_CAP - self.text.len();
        if content.len() < remaining {
            self.text.push_str(content);
            return false;
        }
        // Take what fits, on a char boundary.
        let mut end = remaining.min(content.len());
        while end > 0 && !content.is_char_boundary(end) {
            end -= 1;
        }
        self.text.push_str(&content[..end]);
        self.capped = true;
        true
    }

    /// Fold a tool-call fragment into its accumulator. Returns
    /// `Some((id, name))` when this index was seen for the first time.
    fn accumulate_delta(&mut self, delta: &ToolCallDelta) -> Option<(String, String)> {
        let first_sighting = !self.calls.contains_key(&delta.index);
        let acc = self.calls.entry(delta.index).or_default();
        if let Some(id) = &delta.id {
            acc.id = id.clone();
        }
        if let Some(name) = &delta.name {
            acc.name = name.clone();
        }
        if let Some(arguments) = &delta.arguments {
            // Fragments concatenate in arrival order.
            acc.arguments.push_str(arguments);
        }
        first_sighting.then(|| (acc.id.clone(), acc.name.clone()))
    }

    /// Drain the accumulators into complete calls, ordered by index.
    fn into_tool_calls(self) -> (String, Vec<MessageToolCall>) {
        let calls = self
            .calls
            .into_values()
            .map(ToolCallAccumulator::into_tool_call)
            .collect();
        (self.text, calls)
    }
}

impl AgentRunner {
    /// Process a user turn as a stream of events.
    ///
    /// Returns immediately; consuming the receiver drives the turn. The
    /// sequence ends with exactly one `Done` (carrying the messages to
    /// append to the conversation) or one `Error`.
    pub fn process_streaming(
        &self,
        conversation: &Conversation,
    ) -> mpsc::Receiver<AgentStreamEvent> {
        let (tx, rx) = mpsc::channel(64);

        let messages = self.assemble(conversation);
        let provider = self.provider.clone();
        let provider_name = self.provider.name().to_string();
        let tools = self.tools.clone();
        let model = self.model.clone();
        let temperature = self.temperature;
        let max_tokens = self.max_tokens;
        let max_rounds = self.max_rounds;

        tokio::spawn(async move {
            let runner = StreamTurn {
                provider,
                provider_name,
                tools,
                model,
                temperature,
                max_tokens,
                max_rounds,
                tx,
            };
            runner.run(messages).await;
        });

        rx
    }
}

struct StreamTurn {
    provider: std::sync::Arc<dyn docsmith_core::Provider>,
    provider_name: String,
    tools: std::sync::Arc<docsmith_core::ToolRegistry>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    max_rounds: u32,
    tx: mpsc::Sender<AgentStreamEvent>,
}

impl StreamTurn {
    async fn emit(&self, event: AgentStreamEvent) -> bool {
        self.tx.send(event).await.is_ok()
    }

    async fn fail(&self, error: Error) {
        let _ = self
            .tx
            .send(AgentStreamEvent::Error {
                message: error.to_string(),
            })
            .await;
    }

    /// The iterative worklist loop: each round issues one streaming
    /// request over the current message list; tool rounds extend the list
    /// and continue, a tool-free round terminates the turn.
    async fn run(self, mut messages: Vec<Message>) {
        let tool_definitions = self.tools.definitions();
        let mut appended: Vec<Message> = Vec::new();
        let mut rounds = 0u32;
        let mut tool_calls_made = 0usize;

        loop {
            rounds += 1;
            if rounds > self.max_rounds {
                warn!(rounds, "Tool round cap exceeded in streaming mode");
                self.fail(Error::TooManyToolRounds {
                    rounds: self.max_rounds,
                })
                .await;
                return;
            }

            let request = ProviderRequest {
                model: self.model.clone(),
                messages: messages.clone(),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                tools: tool_definitions.clone(),
                stream: true,
            };

            let mut chunks = match self.provider.stream(request).await {
                Ok(rx) => rx,
                Err(e) => {
                    self.fail(Error::provider(&self.provider_name, e)).await;
                    return;
                }
            };

            let mut state = StreamState::new();

            while let Some(item) = chunks.recv().await {
                let chunk = match item {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        self.fail(Error::provider(&self.provider_name, e)).await;
                        return;
                    }
                };

                if let Some(content) = &chunk.content
                    && !content.is_empty()
                {
                    // Forward first, unconditionally; accumulation is
                    // what the cap limits.
                    if !self
                        .emit(AgentStreamEvent::TextDelta {
                            content: content.clone(),
                        })
                        .await
                    {
                        return; // consumer dropped the receiver
                    }
                    if state.accumulate_text(content)
                        && !self
                            .emit(AgentStreamEvent::Truncated {
                                limit: STREAM_TEXT_CAP,
                            })
                            .await
                    {
                        return;
                    }
                }

                for delta in &chunk.tool_call_deltas {
                    if let Some((id, name)) = state.accumulate_delta(delta)
                        && !self.emit(AgentStreamEvent::ToolCallStarted { id, name }).await
                    {
                        return;
                    }
                }

                if chunk.done {
                    break;
                }
            }

            let (text, tool_calls) = state.into_tool_calls();

            // A round with no tool calls is the final response.
            if tool_calls.is_empty() {
                let final_message = Message::assistant(text);
                appended.push(final_message);
                let _ = self
                    .tx
                    .send(AgentStreamEvent::Done {
                        messages: appended,
                        rounds,
                        tool_calls_made,
                    })
                    .await;
                return;
            }

            debug!(count = tool_calls.len(), round = rounds, "Streaming tool round");

            let assistant = Message::assistant_tool_calls(text, tool_calls.clone());
            messages.push(assistant.clone());
            appended.push(assistant);

            // Execute sequentially, in index order; correlate by call id.
            for tc in &tool_calls {
                tool_calls_made += 1;
                let result = self.execute_tool(tc).await;
                if !self
                    .emit(AgentStreamEvent::ToolCallCompleted {
                        id: tc.id.clone(),
                        name: tc.name.clone(),
                        success: result.success,
                        output: result.output.clone(),
                    })
                    .await
                {
                    return;
                }
                let message = Message::tool_result(&tc.id, &result.output);
                messages.push(message.clone());
                appended.push(message);
            }
            // Loop back: issue the next streaming request with the
            // extended message list.
        }
    }

    async fn execute_tool(&self, tc: &MessageToolCall) -> docsmith_core::ToolResult {
        let call = docsmith_core::ToolCall {
            id: tc.id.clone(),
            name: tc.name.clone(),
            arguments: tc.arguments.clone(),
        };
        match self.tools.execute(&call).await {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = %tc.name, error = %e, "Tool execution failed");
                docsmith_core::ToolResult::failure(&tc.id, e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docsmith_core::error::{ProviderError, ToolError};
    use docsmith_core::provider::{Provider, ProviderResponse, StreamChunk};
    use docsmith_core::tool::{Tool, ToolRegistry, ToolResult};
    use docsmith_core::Role;
    use std::sync::{Arc, Mutex};

    /// A provider that replays scripted streams, one per round.
    struct StreamScriptProvider {
        rounds: Mutex<Vec<Vec<StreamChunk>>>,
    }

    impl StreamScriptProvider {
        fn new(rounds: Vec<Vec<StreamChunk>>) -> Self {
            Self {
                rounds: Mutex::new(rounds),
            }
        }

        fn text_chunk(content: &str) -> StreamChunk {
            StreamChunk {
                content: Some(content.into()),
                tool_call_deltas: vec![],
                done: false,
                finish_reason: None,
                usage: None,
            }
        }

        fn delta_chunk(deltas: Vec<ToolCallDelta>) -> StreamChunk {
            StreamChunk {
                content: None,
                tool_call_deltas: deltas,
                done: false,
                finish_reason: None,
                usage: None,
            }
        }

        fn done_chunk(finish_reason: &str) -> StreamChunk {
            StreamChunk {
                content: None,
                tool_call_deltas: vec![],
                done: true,
                finish_reason: Some(finish_reason.into()),
                usage: None,
            }
        }
    }

    #[async_trait]
    impl Provider for StreamScriptProvider {
        fn name(&self) -> &str {
            "stream-script"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> std::result::Result<ProviderResponse, ProviderError> {
            Err(ProviderError::NotConfigured("streaming only".into()))
        }

        async fn stream(
            &self,
            _request: ProviderRequest,
        ) -> std::result::Result<
            mpsc::Receiver<std::result::Result<StreamChunk, ProviderError>>,
            ProviderError,
        > {
            let mut rounds = self.rounds.lock().unwrap();
            if rounds.is_empty() {
                return Err(ProviderError::Network("script exhausted".into()));
            }
            let chunks = rounds.remove(0);
            let (tx, rx) = mpsc::channel(16);
            tokio::spawn(async move {
                for chunk in chunks {
                    if tx.send(Ok(chunk)).await.is_err() {
                        return;
                    }
                }
            });
            Ok(rx)
        }
    }

    struct NoopTool;

    #[async_trait]
    impl Tool for NoopTool {
        fn name(&self) -> &str {
            "list_directory"
        }
        fn description(&self) -> &str {
            "test"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object", "properties": {}, "additionalProperties": false})
        }
        async fn execute(&self, _arguments: &str) -> std::result::Result<ToolResult, ToolError> {
            Ok(ToolResult {
                call_id: String::new(),
                success: true,
                output: r#"{"success":true,"contents":[]}"#.into(),
            })
        }
    }

    fn registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(NoopTool));
        Arc::new(registry)
    }

    async fn collect(mut rx: mpsc::Receiver<AgentStreamEvent>) -> Vec<AgentStreamEvent> {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn tool_round_then_text_round() {
        // Round 1: a tool call split across two fragments, then the
        // terminal signal. Round 2: plain text.
        let provider = Arc::new(StreamScriptProvider::new(vec![
            vec![
                StreamScriptProvider::delta_chunk(vec![ToolCallDelta {
                    index: 0,
                    id: Some("call_1".into()),
                    name: Some("list_directory".into()),
                    arguments: Some(r#"{"directory_path""#.into()),
                }]),
                StreamScriptProvider::delta_chunk(vec![ToolCallDelta {
                    index: 0,
                    id: None,
                    name: None,
                    arguments: Some(r#":"."}"#.into()),
                }]),
                StreamScriptProvider::done_chunk("tool_calls"),
            ],
            vec![
                StreamScriptProvider::text_chunk("The directory "),
                StreamScriptProvider::text_chunk("is empty."),
                StreamScriptProvider::done_chunk("stop"),
            ],
        ]));

        let agent = AgentRunner::new(provider, "stream-script", 0.7, registry());
        let mut conv = Conversation::new();
        conv.push(Message::user("look"));

        let events = collect(agent.process_streaming(&conv)).await;
        let types: Vec<&str> = events.iter().map(|e| e.event_type()).collect();
        assert_eq!(
            types,
            vec![
                "tool_call_started",
                "tool_call_completed",
                "text_delta",
                "text_delta",
                "done",
            ]
        );

        // Ids correlate, no duplicates.
        match (&events[0], &events[1]) {
            (
                AgentStreamEvent::ToolCallStarted { id: started, name },
                AgentStreamEvent::ToolCallCompleted { id: completed, success, .. },
            ) => {
                assert_eq!(started, "call_1");
                assert_eq!(completed, "call_1");
                assert_eq!(name, "list_directory");
                assert!(success);
            }
            other => panic!("unexpected events: {other:?}"),
        }

        // The fragments were concatenated in arrival order, and the Done
        // event carries the appended messages in order.
        match events.last().unwrap() {
            AgentStreamEvent::Done {
                messages,
                rounds,
                tool_calls_made,
            } => {
                assert_eq!(*rounds, 2);
                assert_eq!(*tool_calls_made, 1);
                assert_eq!(messages.len(), 3);
                assert_eq!(messages[0].role, Role::Assistant);
                assert_eq!(
                    messages[0].tool_calls[0].arguments,
                    r#"{"directory_path":"."}"#
                );
                assert_eq!(messages[1].role, Role::Tool);
                assert_eq!(messages[1].tool_call_id.as_deref(), Some("call_1"));
                assert_eq!(messages[2].content, "The directory is empty.");
            }
            other => panic!("expected Done, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn text_cap_stops_accumulation_but_not_forwarding() {
        // Three deltas of 20 KiB each: the third crosses the 50 KiB cap.
        let big = "a".repeat(20 * 1024);
        let provider = Arc::new(StreamScriptProvider::new(vec![vec![
            StreamScriptProvider::text_chunk(&big),
            StreamScriptProvider::text_chunk(&big),
            StreamScriptProvider::text_chunk(&big),
            StreamScriptProvider::done_chunk("stop"),
        ]]));

        let agent = AgentRunner::new(provider, "stream-script", 0.7, registry());
        let mut conv = Conversation::new();
        conv.push(Message::user("long answer"));

        let events = collect(agent.process_streaming(&conv)).await;

        // All three deltas were forwarded with their content unchanged.
        let deltas: Vec<&String> = events
            .iter()
            .filter_map(|e| match e {
                AgentStreamEvent::TextDelta { content } => Some(content),
                _ => None,
            })
            .collect();
        assert_eq!(deltas.len(), 3);
        assert!(deltas.iter().all(|d| d.len() == 20 * 1024));

        // The truncation notice fired exactly once.
        let truncations = events
            .iter()
            .filter(|e| matches!(e, AgentStreamEvent::Truncated { .. }))
            .count();
        assert_eq!(truncations, 1);

        // Accumulated text stopped at the cap.
        match events.last().unwrap() {
            AgentStreamEvent::Done { messages, .. } => {
                assert_eq!(messages[0].content.len(), STREAM_TEXT_CAP);
            }
            other => panic!("expected Done, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn round_cap_emits_error_event() {
        // Every round requests the same tool again.
        let round = || {
            vec![
                StreamScriptProvider::delta_chunk(vec![ToolCallDelta {
                    index: 0,
                    id: Some("call_x".into()),
                    name: Some("list_directory".into()),
                    arguments: Some("{}".into()),
                }]),
                StreamScriptProvider::done_chunk("tool_calls"),
            ]
        };
        let provider = Arc::new(StreamScriptProvider::new(vec![
            round(),
            round(),
            round(),
            round(),
        ]));

        let agent = AgentRunner::new(provider, "stream-script", 0.7, registry())
            .with_max_rounds(2);
        let mut conv = Conversation::new();
        conv.push(Message::user("loop"));

        let events = collect(agent.process_streaming(&conv)).await;
        match events.last().unwrap() {
            AgentStreamEvent::Error { message } => {
                assert!(message.contains("Too many tool rounds"));
            }
            other => panic!("expected Error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn provider_stream_failure_surfaces_as_error_event() {
        let provider = Arc::new(StreamScriptProvider::new(vec![]));
        let agent = AgentRunner::new(provider, "stream-script", 0.7, registry());
        let mut conv = Conversation::new();
        conv.push(Message::user("hi"));

        let events = collect(agent.process_streaming(&conv)).await;
        assert_eq!(events.len(), 1);
        match &events[0] {
            AgentStreamEvent::Error { message } => {
                assert!(message.contains("stream-script"));
            }
            other => panic!("expected Error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn two_interleaved_tool_calls_accumulate_by_index() {
        let provider = Arc::new(StreamScriptProvider::new(vec![
            vec![
                // Fragments for two calls interleave across chunks.
                StreamScriptProvider::delta_chunk(vec![
                    ToolCallDelta {
                        index: 0,
                        id: Some("call_a".into()),
                        name: Some("list_directory".into()),
                        arguments: Some("{".into()),
                    },
                    ToolCallDelta {
                        index: 1,
                        id: Some("call_b".into()),
                        name: Some("list_directory".into()),
                        arguments: Some("{".into()),
                    },
                ]),
                StreamScriptProvider::delta_chunk(vec![
                    ToolCallDelta {
                        index: 1,
                        id: None,
                        name: None,
                        arguments: Some("}".into()),
                    },
                    ToolCallDelta {
                        index: 0,
                        id: None,
                        name: None,
                        arguments: Some("}".into()),
                    },
                ]),
                StreamScriptProvider::done_chunk("tool_calls"),
            ],
            vec![
                StreamScriptProvider::text_chunk("done"),
                StreamScriptProvider::done_chunk("stop"),
            ],
        ]));

        let agent = AgentRunner::new(provider, "stream-script", 0.7, registry());
        let mut conv = Conversation::new();
        conv.push(Message::user("both"));

        let events = collect(agent.process_streaming(&conv)).await;

        let started: Vec<&String> = events
            .iter()
            .filter_map(|e| match e {
                AgentStreamEvent::ToolCallStarted { id, .. } => Some(id),
                _ => None,
            })
            .collect();
        assert_eq!(started, vec!["call_a", "call_b"]);

        match events.last().unwrap() {
            AgentStreamEvent::Done { messages, .. } => {
                let calls = &messages[0].tool_calls;
                assert_eq!(calls.len(), 2);
                assert_eq!(calls[0].id, "call_a");
                assert_eq!(calls[0].arguments, "{}");
                assert_eq!(calls[1].id, "call_b");
                assert_eq!(calls[1].arguments, "{}");
            }
            other => panic!("expected Done, got {other:?}"),
        }
    }
}
