//! The docsmith agent runtime.
//!
//! Owns the conversation with the language model:
//!
//! 1. **Assemble** system instructions + bounded history + the user turn
//! 2. **Declare** the registered tools to the model
//! 3. **Dispatch** — blocking ([`AgentRunner::process`]) or streaming
//!    ([`AgentRunner::process_streaming`])
//! 4. **Execute** model-requested tool calls through the registry, feed the
//!    results back, and loop until a tool-free response arrives
//!
//! Tool rounds are capped; exceeding the cap is a runtime failure rather
//! than an unbounded loop.

pub mod prompt;
pub mod runner;
pub mod stream;
pub mod stream_event;

pub use prompt::SYSTEM_PROMPT;
pub use runner::AgentRunner;
pub use stream::STREAM_TEXT_CAP;
pub use stream_event::AgentStreamEvent;
