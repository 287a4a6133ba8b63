//! Tool trait — the abstraction over agent capabilities.
//!
//! Tools are what let the agent inspect and modify the local project:
//! read/write files, list directories, search file names and contents.
//!
//! The invocation contract: a tool receives a single opaque JSON-string
//! argument and returns a JSON-string result that always carries at least a
//! `success: boolean` field. Shape-invalid arguments produce a structured
//! `success: false` result rather than an escaping error; errors that do
//! escape `execute` are treated as tool-internal bugs by the agent runtime
//! and converted into a synthetic failed tool result.

use crate::error::ToolError;
use crate::provider::ToolDefinition;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A request to execute a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call ID (matches the model's tool_call.id)
    pub id: String,

    /// Name of the tool to execute
    pub name: String,

    /// Arguments as an opaque JSON string
    pub arguments: String,
}

/// The result of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// The call ID this result is for
    pub call_id: String,

    /// Whether the tool executed successfully
    pub success: bool,

    /// The output — always a JSON document with a `success` field
    pub output: String,
}

impl ToolResult {
    /// A synthetic failed result, used when a tool errors internally or
    /// the requested tool does not exist. Keeps the conversation alive.
    pub fn failure(call_id: impl Into<String>, error: impl std::fmt::Display) -> Self {
        let output = serde_json::json!({
            "success": false,
            "error": error.to_string(),
        });
        Self {
            call_id: call_id.into(),
            success: false,
            output: output.to_string(),
        }
    }
}

/// The core Tool trait.
///
/// Each tool (read_file, write_file, list_directory, ...) implements this
/// trait. Tools are registered in the ToolRegistry and made available to
/// the agent loop. None of them require interactive approval.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique, stable name of this tool (e.g., "read_file").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters. Every schema sets
    /// `additionalProperties: false` — unknown properties are rejected.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given JSON-string arguments.
    async fn execute(&self, arguments: &str) -> std::result::Result<ToolResult, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the model.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// A registry of available tools.
///
/// Assembled once at startup and read-only afterwards. The agent loop uses
/// this to:
/// 1. Get tool definitions to send to the model
/// 2. Look up and execute tools when the model requests them
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// Get all tool definitions (for sending to the model).
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.to_definition()).collect()
    }

    /// Execute a tool call. The result is correlated back to the call id.
    pub async fn execute(&self, call: &ToolCall) -> std::result::Result<ToolResult, ToolError> {
        let tool = self
            .tools
            .get(&call.name)
            .ok_or_else(|| ToolError::NotFound(call.name.clone()))?;
        let mut result = tool.execute(&call.arguments).await?;
        result.call_id = call.id.clone();
        Ok(result)
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
