//! End-to-end turn: a scripted model response drives the real tool
//! registry against a real temporary project tree.

use async_trait::async_trait;
use docsmith_agent::AgentRunner;
use docsmith_core::error::ProviderError;
use docsmith_core::message::{Conversation, Message, MessageToolCall};
use docsmith_core::provider::{Provider, ProviderRequest, ProviderResponse};
use docsmith_core::Role;
use docsmith_fs::{FileCache, FileStore, FixedProbe};
use std::sync::{Arc, Mutex};

const GIB: u64 = 1024 * 1024 * 1024;

struct ScriptedProvider {
    responses: Mutex<Vec<ProviderResponse>>,
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        _request: ProviderRequest,
    ) -> Result<ProviderResponse, ProviderError> {
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(ProviderError::Network("script exhausted".into()));
        }
        Ok(responses.remove(0))
    }
}

fn assistant_with_calls(calls: Vec<MessageToolCall>) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant_tool_calls("", calls),
        usage: None,
        model: "scripted".into(),
    }
}

fn assistant_text(content: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(content),
        usage: None,
        model: "scripted".into(),
    }
}

#[tokio::test]
async fn list_then_read_against_real_tools() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("README.md"), "# Fixture project").unwrap();
    let readme = dir.path().join("README.md");

    let probe = Arc::new(FixedProbe::new(32 * GIB, 28 * GIB));
    let store = Arc::new(FileStore::new(Arc::new(FileCache::new(probe))));
    let tools = Arc::new(docsmith_tools::default_registry(store));

    let calls = vec![
        MessageToolCall {
            id: "call_list".into(),
            name: "list_directory".into(),
            arguments: serde_json::json!({
                "directory_path": dir.path().to_str().unwrap(),
                "include_hidden": false,
            })
            .to_string(),
        },
        MessageToolCall {
            id: "call_read".into(),
            name: "read_file".into(),
            arguments: serde_json::json!({
                "file_path": readme.to_str().unwrap(),
            })
            .to_string(),
        },
    ];

    let provider = Arc::new(ScriptedProvider {
        responses: Mutex::new(vec![
            assistant_with_calls(calls),
            assistant_text("The project has a README."),
        ]),
    });

    let agent = AgentRunner::new(provider, "scripted", 0.7, tools);
    let mut conversation = Conversation::new();
    conversation.push(Message::user("What is in this project?"));

    let response = agent.process(&mut conversation).await.unwrap();
    assert_eq!(response, "The project has a README.");

    // user, assistant(tool_calls), tool, tool, assistant(final)
    assert_eq!(conversation.messages.len(), 5);

    // Results correlate to their calls by id, in issue order.
    let list_result = &conversation.messages[2];
    assert_eq!(list_result.role, Role::Tool);
    assert_eq!(list_result.tool_call_id.as_deref(), Some("call_list"));
    let list_output: serde_json::Value = serde_json::from_str(&list_result.content).unwrap();
    assert_eq!(list_output["success"], serde_json::json!(true));
    assert_eq!(list_output["total_items"], serde_json::json!(1));
    assert_eq!(
        list_output["contents"][0]["name"],
        serde_json::json!("README.md")
    );

    let read_result = &conversation.messages[3];
    assert_eq!(read_result.tool_call_id.as_deref(), Some("call_read"));
    let read_output: serde_json::Value = serde_json::from_str(&read_result.content).unwrap();
    assert_eq!(read_output["success"], serde_json::json!(true));
    assert_eq!(
        read_output["content"],
        serde_json::json!("# Fixture project")
    );
}

#[tokio::test]
async fn invalid_tool_arguments_keep_the_turn_alive() {
    let dir = tempfile::tempdir().unwrap();

    let probe = Arc::new(FixedProbe::new(32 * GIB, 28 * GIB));
    let store = Arc::new(FileStore::new(Arc::new(FileCache::new(probe))));
    let tools = Arc::new(docsmith_tools::default_registry(store));

    // Unknown property "recursive" must be rejected by the tool, not crash
    // the turn.
    let calls = vec![MessageToolCall {
        id: "call_bad".into(),
        name: "list_directory".into(),
        arguments: serde_json::json!({
            "directory_path": dir.path().to_str().unwrap(),
            "include_hidden": false,
            "recursive": true,
        })
        .to_string(),
    }];

    let provider = Arc::new(ScriptedProvider {
        responses: Mutex::new(vec![
            assistant_with_calls(calls),
            assistant_text("Understood, retrying without that option."),
        ]),
    });

    let agent = AgentRunner::new(provider, "scripted", 0.7, tools);
    let mut conversation = Conversation::new();
    conversation.push(Message::user("List recursively."));

    let response = agent.process(&mut conversation).await.unwrap();
    assert_eq!(response, "Understood, retrying without that option.");

    let tool_result = &conversation.messages[2];
    let output: serde_json::Value = serde_json::from_str(&tool_result.content).unwrap();
    assert_eq!(output["success"], serde_json::json!(false));
    assert!(output["error"].as_str().unwrap().contains("Invalid arguments"));
}
