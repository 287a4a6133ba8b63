//! `docsmith chat` — interactive or single-message documentation mode.

use docsmith_agent::{AgentRunner, AgentStreamEvent};
use docsmith_config::AppConfig;
use docsmith_core::message::{Conversation, Message};
use docsmith_fs::{FileCache, FileStore, SysinfoProbe};
use docsmith_providers::OpenAiCompatProvider;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{self, AsyncBufReadExt, BufReader};

/// A line typed at the prompt, after command parsing.
#[derive(Debug, PartialEq, Eq)]
enum ReplInput {
    Exit,
    Help,
    Clear,
    Init,
    Message(String),
}

fn parse_repl_input(line: &str) -> Option<ReplInput> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    Some(match line {
        "exit" | "quit" | "/exit" | "/quit" | ":q" => ReplInput::Exit,
        "help" | "/help" | "?" => ReplInput::Help,
        "clear" | "/clear" => ReplInput::Clear,
        "init" | "/init" => ReplInput::Init,
        other => ReplInput::Message(other.to_string()),
    })
}

fn print_help() {
    println!();
    println!("  Commands:");
    println!("    help   — show this help");
    println!("    clear  — forget the conversation history");
    println!("    init   — write a starter config file");
    println!("    exit   — quit");
    println!();
    println!("  Anything else is sent to the assistant.");
    println!();
}

fn build_agent(config: &AppConfig) -> (AgentRunner, Arc<FileCache>) {
    let probe = Arc::new(SysinfoProbe::new());
    let cache = Arc::new(FileCache::new(probe));
    let store = Arc::new(FileStore::new(cache.clone()));
    let tools = Arc::new(docsmith_tools::default_registry(store));

    let provider = Arc::new(OpenAiCompatProvider::with_timeout(
        &config.provider,
        config.resolved_base_url(),
        config.api_key.clone().unwrap_or_default(),
        Duration::from_secs(config.request_timeout_secs),
    ));

    let agent = AgentRunner::new(provider, &config.model, config.temperature, tools)
        .with_max_tokens(config.max_tokens)
        .with_max_rounds(config.max_rounds)
        .with_history_limit(config.history_limit);
    (agent, cache)
}

/// Run one streamed turn, rendering events as they arrive.
/// Returns false when the turn failed (the conversation is unchanged).
async fn run_streamed_turn(agent: &AgentRunner, conversation: &mut Conversation) -> bool {
    let mut events = agent.process_streaming(conversation);
    let mut printed_any = false;

    while let Some(event) = events.recv().await {
        match event {
            AgentStreamEvent::TextDelta { content } => {
                print!("{content}");
                let _ = std::io::stdout().flush();
                printed_any = true;
            }
            AgentStreamEvent::Truncated { limit } => {
                eprintln!();
                eprintln!("  [note: response exceeds {limit} bytes; history keeps a truncated copy]");
            }
            AgentStreamEvent::ToolCallStarted { name, .. } => {
                eprintln!("  [tool: {name} ...]");
            }
            AgentStreamEvent::ToolCallCompleted { name, success, .. } => {
                let status = if success { "ok" } else { "failed" };
                eprintln!("  [tool: {name} {status}]");
            }
            AgentStreamEvent::Done { messages, .. } => {
                for message in messages {
                    conversation.push(message);
                }
                if printed_any {
                    println!();
                }
                return true;
            }
            AgentStreamEvent::Error { message } => {
                eprintln!();
                eprintln!("  [Error] {message}");
                eprintln!("  The turn was aborted — please try again.");
                return false;
            }
        }
    }
    // Stream closed without a terminal event; treat as a failed turn.
    eprintln!("  [Error] response stream ended unexpectedly — please try again.");
    false
}

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    // Check for an API key early — give a clear error
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    DOCSMITH_API_KEY    (generic)");
        eprintln!("    OPENROUTER_API_KEY  (recommended)");
        eprintln!("    OPENAI_API_KEY      (for OpenAI direct)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        eprintln!("  Run `docsmith init` to create a starter config.");
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let (agent, cache) = build_agent(&config);
    // Periodic cache maintenance lives for the whole session; the handle
    // aborts the task on drop.
    let _maintenance = cache.spawn_maintenance();

    if let Some(msg) = message {
        // Single message mode
        let mut conversation = Conversation::new();
        conversation.push(Message::user(&msg));

        if config.stream {
            if !run_streamed_turn(&agent, &mut conversation).await {
                return Err("turn failed".into());
            }
        } else {
            let response = agent.process(&mut conversation).await?;
            println!("{response}");
        }
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  docsmith — documentation assistant");
    println!();
    println!("  Provider:  {}", config.provider);
    println!("  Model:     {}", config.model);
    println!("  Project:   {}", std::env::current_dir()?.display());
    println!();
    println!("  Type your request and press Enter. 'help' lists commands.");
    println!();

    let stdin = io::stdin();
    let reader = BufReader::new(stdin);
    let mut lines = reader.lines();
    let mut conversation = Conversation::new();

    print!("  You > ");
    std::io::stdout().flush()?;

    while let Ok(Some(line)) = lines.next_line().await {
        match parse_repl_input(&line) {
            None => {}
            Some(ReplInput::Exit) => break,
            Some(ReplInput::Help) => print_help(),
            Some(ReplInput::Clear) => {
                conversation.clear();
                println!("  (history cleared)");
            }
            Some(ReplInput::Init) => {
                if let Err(e) = super::init::run().await {
                    eprintln!("  [Error] {e}");
                }
            }
            Some(ReplInput::Message(text)) => {
                conversation.push(Message::user(&text));
                println!();

                if config.stream {
                    if !run_streamed_turn(&agent, &mut conversation).await {
                        // Drop the failed user turn so a retry starts clean.
                        conversation.messages.pop();
                    }
                } else {
                    match agent.process(&mut conversation).await {
                        Ok(response) => {
                            for line in response.lines() {
                                println!("  {line}");
                            }
                        }
                        Err(e) => {
                            eprintln!("  [Error] {e}");
                            eprintln!("  The turn was aborted — please try again.");
                            conversation.messages.pop();
                        }
                    }
                }
                println!();
            }
        }

        print!("  You > ");
        std::io::stdout().flush()?;
    }

    println!();
    println!("  Goodbye!");
    println!();
    Ok(())
}
