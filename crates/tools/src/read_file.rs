//! read_file — read a file's contents through the adaptive cache.

use crate::{parse_arguments, success_result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docsmith_core::error::ToolError;
use docsmith_core::tool::{Tool, ToolResult};
use docsmith_fs::FileStore;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ReadFileArgs {
    file_path: String,
}

#[derive(Debug, Serialize)]
struct ReadFileOutput {
    success: bool,
    file_path: PathBuf,
    size: u64,
    content: String,
    last_modified: DateTime<Utc>,
}

pub struct ReadFileTool {
    store: Arc<FileStore>,
}

impl ReadFileTool {
    pub fn new(store: Arc<FileStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the contents of a text file. Large files are streamed; recently read files are served from cache."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path of the file to read"
                }
            },
            "required": ["file_path"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, arguments: &str) -> Result<ToolResult, ToolError> {
        let args: ReadFileArgs = match parse_arguments(arguments) {
            Ok(args) => args,
            Err(failure) => return Ok(*failure),
        };

        match self.store.read(std::path::Path::new(&args.file_path)).await {
            Ok(content) => Ok(success_result(&ReadFileOutput {
                success: true,
                file_path: content.path,
                size: content.size,
                content: content.content,
                last_modified: content.modified,
            })),
            Err(e) => Ok(ToolResult::failure(String::new(), e)),
        }
    }
}
