//! list_directory — list a directory with per-entry metadata.

use crate::{parse_arguments, success_result};
use async_trait::async_trait;
use docsmith_core::error::ToolError;
use docsmith_core::tool::{Tool, ToolResult};
use docsmith_fs::{DirEntryInfo, FileStore};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ListDirectoryArgs {
    directory_path: String,
    include_hidden: bool,
}

#[derive(Debug, Serialize)]
struct ListDirectoryOutput {
    success: bool,
    directory_path: PathBuf,
    contents: Vec<DirEntryInfo>,
    total_items: usize,
}

pub struct ListDirectoryTool {
    store: Arc<FileStore>,
}

impl ListDirectoryTool {
    pub fn new(store: Arc<FileStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for ListDirectoryTool {
    fn name(&self) -> &str {
        "list_directory"
    }

    fn description(&self) -> &str {
        "List a directory's entries with name, kind, size, and modification time. Dotfiles are excluded unless include_hidden is true."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "directory_path": {
                    "type": "string",
                    "description": "Path of the directory to list"
                },
                "include_hidden": {
                    "type": "boolean",
                    "description": "Include dotfiles and dot-directories"
                }
            },
            "required": ["directory_path", "include_hidden"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, arguments: &str) -> Result<ToolResult, ToolError> {
        let args: ListDirectoryArgs = match parse_arguments(arguments) {
            Ok(args) => args,
            Err(failure) => return Ok(*failure),
        };

        let path = std::path::Path::new(&args.directory_path);
        match self.store.list(path, args.include_hidden).await {
            Ok(contents) => Ok(success_result(&ListDirectoryOutput {
                success: true,
                directory_path: path.to_path_buf(),
                total_items: contents.len(),
                contents,
            })),
            Err(e) => Ok(ToolResult::failure(String::new(), e)),
        }
    }
}
