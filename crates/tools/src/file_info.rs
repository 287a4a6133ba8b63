//! get_file_info — full metadata for a single path.

use crate::{parse_arguments, success_result};
use async_trait::async_trait;
use docsmith_core::error::ToolError;
use docsmith_core::tool::{Tool, ToolResult};
use docsmith_fs::{FileInfo, FileStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileInfoArgs {
    file_path: String,
}

#[derive(Debug, Serialize)]
struct FileInfoOutput {
    success: bool,
    #[serde(flatten)]
    info: FileInfo,
}

pub struct FileInfoTool {
    store: Arc<FileStore>,
}

impl FileInfoTool {
    pub fn new(store: Arc<FileStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for FileInfoTool {
    fn name(&self) -> &str {
        "get_file_info"
    }

    fn description(&self) -> &str {
        "Get metadata for a file or directory: kind, size, timestamps, permissions, readability; binary-likelihood for files, child count for directories."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path to inspect"
                }
            },
            "required": ["file_path"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, arguments: &str) -> Result<ToolResult, ToolError> {
        let args: FileInfoArgs = match parse_arguments(arguments) {
            Ok(args) => args,
            Err(failure) => return Ok(*failure),
        };

        match self.store.info(std::path::Path::new(&args.file_path)).await {
            Ok(info) => Ok(success_result(&FileInfoOutput {
                success: true,
                info,
            })),
            Err(e) => Ok(ToolResult::failure(String::new(), e)),
        }
    }
}
