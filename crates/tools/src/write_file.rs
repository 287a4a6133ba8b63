//! write_file — create or overwrite a file, invalidating the cache.

use crate::{parse_arguments, success_result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docsmith_core::error::ToolError;
use docsmith_core::tool::{Tool, ToolResult};
use docsmith_fs::{FileStore, WriteOutcome};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WriteFileArgs {
    file_path: String,
    content: String,
    overwrite: bool,
}

#[derive(Debug, Serialize)]
struct WriteFileOutput {
    success: bool,
    file_path: PathBuf,
    size: u64,
    created: bool,
    last_modified: DateTime<Utc>,
    message: String,
}

pub struct WriteFileTool {
    store: Arc<FileStore>,
}

impl WriteFileTool {
    pub fn new(store: Arc<FileStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write content to a file. Parent directories are created as needed. Refuses to replace an existing file unless overwrite is true."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path of the file to write"
                },
                "content": {
                    "type": "string",
                    "description": "The full content to write"
                },
                "overwrite": {
                    "type": "boolean",
                    "description": "Allow replacing an existing file"
                }
            },
            "required": ["file_path", "content", "overwrite"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, arguments: &str) -> Result<ToolResult, ToolError> {
        let args: WriteFileArgs = match parse_arguments(arguments) {
            Ok(args) => args,
            Err(failure) => return Ok(*failure),
        };

        let path = std::path::Path::new(&args.file_path);
        match self.store.write(path, &args.content, args.overwrite).await {
            Ok(WriteOutcome::Written {
                path,
                size,
                created,
                modified,
            }) => {
                let message = if created {
                    format!("Created {} ({size} bytes)", path.display())
                } else {
                    format!("Overwrote {} ({size} bytes)", path.display())
                };
                Ok(success_result(&WriteFileOutput {
                    success: true,
                    file_path: path,
                    size,
                    created,
                    last_modified: modified,
                    message,
                }))
            }
            Ok(WriteOutcome::AlreadyExists { path }) => Ok(ToolResult::failure(
                String::new(),
                format!(
                    "File already exists: {}. Pass overwrite=true to replace it.",
                    path.display()
                ),
            )),
            Err(e) => Ok(ToolResult::failure(String::new(), e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsmith_fs::{FileCache, FixedProbe};
    use std::fs;
    use tempfile::TempDir;

    const GIB: u64 = 1024 * 1024 * 1024;

    fn tool() -> WriteFileTool {
        let probe = Arc::new(FixedProbe::new(32 * GIB, 28 * GIB));
        let store = Arc::new(FileStore::new(Arc::new(FileCache::new(probe))));
        WriteFileTool::new(store)
    }

    #[test]
    fn tool_definition() {
        let tool = tool();
        assert_eq!(tool.name(), "write_file");
        let schema = tool.parameters_schema();
        assert_eq!(
            schema["required"],
            serde_json::json!(["file_path", "content", "overwrite"])
        );
    }

    #[tokio::test]
    async fn writes_new_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.md");

        let args = serde_json::json!({
            "file_path": path.to_str().unwrap(),
            "content": "# Output",
            "overwrite": false,
        })
        .to_string();
        let result = tool().execute(&args).await.unwrap();
        assert!(result.success);

        let output: serde_json::Value = serde_json::from_str(&result.output).unwrap();
        assert_eq!(output["created"], serde_json::json!(true));
        assert_eq!(output["size"], serde_json::json!(8));
        assert_eq!(fs::read_to_string(&path).unwrap(), "# Output");
    }

    #[tokio::test]
    async fn refuses_existing_without_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("present.md");
        fs::write(&path, "original").unwrap();

        let args = serde_json::json!({
            "file_path": path.to_str().unwrap(),
            "content": "replacement",
            "overwrite": false,
        })
        .to_string();
        let result = tool().execute(&args).await.unwrap();
        assert!(!result.success);

        let output: serde_json::Value = serde_json::from_str(&result.output).unwrap();
        assert!(
            output["error"]
                .as_str()
                .unwrap()
                .contains("File already exists")
        );
        assert_eq!(fs::read_to_string(&path).unwrap(), "original");
    }

    #[tokio::test]
    async fn overwrites_when_asked() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("present.md");
        fs::write(&path, "original").unwrap();

        let args = serde_json::json!({
            "file_path": path.to_str().unwrap(),
            "content": "replacement",
            "overwrite": true,
        })
        .to_string();
        let result = tool().execute(&args).await.unwrap();
        assert!(result.success);

        let output: serde_json::Value = serde_json::from_str(&result.output).unwrap();
        assert_eq!(output["created"], serde_json::json!(false));
        assert_eq!(fs::read_to_string(&path).unwrap(), "replacement");
    }

    #[tokio::test]
    async fn missing_overwrite_flag_is_rejected() {
        let args = serde_json::json!({
            "file_path": "/tmp/x.md",
            "content": "text",
        })
        .to_string();
        let result = tool().execute(&args).await.unwrap();
        assert!(!result.success);
        assert!(result.output.contains("Invalid arguments"));
    }
}
