//! search_file_content — find a literal term inside files.

use crate::{parse_arguments, success_result};
use async_trait::async_trait;
use docsmith_core::error::ToolError;
use docsmith_core::tool::{Tool, ToolResult};
use docsmith_fs::{ContentOptions, FileContentMatches, content_search};
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_max_results() -> usize {
    20
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ContentSearchArgs {
    directory_path: String,
    search_term: String,
    #[serde(default)]
    file_extensions: Option<Vec<String>>,
    #[serde(default = "default_max_results")]
    max_results: usize,
    #[serde(default)]
    case_sensitive: bool,
}

#[derive(Debug, Serialize)]
struct ContentSearchOutput {
    success: bool,
    results: Vec<FileContentMatches>,
    total_found: usize,
}

pub struct ContentSearchTool;

impl ContentSearchTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ContentSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for ContentSearchTool {
    fn name(&self) -> &str {
        "search_file_content"
    }

    fn description(&self) -> &str {
        "Search file contents for a literal term. Returns per-file matches with line numbers, line text, and match positions. Binary files are skipped."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "directory_path": {
                    "type": "string",
                    "description": "Directory to search under"
                },
                "search_term": {
                    "type": "string",
                    "description": "Literal text to look for"
                },
                "file_extensions": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Only search files with these extensions"
                },
                "max_results": {
                    "type": "integer",
                    "description": "Cap on the number of files returned (default 20)"
                },
                "case_sensitive": {
                    "type": "boolean",
                    "description": "Match case exactly (default false)"
                }
            },
            "required": ["directory_path", "search_term"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, arguments: &str) -> Result<ToolResult, ToolError> {
        let args: ContentSearchArgs = match parse_arguments(arguments) {
            Ok(args) => args,
            Err(failure) => return Ok(*failure),
        };

        let options = ContentOptions {
            extensions: args.file_extensions,
            case_sensitive: args.case_sensitive,
            max_results: args.max_results,
            ..Default::default()
        };
        match content_search(Path::new(&args.directory_path), &args.search_term, &options).await {
            Ok(results) => Ok(success_result(&ContentSearchOutput {
                success: true,
                total_found: results.len(),
                results,
            })),
            Err(e) => Ok(ToolResult::failure(String::new(), e)),
        }
    }
}
