//! fuzzy_find_files — similarity-ranked file discovery from a query.

use crate::{parse_arguments, success_result};
use async_trait::async_trait;
use docsmith_core::error::ToolError;
use docsmith_core::tool::{Tool, ToolResult};
use docsmith_fs::{FuzzyMatch, FuzzyOptions, fuzzy_find};
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_directory() -> String {
    ".".to_string()
}

fn default_max_results() -> usize {
    20
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FuzzyFindArgs {
    query: String,
    #[serde(default = "default_directory")]
    directory_path: String,
    #[serde(default = "default_max_results")]
    max_results: usize,
}

#[derive(Debug, Serialize)]
struct FuzzyFindOutput {
    success: bool,
    results: Vec<FuzzyMatch>,
    total_found: usize,
}

pub struct FuzzyFindTool;

impl FuzzyFindTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FuzzyFindTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for FuzzyFindTool {
    fn name(&self) -> &str {
        "fuzzy_find_files"
    }

    fn description(&self) -> &str {
        "Find files whose names are similar to a query, ranked by similarity. Useful when the exact file name is not known."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Approximate file name to look for"
                },
                "directory_path": {
                    "type": "string",
                    "description": "Directory to search under (default: current directory)"
                },
                "max_results": {
                    "type": "integer",
                    "description": "Cap on the number of results (default 20)"
                }
            },
            "required": ["query"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, arguments: &str) -> Result<ToolResult, ToolError> {
        let args: FuzzyFindArgs = match parse_arguments(arguments) {
            Ok(args) => args,
            Err(failure) => return Ok(*failure),
        };

        let options = FuzzyOptions {
            max_results: args.max_results,
            ..Default::default()
        };
        match fuzzy_find(Path::new(&args.directory_path), &args.query, &options).await {
            Ok(results) => Ok(success_result(&FuzzyFindOutput {
                success: true,
                total_found: results.len(),
                results,
            })),
            Err(e) => Ok(ToolResult::failure(String::new(), e)),
        }
    }
}
