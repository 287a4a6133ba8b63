//! search_files — wildcard or fuzzy file-name search under a directory.

use crate::{parse_arguments, success_result};
use async_trait::async_trait;
use docsmith_core::error::ToolError;
use docsmith_core::tool::{Tool, ToolResult};
use docsmith_fs::{FuzzyOptions, PatternOptions, fuzzy_find, pattern_search};
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_max_results() -> usize {
    50
}

fn default_min_score() -> f64 {
    0.3
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SearchFilesArgs {
    directory_path: String,
    pattern: String,
    #[serde(default)]
    file_extensions: Option<Vec<String>>,
    #[serde(default = "default_max_results")]
    max_results: usize,
    #[serde(default)]
    case_sensitive: bool,
    #[serde(default)]
    fuzzy_search: bool,
    #[serde(default = "default_min_score")]
    min_score: f64,
    #[serde(default)]
    include_directories: bool,
}

#[derive(Debug, Serialize)]
struct SearchFilesOutput<T: Serialize> {
    success: bool,
    results: Vec<T>,
    total_found: usize,
    truncated: bool,
}

pub struct SearchFilesTool;

impl SearchFilesTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SearchFilesTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for SearchFilesTool {
    fn name(&self) -> &str {
        "search_files"
    }

    fn description(&self) -> &str {
        "Search for files by name under a directory. The pattern is a * wildcard by default, or a similarity query when fuzzy_search is true."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "directory_path": {
                    "type": "string",
                    "description": "Directory to search under"
                },
                "pattern": {
                    "type": "string",
                    "description": "Wildcard pattern (e.g. *.rs) or fuzzy query"
                },
                "file_extensions": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Only match files with these extensions"
                },
                "max_results": {
                    "type": "integer",
                    "description": "Cap on the number of results (default 50)"
                },
                "case_sensitive": {
                    "type": "boolean",
                    "description": "Match case exactly (default false)"
                },
                "fuzzy_search": {
                    "type": "boolean",
                    "description": "Score by similarity instead of wildcard matching"
                },
                "min_score": {
                    "type": "number",
                    "description": "Minimum similarity score for fuzzy results (default 0.3)"
                },
                "include_directories": {
                    "type": "boolean",
                    "description": "Also match directory names"
                }
            },
            "required": ["directory_path", "pattern"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, arguments: &str) -> Result<ToolResult, ToolError> {
        let args: SearchFilesArgs = match parse_arguments(arguments) {
            Ok(args) => args,
            Err(failure) => return Ok(*failure),
        };
        let root = Path::new(&args.directory_path);

        if args.fuzzy_search {
            let options = FuzzyOptions {
                extensions: args.file_extensions,
                case_sensitive: args.case_sensitive,
                min_score: args.min_score,
                include_directories: args.include_directories,
                max_results: args.max_results,
                ..Default::default()
            };
            match fuzzy_find(root, &args.pattern, &options).await {
                Ok(results) => {
                    let truncated = results.len() >= args.max_results;
                    Ok(success_result(&SearchFilesOutput {
                        success: true,
                        total_found: results.len(),
                        truncated,
                        results,
                    }))
                }
                Err(e) => Ok(ToolResult::failure(String::new(), e)),
            }
        } else {
            let options = PatternOptions {
                extensions: args.file_extensions,
                case_sensitive: args.case_sensitive,
                include_directories: args.include_directories,
                max_results: args.max_results,
                ..Default::default()
            };
            match pattern_search(root, &args.pattern, &options).await {
                Ok(outcome) => Ok(success_result(&SearchFilesOutput {
                    success: true,
                    total_found: outcome.results.len(),
                    truncated: outcome.truncated,
                    results: outcome.results,
                })),
                Err(e) => Ok(ToolResult::failure(String::new(), e)),
            }
        }
    }
}
