//! analyze_project — high-level project overview for documentation work.

use crate::{parse_arguments, success_result};
use async_trait::async_trait;
use docsmith_core::error::ToolError;
use docsmith_core::tool::{Tool, ToolResult};
use docsmith_fs::analyze_project;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

fn default_max_depth() -> usize {
    5
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AnalyzeProjectArgs {
    project_path: String,
    #[serde(default = "default_max_depth")]
    max_depth: usize,
}

#[derive(Debug, Serialize)]
struct AnalyzeProjectOutput {
    success: bool,
    summary: String,
    file_types: BTreeMap<String, usize>,
    large_files: Vec<docsmith_fs::analyze::LargeFile>,
    total_directories: usize,
}

pub struct AnalyzeProjectTool;

impl AnalyzeProjectTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AnalyzeProjectTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for AnalyzeProjectTool {
    fn name(&self) -> &str {
        "analyze_project"
    }

    fn description(&self) -> &str {
        "Summarize a project's structure: file-type histogram, large files, and directory count. A good first call before writing documentation."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "project_path": {
                    "type": "string",
                    "description": "Root of the project to analyze"
                },
                "max_depth": {
                    "type": "integer",
                    "description": "How many directory levels to descend (default 5)"
                }
            },
            "required": ["project_path"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, arguments: &str) -> Result<ToolResult, ToolError> {
        let args: AnalyzeProjectArgs = match parse_arguments(arguments) {
            Ok(args) => args,
            Err(failure) => return Ok(*failure),
        };

        match analyze_project(Path::new(&args.project_path), args.max_depth).await {
            Ok(analysis) => Ok(success_result(&AnalyzeProjectOutput {
                success: true,
                summary: analysis.summary,
                file_types: analysis.file_types,
                large_files: analysis.large_files,
                total_directories: analysis.total_directories,
            })),
            Err(e) => Ok(ToolResult::failure(String::new(), e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn summarizes_a_project() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("main.rs"), "fn main() {}").unwrap();
        fs::write(dir.path().join("README.md"), "# Hi").unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src").join("lib.rs"), "").unwrap();

        let args = serde_json::json!({
            "project_path": dir.path().to_str().unwrap(),
        })
        .to_string();
        let result = AnalyzeProjectTool::new().execute(&args).await.unwrap();
        assert!(result.success);

        let output: serde_json::Value = serde_json::from_str(&result.output).unwrap();
        assert_eq!(output["file_types"]["rs"], serde_json::json!(2));
        assert_eq!(output["file_types"]["md"], serde_json::json!(1));
        assert_eq!(output["total_directories"], serde_json::json!(1));
        assert!(output["summary"].as_str().unwrap().contains("3 files"));
    }

    #[tokio::test]
    async fn depth_is_honored() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::write(dir.path().join("top.rs"), "x").unwrap();
        fs::write(dir.path().join("a/b/deep.rs"), "x").unwrap();

        let args = serde_json::json!({
            "project_path": dir.path().to_str().unwrap(),
            "max_depth": 0,
        })
        .to_string();
        let result = AnalyzeProjectTool::new().execute(&args).await.unwrap();
        let output: serde_json::Value = serde_json::from_str(&result.output).unwrap();
        assert_eq!(output["file_types"]["rs"], serde_json::json!(1));
    }

    #[tokio::test]
    async fn missing_root_is_structured_failure() {
        let args = serde_json::json!({ "project_path": "/nonexistent/docsmith" }).to_string();
        let result = AnalyzeProjectTool::new().execute(&args).await.unwrap();
        assert!(!result.success);
    }
}
