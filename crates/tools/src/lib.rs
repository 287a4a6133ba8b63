//! Built-in tool implementations for docsmith.
//!
//! Tools give the agent the ability to inspect and modify the local
//! project: read and write files, list directories, inspect metadata, and
//! search file names and contents.
//!
//! Every tool follows the same invocation contract: arguments arrive as an
//! opaque JSON string, validated against a typed struct that rejects
//! unknown properties; the result is always a JSON document with at least
//! a `success` field. Shape-invalid arguments produce a structured
//! `success: false` result instead of an error.

pub mod analyze_project;
pub mod content_search;
pub mod file_info;
pub mod fuzzy_find;
pub mod list_directory;
pub mod read_file;
pub mod search_files;
pub mod write_file;

use docsmith_core::tool::{ToolRegistry, ToolResult};
use docsmith_fs::FileStore;
use std::sync::Arc;

/// Create the registry with all built-in tools. Assembled once at startup;
/// the registry is read-only afterwards.
pub fn default_registry(store: Arc<FileStore>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(read_file::ReadFileTool::new(store.clone())));
    registry.register(Box::new(write_file::WriteFileTool::new(store.clone())));
    registry.register(Box::new(list_directory::ListDirectoryTool::new(
        store.clone(),
    )));
    registry.register(Box::new(file_info::FileInfoTool::new(store.clone())));
    registry.register(Box::new(search_files::SearchFilesTool::new()));
    registry.register(Box::new(fuzzy_find::FuzzyFindTool::new()));
    registry.register(Box::new(content_search::ContentSearchTool::new()));
    registry.register(Box::new(analyze_project::AnalyzeProjectTool::new()));
    registry
}

/// Parse a tool's JSON-string arguments into its typed struct.
/// A shape mismatch becomes a ready-to-return failure result.
pub(crate) fn parse_arguments<T: serde::de::DeserializeOwned>(
    arguments: &str,
) -> Result<T, Box<ToolResult>> {
    serde_json::from_str(arguments)
        .map_err(|e| Box::new(ToolResult::failure(String::new(), format!("Invalid arguments: {e}"))))
}

/// Serialize a typed result payload into a successful ToolResult.
pub(crate) fn success_result<T: serde::Serialize>(payload: &T) -> ToolResult {
    match serde_json::to_string(payload) {
        Ok(output) => ToolResult {
            call_id: String::new(),
            success: true,
            output,
        },
        Err(e) => ToolResult::failure(String::new(), format!("Failed to encode result: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsmith_core::tool::Tool;
    use docsmith_fs::{FileCache, FixedProbe};

    const GIB: u64 = 1024 * 1024 * 1024;

    fn test_store() -> Arc<FileStore> {
        let probe = Arc::new(FixedProbe::new(32 * GIB, 28 * GIB));
        Arc::new(FileStore::new(Arc::new(FileCache::new(probe))))
    }

    #[test]
    fn default_registry_contains_all_tools() {
        let registry = default_registry(test_store());
        let mut names = registry.names();
        names.sort_unstable();
        assert_eq!(
            names,
            vec![
                "analyze_project",
                "fuzzy_find_files",
                "get_file_info",
                "list_directory",
                "read_file",
                "search_file_content",
                "search_files",
                "write_file",
            ]
        );
    }

    #[test]
    fn every_schema_rejects_unknown_properties() {
        let registry = default_registry(test_store());
        for name in registry.names() {
            let tool = registry.get(name).unwrap();
            let schema = tool.parameters_schema();
            assert_eq!(
                schema["additionalProperties"],
                serde_json::json!(false),
                "schema for {name} must reject unknown properties"
            );
        }
    }
}
