//! Project structure analysis.
//!
//! A bounded walk that produces the high-level overview the agent asks for
//! before writing documentation: what file types the project contains,
//! which files are large, how many directories there are.

use crate::walk::{self, DirDecision, FileDecision, Visitor, WalkOptions};
use docsmith_core::error::FileError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::Metadata;
use std::path::{Path, PathBuf};

/// Files at or above this size are reported as large.
const LARGE_FILE_THRESHOLD: u64 = 1024 * 1024;

/// How many large files are reported, biggest first.
const LARGE_FILE_LIMIT: usize = 10;

/// A file worth calling out by size.
#[derive(Debug, Clone, Serialize)]
pub struct LargeFile {
    pub relative_path: String,
    pub size: u64,
}

/// The analysis result.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectAnalysis {
    pub summary: String,
    /// Extension → file count. Extensionless files count under "(none)".
    pub file_types: BTreeMap<String, usize>,
    pub large_files: Vec<LargeFile>,
    pub total_files: usize,
    pub total_directories: usize,
    pub total_size: u64,
}

struct AnalysisCollector {
    file_types: BTreeMap<String, usize>,
    large_files: Vec<LargeFile>,
    total_files: usize,
    total_directories: usize,
    total_size: u64,
}

impl Visitor for AnalysisCollector {
    fn file(&mut self, path: &Path, relative: &Path, meta: &Metadata) -> FileDecision {
        self.total_files += 1;
        self.total_size += meta.len();

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_else(|| "(none)".to_string());
        *self.file_types.entry(ext).or_insert(0) += 1;

        if meta.len() >= LARGE_FILE_THRESHOLD {
            self.large_files.push(LargeFile {
                relative_path: relative.to_string_lossy().into_owned(),
                size: meta.len(),
            });
        }
        FileDecision::Continue
    }

    fn dir(&mut self, _path: &Path, _relative: &Path, _meta: &Metadata) -> DirDecision {
        self.total_directories += 1;
        DirDecision::Descend
    }
}

fn format_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * KIB;
    if bytes >= MIB {
        format!("{:.1} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{bytes} B")
    }
}

/// Analyze the project rooted at `root`, descending `max_depth` levels.
pub async fn analyze_project(
    root: &Path,
    max_depth: usize,
) -> Result<ProjectAnalysis, FileError> {
    let mut collector = AnalysisCollector {
        file_types: BTreeMap::new(),
        large_files: Vec::new(),
        total_files: 0,
        total_directories: 0,
        total_size: 0,
    };
    let options = WalkOptions {
        max_depth,
        include_hidden: false,
        extensions: None,
    };
    walk::walk(root, &options, &mut collector).await?;

    collector.large_files.sort_by(|a, b| b.size.cmp(&a.size));
    collector.large_files.truncate(LARGE_FILE_LIMIT);

    let dominant = collector
        .file_types
        .iter()
        .max_by_key(|(_, count)| **count)
        .map(|(ext, count)| format!(", mostly .{ext} ({count} files)"))
        .unwrap_or_default();
    let summary = format!(
        "{} files in {} directories, {} total{}",
        collector.total_files,
        collector.total_directories,
        format_size(collector.total_size),
        dominant,
    );

    Ok(ProjectAnalysis {
        summary,
        file_types: collector.file_types,
        large_files: collector.large_files,
        total_files: collector.total_files,
        total_directories: collector.total_directories,
        total_size: collector.total_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("main.rs"), "fn main() {}").unwrap();
        fs::write(dir.path().join("lib.rs"), "pub mod x;").unwrap();
        fs::write(dir.path().join("README.md"), "# Project").unwrap();
        fs::write(dir.path().join("Makefile"), "all:").unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src").join("util.rs"), "pub fn u() {}").unwrap();
        dir
    }

    #[tokio::test]
    async fn counts_files_types_and_directories() {
        let dir = fixture();
        let analysis = analyze_project(dir.path(), 5).await.unwrap();

        assert_eq!(analysis.total_files, 5);
        assert_eq!(analysis.total_directories, 1);
        assert_eq!(analysis.file_types.get("rs"), Some(&3));
        assert_eq!(analysis.file_types.get("md"), Some(&1));
        assert_eq!(analysis.file_types.get("(none)"), Some(&1));
        assert!(analysis.summary.contains("5 files"));
        assert!(analysis.summary.contains(".rs"));
    }

    #[tokio::test]
    async fn reports_large_files_biggest_first() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("small.txt"), "tiny").unwrap();
        fs::write(dir.path().join("big.dat"), vec![b'a'; 2 * 1024 * 1024]).unwrap();
        fs::write(dir.path().join("bigger.dat"), vec![b'b'; 3 * 1024 * 1024]).unwrap();

        let analysis = analyze_project(dir.path(), 3).await.unwrap();
        assert_eq!(analysis.large_files.len(), 2);
        assert_eq!(analysis.large_files[0].relative_path, "bigger.dat");
        assert_eq!(analysis.large_files[1].relative_path, "big.dat");
    }

    #[tokio::test]
    async fn depth_bound_limits_the_walk() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("a/b/c")).unwrap();
        fs::write(dir.path().join("top.txt"), "t").unwrap();
        fs::write(dir.path().join("a/mid.txt"), "m").unwrap();
        fs::write(dir.path().join("a/b/deep.txt"), "d").unwrap();
        fs::write(dir.path().join("a/b/c/deepest.txt"), "x").unwrap();

        let analysis = analyze_project(dir.path(), 1).await.unwrap();
        // Depth 1: top.txt and a/mid.txt are visible, deeper files are not.
        assert_eq!(analysis.total_files, 2);
    }
}
