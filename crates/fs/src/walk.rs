//! Depth-bounded directory traversal with a visitor contract.
//!
//! The shared primitive under pattern search, fuzzy search, content search,
//! and project analysis. Visitors see every file and directory (after the
//! hidden/extension filters) and steer the walk: a file visit may stop the
//! whole walk, a directory visit decides whether to descend.
//!
//! Entries within a directory are visited in name order, so traversal
//! order is deterministic. Unreadable subdirectories are skipped, not
//! fatal. The walk yields to the scheduler periodically so long scans do
//! not starve other work.

use docsmith_core::error::{FileError, FileOp};
use std::fs::Metadata;
use std::path::{Path, PathBuf};

/// How many entries are processed between scheduler yields.
const YIELD_EVERY: usize = 64;

/// Decision returned by a file visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileDecision {
    Continue,
    /// Terminate the entire walk early.
    Stop,
}

/// Decision returned by a directory visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirDecision {
    Descend,
    Skip,
    /// Terminate the entire walk early.
    Stop,
}

/// The visitor contract for [`walk`].
pub trait Visitor {
    /// Called for every file that passes the filters.
    fn file(&mut self, path: &Path, relative: &Path, meta: &Metadata) -> FileDecision;

    /// Called for every directory below the root.
    fn dir(&mut self, path: &Path, relative: &Path, meta: &Metadata) -> DirDecision;
}

/// Traversal options.
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Depth bound: 0 visits only the root's immediate entries and never
    /// descends; each extra level allows one more directory hop.
    pub max_depth: usize,

    /// Visit dotfiles and dot-directories.
    pub include_hidden: bool,

    /// When set, only files with one of these extensions are visited.
    /// Applies to files only — directories always reach the visitor.
    pub extensions: Option<Vec<String>>,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            max_depth: 8,
            include_hidden: false,
            extensions: None,
        }
    }
}

impl WalkOptions {
    fn extension_allowed(&self, path: &Path) -> bool {
        let Some(filter) = &self.extensions else {
            return true;
        };
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        filter.iter().any(|f| {
            let f = f.strip_prefix('.').unwrap_or(f);
            f.eq_ignore_ascii_case(ext)
        })
    }
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Walk `root`, feeding entries to `visitor`.
///
/// Only a failure to read the root itself is an error; everything below
/// degrades to skipping.
pub async fn walk(
    root: &Path,
    options: &WalkOptions,
    visitor: &mut (dyn Visitor + Send),
) -> Result<(), FileError> {
    // Probe the root first so an unreadable root surfaces as a failure.
    tokio::fs::read_dir(root)
        .await
        .map_err(|e| FileError::operation(FileOp::List, root, e.to_string()))?;

    let mut stack: Vec<(PathBuf, usize)> = vec![(root.to_path_buf(), 0)];
    let mut processed = 0usize;

    while let Some((dir, depth)) = stack.pop() {
        let Ok(mut reader) = tokio::fs::read_dir(&dir).await else {
            continue;
        };

        let mut entries: Vec<(PathBuf, Metadata)> = Vec::new();
        while let Ok(Some(entry)) = reader.next_entry().await {
            if let Ok(meta) = entry.metadata().await {
                entries.push((entry.path(), meta));
            }
        }
        entries.sort_by(|a, b| a.0.file_name().cmp(&b.0.file_name()));

        let mut descend: Vec<PathBuf> = Vec::new();
        for (path, meta) in entries {
            processed += 1;
            if processed % YIELD_EVERY == 0 {
                tokio::task::yield_now().await;
            }

            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if !options.include_hidden && is_hidden(name) {
                continue;
            }
            let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();

            if meta.is_dir() {
                match visitor.dir(&path, &relative, &meta) {
                    DirDecision::Descend if depth < options.max_depth => descend.push(path),
                    DirDecision::Descend | DirDecision::Skip => {}
                    DirDecision::Stop => return Ok(()),
                }
            } else if meta.is_file() {
                if !options.extension_allowed(&path) {
                    continue;
                }
                match visitor.file(&path, &relative, &meta) {
                    FileDecision::Continue => {}
                    FileDecision::Stop => return Ok(()),
                }
            }
        }

        // Reverse so the stack pops subdirectories in name order.
        for path in descend.into_iter().rev() {
            stack.push((path, depth + 1));
        }
    }

    Ok(())
}
