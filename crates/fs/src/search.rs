//! Name-pattern and content search over the shared traversal.

use crate::ops;
use crate::walk::{self, DirDecision, FileDecision, Visitor, WalkOptions};
use docsmith_core::error::FileError;
use serde::Serialize;
use std::fs::Metadata;
use std::path::{Path, PathBuf};

/// A hit from a pattern search.
#[derive(Debug, Clone, Serialize)]
pub struct PatternMatch {
    pub path: PathBuf,
    pub relative_path: String,
    pub is_directory: bool,
    pub size: u64,
}

/// Pattern search results, flagged when the cap was hit.
#[derive(Debug, Clone, Serialize)]
pub struct PatternSearchOutcome {
    pub results: Vec<PatternMatch>,
    pub truncated: bool,
}

/// Options for [`pattern_search`].
#[derive(Debug, Clone)]
pub struct PatternOptions {
    pub extensions: Option<Vec<String>>,
    pub case_sensitive: bool,
    pub include_directories: bool,
    pub max_results: usize,
    pub max_depth: usize,
}

impl Default for PatternOptions {
    fn default() -> Self {
        Self {
            extensions: None,
            case_sensitive: false,
            include_directories: false,
            max_results: 50,
            max_depth: 8,
        }
    }
}

/// Simple wildcard match: `*` matches any run of characters, everything
/// else is literal. Case folding is the caller's job.
fn wildcard_match(pattern: &str, text: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == text;
    }
    let parts: Vec<&str> = pattern.split('*').collect();
    let mut pos = 0usize;

    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            if !text.starts_with(part) {
                return false;
            }
            pos = part.len();
        } else if i == parts.len() - 1 {
            let rest = &text[pos.min(text.len())..];
            if !rest.ends_with(part) {
                return false;
            }
        } else {
            match text[pos.min(text.len())..].find(part) {
                Some(found) => pos += found + part.len(),
                None => return false,
            }
        }
    }
    true
}

/// Whether `name` matches `pattern`, case-insensitive unless requested.
pub fn matches_pattern(pattern: &str, name: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        wildcard_match(pattern, name)
    } else {
        wildcard_match(&pattern.to_lowercase(), &name.to_lowercase())
    }
}

struct PatternCollector<'a> {
    pattern: &'a str,
    options: &'a PatternOptions,
    results: Vec<PatternMatch>,
    truncated: bool,
}

impl PatternCollector<'_> {
    fn consider(&mut self, path: &Path, relative: &Path, meta: &Metadata, is_dir: bool) -> bool {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if matches_pattern(self.pattern, name, self.options.case_sensitive) {
            if self.results.len() >= self.options.max_results {
                self.truncated = true;
                return false;
            }
            self.results.push(PatternMatch {
                path: path.to_path_buf(),
                relative_path: relative.to_string_lossy().into_owned(),
                is_directory: is_dir,
                size: meta.len(),
            });
        }
        true
    }
}

impl Visitor for PatternCollector<'_> {
    fn file(&mut self, path: &Path, relative: &Path, meta: &Metadata) -> FileDecision {
        if self.consider(path, relative, meta, false) {
            FileDecision::Continue
        } else {
            FileDecision::Stop
        }
    }

    fn dir(&mut self, path: &Path, relative: &Path, meta: &Metadata) -> DirDecision {
        if self.options.include_directories && !self.consider(path, relative, meta, true) {
            return DirDecision::Stop;
        }
        DirDecision::Descend
    }
}

/// Search `root` for basenames matching a `*` wildcard pattern.
pub async fn pattern_search(
    root: &Path,
    pattern: &str,
    options: &PatternOptions,
) -> Result<PatternSearchOutcome, FileError> {
    let mut collector = PatternCollector {
        pattern,
        options,
        results: Vec::new(),
        truncated: false,
    };
    let walk_options = WalkOptions {
        max_depth: options.max_depth,
        include_hidden: false,
        extensions: options.extensions.clone(),
    };
    walk::walk(root, &walk_options, &mut collector).await?;
    Ok(PatternSearchOutcome {
        results: collector.results,
        truncated: collector.truncated,
    })
}

// --- Content search ---

/// A single line hit inside a file.
#[derive(Debug, Clone, Serialize)]
pub struct ContentMatch {
    /// 1-based line number
    pub line_number: usize,
    pub line_content: String,
    /// Byte offset of the match within the line
    pub match_position: usize,
}

/// All hits within one file.
#[derive(Debug, Clone, Serialize)]
pub struct FileContentMatches {
    pub path: PathBuf,
    pub relative_path: String,
    pub matches: Vec<ContentMatch>,
}

/// Options for [`content_search`].
#[derive(Debug, Clone)]
pub struct ContentOptions {
    pub extensions: Option<Vec<String>>,
    pub case_sensitive: bool,
    /// Cap on the number of files returned.
    pub max_results: usize,
    pub max_depth: usize,
}

impl Default for ContentOptions {
    fn default() -> Self {
        Self {
            extensions: None,
            case_sensitive: false,
            max_results: 20,
            max_depth: 8,
        }
    }
}

struct CandidateCollector {
    candidates: Vec<(PathBuf, String, u64)>,
}

impl Visitor for CandidateCollector {
    fn file(&mut self, path: &Path, relative: &Path, meta: &Metadata) -> FileDecision {
        self.candidates.push((
            path.to_path_buf(),
            relative.to_string_lossy().into_owned(),
            meta.len(),
        ));
        FileDecision::Continue
    }

    fn dir(&mut self, _path: &Path, _relative: &Path, _meta: &Metadata) -> DirDecision {
        DirDecision::Descend
    }
}

/// Find every occurrence of `term` on a line, reporting byte offsets.
fn line_matches(line: &str, term: &str, case_sensitive: bool) -> Vec<usize> {
    let (haystack, needle) = if case_sensitive {
        (line.to_string(), term.to_string())
    } else {
        (line.to_lowercase(), term.to_lowercase())
    };
    if needle.is_empty() {
        return Vec::new();
    }

    let mut positions = Vec::new();
    let mut start = 0;
    while let Some(found) = haystack[start..].find(&needle) {
        positions.push(start + found);
        start += found + needle.len();
    }
    positions
}

/// Search file contents under `root` for a literal term. Binary-looking
/// files and unreadable files are skipped.
pub async fn content_search(
    root: &Path,
    term: &str,
    options: &ContentOptions,
) -> Result<Vec<FileContentMatches>, FileError> {
    let mut collector = CandidateCollector {
        candidates: Vec::new(),
    };
    let walk_options = WalkOptions {
        max_depth: options.max_depth,
        include_hidden: false,
        extensions: options.extensions.clone(),
    };
    walk::walk(root, &walk_options, &mut collector).await?;

    let mut results = Vec::new();
    for (path, relative_path, size) in collector.candidates {
        if results.len() >= options.max_results {
            break;
        }
        if ops::is_likely_binary(&path, size).await {
            continue;
        }
        let Ok(content) = tokio::fs::read_to_string(&path).await else {
            continue;
        };

        let mut matches = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            for position in line_matches(line, term, options.case_sensitive) {
                matches.push(ContentMatch {
                    line_number: idx + 1,
                    line_content: line.to_string(),
                    match_position: position,
                });
            }
        }
        if !matches.is_empty() {
            results.push(FileContentMatches {
                path,
                relative_path,
                matches,
            });
        }
    }

    Ok(results)
}
