//! Similarity-scored file discovery.
//!
//! Each candidate path is scored with three signals — filename similarity,
//! parent-directory similarity (weighted 0.7), and full relative-path
//! similarity (weighted 0.9) — keeping the maximum. The walk is bounded in
//! depth, result count, and total files scanned.

use crate::walk::{self, DirDecision, FileDecision, Visitor, WalkOptions};
use docsmith_core::error::FileError;
use serde::Serialize;
use std::fs::Metadata;
use std::path::{Path, PathBuf};

/// Hard cap on candidates examined in one search.
const MAX_SCANNED: usize = 10_000;

/// Weight applied to the parent-directory-name signal.
const PARENT_WEIGHT: f64 = 0.7;

/// Weight applied to the full relative-path signal.
const PATH_WEIGHT: f64 = 0.9;

/// Which signal produced a match, in preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    /// Filename equals the query.
    Exact,
    /// Query is contained in the filename.
    Substring,
    /// The parent-directory or relative-path signal dominated.
    Path,
    /// Similarity-only match on the filename.
    Fuzzy,
}

impl MatchType {
    fn rank(self) -> u8 {
        match self {
            Self::Exact => 0,
            Self::Substring => 1,
            Self::Path => 2,
            Self::Fuzzy => 3,
        }
    }
}

/// A scored search hit.
#[derive(Debug, Clone, Serialize)]
pub struct FuzzyMatch {
    pub path: PathBuf,
    pub relative_path: String,
    pub score: f64,
    pub match_type: MatchType,
    pub is_directory: bool,
}

/// Options for [`fuzzy_find`].
#[derive(Debug, Clone)]
pub struct FuzzyOptions {
    pub extensions: Option<Vec<String>>,
    pub case_sensitive: bool,
    pub min_score: f64,
    pub include_directories: bool,
    pub max_results: usize,
    pub max_depth: usize,
}

impl Default for FuzzyOptions {
    fn default() -> Self {
        Self {
            extensions: None,
            case_sensitive: false,
            min_score: 0.3,
            include_directories: false,
            max_results: 20,
            max_depth: 8,
        }
    }
}

/// Levenshtein edit distance over chars, two-row DP.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Count of query characters matched in order within the target.
fn subsequence_matches(query: &str, target: &str) -> usize {
    let mut matched = 0;
    let mut query_chars = query.chars().peekable();
    for c in target.chars() {
        if query_chars.peek() == Some(&c) {
            query_chars.next();
            matched += 1;
        }
    }
    matched
}

/// Whether any `[ .\-_]`-delimited token of the target starts with the
/// query's first three characters.
fn word_boundary_match(query: &str, target: &str) -> bool {
    let prefix: String = query.chars().take(3).collect();
    if prefix.is_empty() {
        return false;
    }
    target
        .split([' ', '.', '-', '_'])
        .any(|token| token.starts_with(&prefix))
}

/// Similarity in `[0.0, 1.0]` between a query and a target string.
///
/// Exact match scores 1.0; containment scores 0.9 scaled by length ratio;
/// everything else is normalized Levenshtein similarity plus a subsequence
/// bonus (0.1 per in-order character) and a word-boundary bonus (0.2).
pub fn similarity(query: &str, target: &str, case_sensitive: bool) -> f64 {
    if query.is_empty() || target.is_empty() {
        return 0.0;
    }
    let (query, target) = if case_sensitive {
        (query.to_string(), target.to_string())
    } else {
        (query.to_lowercase(), target.to_lowercase())
    };

    if query == target {
        return 1.0;
    }
    if target.contains(query.as_str()) {
        return 0.9 * query.chars().count() as f64 / target.chars().count() as f64;
    }

    let q_len = query.chars().count();
    let t_len = target.chars().count();
    let distance = levenshtein(&query, &target);
    let mut score = 1.0 - distance as f64 / q_len.max(t_len) as f64;
    score += 0.1 * subsequence_matches(&query, &target) as f64;
    if word_boundary_match(&query, &target) {
        score += 0.2;
    }
    score.clamp(0.0, 1.0)
}

/// Score one candidate with all three signals, keeping the maximum.
fn score_candidate(
    query: &str,
    name: &str,
    parent_name: &str,
    relative: &str,
    case_sensitive: bool,
) -> (f64, MatchType) {
    let name_score = similarity(query, name, case_sensitive);
    let parent_score = PARENT_WEIGHT * similarity(query, parent_name, case_sensitive);
    let path_score = PATH_WEIGHT * similarity(query, relative, case_sensitive);

    if name_score >= parent_score && name_score >= path_score {
        let (q, n) = if case_sensitive {
            (query.to_string(), name.to_string())
        } else {
            (query.to_lowercase(), name.to_lowercase())
        };
        let match_type = if q == n {
            MatchType::Exact
        } else if n.contains(q.as_str()) {
            MatchType::Substring
        } else {
            MatchType::Fuzzy
        };
        (name_score, match_type)
    } else {
        (parent_score.max(path_score), MatchType::Path)
    }
}

struct FuzzyCollector<'a> {
    query: &'a str,
    options: &'a FuzzyOptions,
    /// Collect twice the requested count; truncated after sorting.
    collect_limit: usize,
    scanned: usize,
    results: Vec<FuzzyMatch>,
}

impl FuzzyCollector<'_> {
    fn consider(&mut self, path: &Path, relative: &Path, is_directory: bool) -> bool {
        self.scanned += 1;

        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        let parent_name = path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .unwrap_or("");
        let relative_str = relative.to_string_lossy();

        let (score, match_type) = score_candidate(
            self.query,
            name,
            parent_name,
            &relative_str,
            self.options.case_sensitive,
        );
        if score >= self.options.min_score {
            self.results.push(FuzzyMatch {
                path: path.to_path_buf(),
                relative_path: relative_str.into_owned(),
                score,
                match_type,
                is_directory,
            });
        }

        self.scanned < MAX_SCANNED && self.results.len() < self.collect_limit
    }
}

impl Visitor for FuzzyCollector<'_> {
    fn file(&mut self, path: &Path, relative: &Path, _meta: &Metadata) -> FileDecision {
        if self.consider(path, relative, false) {
            FileDecision::Continue
        } else {
            FileDecision::Stop
        }
    }

    fn dir(&mut self, path: &Path, relative: &Path, _meta: &Metadata) -> DirDecision {
        if self.options.include_directories && !self.consider(path, relative, true) {
            return DirDecision::Stop;
        }
        DirDecision::Descend
    }
}

/// Search `root` for paths similar to `query`, ranked best-first.
pub async fn fuzzy_find(
    root: &Path,
    query: &str,
    options: &FuzzyOptions,
) -> Result<Vec<FuzzyMatch>, FileError> {
    let mut collector = FuzzyCollector {
        query,
        options,
        collect_limit: options.max_results.saturating_mul(2).max(1),
        scanned: 0,
        results: Vec::new(),
    };

    let walk_options = WalkOptions {
        max_depth: options.max_depth,
        include_hidden: false,
        extensions: options.extensions.clone(),
    };
    walk::walk(root, &walk_options, &mut collector).await?;

    let mut results = collector.results;
    // Scores within 0.1 of each other compare equal; then match-type
    // preference; then the shorter relative path wins.
    results.sort_by(|a, b| {
        let bucket_a = (a.score * 10.0).round() as i64;
        let bucket_b = (b.score * 10.0).round() as i64;
        bucket_b
            .cmp(&bucket_a)
            .then_with(|| a.match_type.rank().cmp(&b.match_type.rank()))
            .then_with(|| a.relative_path.len().cmp(&b.relative_path.len()))
    });
    results.truncate(options.max_results);
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn identical_strings_score_one() {
        assert_eq!(similarity("config", "config", false), 1.0);
        assert_eq!(similarity("a", "a", false), 1.0);
    }

    #[test]
    fn substring_scores_by_length_ratio() {
        let score = similarity("abc", "xabcx", false);
        assert!(score >= 0.9 * 3.0 / 5.0 - 1e-9);
        assert!(score < 1.0);
    }

    #[test]
    fn disjoint_strings_score_below_substring() {
        let exact = similarity("abc", "abc", false);
        let substring = similarity("abc", "xabcx", false);
        let disjoint = similarity("abc", "xyzqw", false);
        assert!(disjoint < substring);
        assert!(disjoint < exact);
    }

    #[test]
    fn case_insensitive_by_default() {
        assert_eq!(similarity("README", "readme", false), 1.0);
        assert!(similarity("README", "readme", true) < 1.0);
    }

    #[test]
    fn word_boundary_bonus_applies() {
        // "conf" against "app-config": fuzzy path with a token starting
        // with "con".
        let with_boundary = similarity("confx", "app-config", false);
        let without_boundary = similarity("confx", "appzzzfig", false);
        assert!(with_boundary > without_boundary);
    }

    #[test]
    fn levenshtein_known_distances() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", "abc"), 0);
    }

    #[test]
    fn subsequence_counts_in_order_matches() {
        assert_eq!(subsequence_matches("abc", "a_b_c"), 3);
        assert_eq!(subsequence_matches("abc", "cba"), 1);
        assert_eq!(subsequence_matches("abc", "xyz"), 0);
    }

    #[test]
    fn exact_filename_classified_exact() {
        let (score, match_type) =
            score_candidate("main.rs", "main.rs", "src", "src/main.rs", false);
        assert_eq!(score, 1.0);
        assert_eq!(match_type, MatchType::Exact);
    }

    #[test]
    fn contained_query_classified_substring() {
        let (_, match_type) = score_candidate("main", "main.rs", "src", "src/main.rs", false);
        assert_eq!(match_type, MatchType::Substring);
    }

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src").join("config.rs"), "x").unwrap();
        fs::write(dir.path().join("src").join("main.rs"), "x").unwrap();
        fs::write(dir.path().join("README.md"), "x").unwrap();
        fs::create_dir(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs").join("configuration.md"), "x").unwrap();
        dir
    }

    #[tokio::test]
    async fn finds_exact_name_first() {
        let dir = fixture();
        let results = fuzzy_find(dir.path(), "config.rs", &FuzzyOptions::default())
            .await
            .unwrap();

        assert!(!results.is_empty());
        assert_eq!(results[0].relative_path, "src/config.rs");
        assert_eq!(results[0].match_type, MatchType::Exact);
    }

    #[tokio::test]
    async fn substring_matches_rank_above_loose_fuzzy() {
        let dir = fixture();
        let results = fuzzy_find(dir.path(), "config", &FuzzyOptions::default())
            .await
            .unwrap();

        let names: Vec<&str> = results.iter().map(|r| r.relative_path.as_str()).collect();
        assert!(names.contains(&"src/config.rs"));
        assert!(names.contains(&"docs/configuration.md"));
        // config.rs is the tighter containment, so it ranks first.
        assert_eq!(results[0].relative_path, "src/config.rs");
    }

    #[tokio::test]
    async fn min_score_filters_weak_matches() {
        let dir = fixture();
        let options = FuzzyOptions {
            min_score: 0.95,
            ..Default::default()
        };
        let results = fuzzy_find(dir.path(), "main.rs", &options).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].relative_path, "src/main.rs");
        assert_eq!(results[0].match_type, MatchType::Exact);
    }

    #[tokio::test]
    async fn respects_max_results() {
        let dir = TempDir::new().unwrap();
        for i in 0..30 {
            fs::write(dir.path().join(format!("note{i}.md")), "x").unwrap();
        }
        let options = FuzzyOptions {
            max_results: 5,
            min_score: 0.1,
            ..Default::default()
        };
        let results = fuzzy_find(dir.path(), "note", &options).await.unwrap();
        assert_eq!(results.len(), 5);
    }

    #[tokio::test]
    async fn directories_included_on_request() {
        let dir = fixture();
        let options = FuzzyOptions {
            include_directories: true,
            min_score: 0.2,
            ..Default::default()
        };
        let results = fuzzy_find(dir.path(), "docs", &options).await.unwrap();
        assert!(results.iter().any(|r| r.is_directory));
    }
}
