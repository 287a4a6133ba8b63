//! # docsmith File Access Layer
//!
//! The adaptive filesystem substrate the tools are built on:
//!
//! - a size- and TTL-bounded content cache, self-tuning to host memory
//!   pressure ([`cache::FileCache`], [`adaptive::AdaptiveController`]);
//! - read/write/list/stat operations with structured failure semantics
//!   ([`ops::FileStore`]);
//! - a shared traversal primitive with a visitor contract ([`walk`]);
//! - similarity-scored, wildcard, and content search ([`fuzzy`], [`search`]);
//! - project structure analysis ([`analyze`]).
//!
//! Memory readings come from an injectable [`probe::ResourceProbe`], so
//! pressure-dependent behavior is deterministic under test.

pub mod adaptive;
pub mod analyze;
pub mod cache;
pub mod fuzzy;
pub mod ops;
pub mod probe;
pub mod search;
pub mod walk;

pub use adaptive::{AdaptiveController, AdaptiveSettings};
pub use analyze::{ProjectAnalysis, analyze_project};
pub use cache::{FileCache, MaintenanceHandle};
pub use fuzzy::{FuzzyMatch, FuzzyOptions, MatchType, fuzzy_find, similarity};
pub use ops::{
    DirEntryInfo, EntryKind, FileContent, FileInfo, FileStore, WriteOutcome, is_likely_binary,
};
pub use probe::{FixedProbe, ResourceProbe, SysinfoProbe};
pub use search::{
    ContentMatch, ContentOptions, FileContentMatches, PatternMatch, PatternOptions,
    PatternSearchOutcome, content_search, pattern_search,
};
pub use walk::{DirDecision, FileDecision, Visitor, WalkOptions, walk as walk_dir};
