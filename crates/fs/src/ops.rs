//! File operations: read (cached or streamed), write, list, stat.
//!
//! Every unexpected I/O error is wrapped into an operation-tagged
//! [`FileError`]; tool implementations convert that into a structured
//! `{success: false, error}` result instead of letting it escape.

use crate::cache::FileCache;
use chrono::{DateTime, Utc};
use docsmith_core::error::{FileError, FileOp};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::io::AsyncReadExt;
use tracing::{debug, trace};

/// Anything above this is considered binary without looking at content.
const BINARY_SIZE_LIMIT: u64 = 100 * 1024 * 1024;

/// How much of the file head is sampled for null bytes.
const BINARY_SAMPLE_LEN: usize = 1024;

/// Extensions that are always treated as binary.
const BINARY_EXTENSIONS: &[&str] = &[
    // executables and object code
    "exe", "dll", "so", "dylib", "bin", "o", "obj", "a", "lib", "class", "pyc", "wasm",
    // archives
    "zip", "tar", "gz", "bz2", "xz", "7z", "rar", "jar",
    // images
    "jpg", "jpeg", "png", "gif", "bmp", "ico", "webp", "tiff",
    // audio / video
    "mp3", "wav", "flac", "ogg", "mp4", "avi", "mkv", "mov", "webm",
    // fonts
    "ttf", "otf", "woff", "woff2", "eot",
    // office documents
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx",
];

fn system_time_to_utc(time: SystemTime) -> DateTime<Utc> {
    time.into()
}

/// A successful read.
#[derive(Debug, Clone, Serialize)]
pub struct FileContent {
    pub path: PathBuf,
    pub size: u64,
    pub content: String,
    pub modified: DateTime<Utc>,
}

/// The outcome of a write request.
#[derive(Debug, Clone)]
pub enum WriteOutcome {
    Written {
        path: PathBuf,
        size: u64,
        /// false when an existing file was overwritten
        created: bool,
        modified: DateTime<Utc>,
    },
    /// The target exists and overwrite was not requested. A policy
    /// refusal, not an error.
    AlreadyExists { path: PathBuf },
}

/// What kind of filesystem object a path refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
    Other,
}

/// One entry from a directory listing. Stat failures degrade to a partial
/// record with the optional fields unset.
#[derive(Debug, Clone, Serialize)]
pub struct DirEntryInfo {
    pub name: String,
    pub path: PathBuf,
    pub kind: EntryKind,
    pub size: Option<u64>,
    pub modified: Option<DateTime<Utc>>,
}

/// Full metadata for a single path.
#[derive(Debug, Clone, Serialize)]
pub struct FileInfo {
    pub name: String,
    pub extension: Option<String>,
    pub kind: EntryKind,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
    pub created: Option<DateTime<Utc>>,
    /// Unix permission bits, when the platform exposes them.
    pub mode: Option<u32>,
    pub readable: bool,
    /// Files only: heuristic binary classification.
    pub likely_binary: Option<bool>,
    /// Files only: larger than the adaptive streaming threshold.
    pub over_size_limit: Option<bool>,
    /// Directories only: number of immediate children.
    pub child_count: Option<usize>,
}

/// The file access layer: all reads and writes flow through here so the
/// cache stays coherent.
pub struct FileStore {
    cache: Arc<FileCache>,
}

impl FileStore {
    pub fn new(cache: Arc<FileCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<FileCache> {
        &self.cache
    }

    fn resolve(path: &Path) -> PathBuf {
        std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
    }

    /// Read a file as text. Small files are cached; files above the
    /// adaptive threshold are streamed with pressure and runaway guards.
    pub async fn read(&self, path: &Path) -> Result<FileContent, FileError> {
        let resolved = tokio::fs::canonicalize(path)
            .await
            .map_err(|e| FileError::operation(FileOp::Read, path, e.to_string()))?;
        let meta = tokio::fs::metadata(&resolved)
            .await
            .map_err(|e| FileError::operation(FileOp::Read, &resolved, e.to_string()))?;
        if !meta.is_file() {
            return Err(FileError::operation(
                FileOp::Read,
                &resolved,
                "not a regular file",
            ));
        }

        let size = meta.len();
        let modified = meta
            .modified()
            .map(system_time_to_utc)
            .unwrap_or_else(|_| Utc::now());

        if let Some(content) = self.cache.get(&resolved, size, modified).await {
            trace!(path = %resolved.display(), "Cache hit");
            return Ok(FileContent {
                path: resolved,
                size,
                content,
                modified,
            });
        }

        let settings = self.cache.settings().await;
        let content = if size > settings.max_file_size {
            debug!(path = %resolved.display(), size, "Streaming oversized file");
            self.read_streamed(&resolved, settings.chunk_size, settings.max_file_size)
                .await?
        } else {
            let content = tokio::fs::read_to_string(&resolved)
                .await
                .map_err(|e| FileError::operation(FileOp::Read, &resolved, e.to_string()))?;
            self.cache
                .set(&resolved, content.clone(), size, modified)
                .await;
            content
        };

        Ok(FileContent {
            path: resolved,
            size,
            content,
            modified,
        })
    }

    /// Consume a file in fixed-size chunks. Aborts when memory pressure
    /// crosses the adaptive threshold, or when the accumulated size passes
    /// twice the max-file-size threshold (runaway growth guard).
    async fn read_streamed(
        &self,
        path: &Path,
        chunk_size: usize,
        max_file_size: u64,
    ) -> Result<String, FileError> {
        let settings = self.cache.settings().await;
        let mut file = tokio::fs::File::open(path)
            .await
            .map_err(|e| FileError::operation(FileOp::Read, path, e.to_string()))?;

        let mut buf = vec![0u8; chunk_size.max(1)];
        let mut accumulated: Vec<u8> = Vec::new();

        loop {
            let n = file
                .read(&mut buf)
                .await
                .map_err(|e| FileError::operation(FileOp::Read, path, e.to_string()))?;
            if n == 0 {
                break;
            }
            accumulated.extend_from_slice(&buf[..n]);

            if self.cache.pressure() > settings.pressure_threshold {
                return Err(FileError::operation(
                    FileOp::Read,
                    path,
                    "aborted streamed read: memory pressure above threshold",
                ));
            }
            if accumulated.len() as u64 > max_file_size.saturating_mul(2) {
                return Err(FileError::operation(
                    FileOp::Read,
                    path,
                    "aborted streamed read: file exceeded twice the size limit",
                ));
            }
        }

        Ok(String::from_utf8_lossy(&accumulated).into_owned())
    }

    /// Write content to a file. Refuses to clobber an existing file unless
    /// `overwrite` is set; the refusal is a normal outcome, not an error.
    /// Invalidates any cache entry for the path before returning.
    pub async fn write(
        &self,
        path: &Path,
        content: &str,
        overwrite: bool,
    ) -> Result<WriteOutcome, FileError> {
        let resolved = Self::resolve(path);

        let existed = tokio::fs::try_exists(&resolved)
            .await
            .map_err(|e| FileError::operation(FileOp::Write, &resolved, e.to_string()))?;
        if existed && !overwrite {
            return Ok(WriteOutcome::AlreadyExists { path: resolved });
        }

        if let Some(parent) = resolved.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| FileError::operation(FileOp::Write, &resolved, e.to_string()))?;
        }

        tokio::fs::write(&resolved, content)
            .await
            .map_err(|e| FileError::operation(FileOp::Write, &resolved, e.to_string()))?;

        // Invalidate before returning so a subsequent read can never see
        // the stale entry.
        self.cache.remove(&resolved).await;

        let meta = tokio::fs::metadata(&resolved)
            .await
            .map_err(|e| FileError::operation(FileOp::Write, &resolved, e.to_string()))?;
        Ok(WriteOutcome::Written {
            path: resolved,
            size: meta.len(),
            created: !existed,
            modified: meta
                .modified()
                .map(system_time_to_utc)
                .unwrap_or_else(|_| Utc::now()),
        })
    }

    /// List a directory. Entries are stat'ed concurrently; an individual
    /// stat failure produces a partial record rather than failing the
    /// whole listing.
    pub async fn list(
        &self,
        path: &Path,
        include_hidden: bool,
    ) -> Result<Vec<DirEntryInfo>, FileError> {
        let resolved = tokio::fs::canonicalize(path)
            .await
            .map_err(|e| FileError::operation(FileOp::List, path, e.to_string()))?;

        let mut reader = tokio::fs::read_dir(&resolved)
            .await
            .map_err(|e| FileError::operation(FileOp::List, &resolved, e.to_string()))?;

        let mut paths: Vec<(String, PathBuf)> = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| FileError::operation(FileOp::List, &resolved, e.to_string()))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !include_hidden && name.starts_with('.') {
                continue;
            }
            paths.push((name, entry.path()));
        }
        paths.sort_by(|a, b| a.0.cmp(&b.0));

        let stats = futures::future::join_all(
            paths
                .iter()
                .map(|(_, path)| tokio::fs::metadata(path.clone())),
        )
        .await;

        let entries = paths
            .into_iter()
            .zip(stats)
            .map(|((name, path), meta)| match meta {
                Ok(meta) => DirEntryInfo {
                    name,
                    path,
                    kind: kind_of(&meta),
                    size: Some(meta.len()),
                    modified: meta.modified().ok().map(system_time_to_utc),
                },
                Err(_) => DirEntryInfo {
                    name,
                    path,
                    kind: EntryKind::Other,
                    size: None,
                    modified: None,
                },
            })
            .collect();

        Ok(entries)
    }

    /// Full metadata for one path.
    pub async fn info(&self, path: &Path) -> Result<FileInfo, FileError> {
        let resolved = tokio::fs::canonicalize(path)
            .await
            .map_err(|e| FileError::operation(FileOp::Stat, path, e.to_string()))?;
        let meta = tokio::fs::metadata(&resolved)
            .await
            .map_err(|e| FileError::operation(FileOp::Stat, &resolved, e.to_string()))?;

        let kind = kind_of(&meta);
        let name = resolved
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = resolved
            .extension()
            .map(|e| e.to_string_lossy().into_owned());

        let mode = permission_bits(&meta);
        let settings = self.cache.settings().await;

        let (readable, likely_binary, over_size_limit, child_count) = match kind {
            EntryKind::File => {
                let readable = tokio::fs::File::open(&resolved).await.is_ok();
                let binary = is_likely_binary(&resolved, meta.len()).await;
                (
                    readable,
                    Some(binary),
                    Some(meta.len() > settings.max_file_size),
                    None,
                )
            }
            EntryKind::Directory => {
                let mut count = 0usize;
                let readable = match tokio::fs::read_dir(&resolved).await {
                    Ok(mut reader) => {
                        while let Ok(Some(_)) = reader.next_entry().await {
                            count += 1;
                        }
                        true
                    }
                    Err(_) => false,
                };
                (readable, None, None, Some(count))
            }
            EntryKind::Other => (false, None, None, None),
        };

        Ok(FileInfo {
            name,
            extension,
            kind,
            size: meta.len(),
            modified: meta.modified().ok().map(system_time_to_utc),
            created: meta.created().ok().map(system_time_to_utc),
            mode,
            readable,
            likely_binary,
            over_size_limit,
            child_count,
        })
    }
}

fn kind_of(meta: &std::fs::Metadata) -> EntryKind {
    if meta.is_file() {
        EntryKind::File
    } else if meta.is_dir() {
        EntryKind::Directory
    } else {
        EntryKind::Other
    }
}

#[cfg(unix)]
fn permission_bits(meta: &std::fs::Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    Some(meta.permissions().mode() & 0o7777)
}

#[cfg(not(unix))]
fn permission_bits(_meta: &std::fs::Metadata) -> Option<u32> {
    None
}

/// Heuristic binary classification: oversized, denylisted extension, or a
/// null byte in the leading sample. Not a guarantee — used to skip
/// non-text content in search and analysis.
pub async fn is_likely_binary(path: &Path, size: u64) -> bool {
    if size > BINARY_SIZE_LIMIT {
        return true;
    }
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        let ext = ext.to_lowercase();
        if BINARY_EXTENSIONS.contains(&ext.as_str()) {
            return true;
        }
    }

    let Ok(mut file) = tokio::fs::File::open(path).await else {
        return false;
    };
    let mut sample = vec![0u8; BINARY_SAMPLE_LEN];
    let Ok(n) = file.read(&mut sample).await else {
        return false;
    };
    sample[..n].contains(&0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::FixedProbe;
    use std::fs;
    use tempfile::TempDir;

    const GIB: u64 = 1024 * 1024 * 1024;

    fn store() -> (FileStore, Arc<FixedProbe>) {
        let probe = Arc::new(FixedProbe::new(32 * GIB, 28 * GIB));
        let cache = Arc::new(FileCache::new(probe.clone()));
        (FileStore::new(cache), probe)
    }

    #[tokio::test]
    async fn read_returns_content_and_metadata() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hello.txt");
        fs::write(&path, "Hello, docsmith!").unwrap();

        let (store, _) = store();
        let result = store.read(&path).await.unwrap();
        assert_eq!(result.content, "Hello, docsmith!");
        assert_eq!(result.size, 16);
        assert!(result.path.is_absolute());
    }

    #[tokio::test]
    async fn read_missing_file_is_a_read_failure() {
        let (store, _) = store();
        let err = store
            .read(Path::new("/nonexistent/docsmith/file.txt"))
            .await
            .unwrap_err();
        assert_eq!(err.op(), FileOp::Read);
    }

    #[tokio::test]
    async fn second_read_hits_cache() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cached.txt");
        fs::write(&path, "cache me").unwrap();

        let (store, _) = store();
        store.read(&path).await.unwrap();
        assert_eq!(store.cache().len().await, 1);

        let again = store.read(&path).await.unwrap();
        assert_eq!(again.content, "cache me");
    }

    #[tokio::test]
    async fn write_refuses_existing_without_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("existing.txt");
        fs::write(&path, "original").unwrap();
        let mtime_before = fs::metadata(&path).unwrap().modified().unwrap();

        let (store, _) = store();
        let outcome = store.write(&path, "replacement", false).await.unwrap();
        assert!(matches!(outcome, WriteOutcome::AlreadyExists { .. }));

        // Content and mtime are untouched.
        assert_eq!(fs::read_to_string(&path).unwrap(), "original");
        assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), mtime_before);
    }

    #[tokio::test]
    async fn write_with_overwrite_replaces_and_invalidates_cache() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.md");
        fs::write(&path, "v1").unwrap();

        let (store, _) = store();
        store.read(&path).await.unwrap();
        assert_eq!(store.cache().len().await, 1);

        let outcome = store.write(&path, "v2", true).await.unwrap();
        match outcome {
            WriteOutcome::Written { created, size, .. } => {
                assert!(!created);
                assert_eq!(size, 2);
            }
            WriteOutcome::AlreadyExists { .. } => panic!("expected a write"),
        }
        assert_eq!(store.cache().len().await, 0);

        let reread = store.read(&path).await.unwrap();
        assert_eq!(reread.content, "v2");
    }

    #[tokio::test]
    async fn write_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deep").join("file.md");

        let (store, _) = store();
        let outcome = store.write(&path, "content", false).await.unwrap();
        assert!(matches!(outcome, WriteOutcome::Written { created: true, .. }));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn list_skips_hidden_by_default() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("visible.txt"), "v").unwrap();
        fs::write(dir.path().join(".hidden"), "h").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        let (store, _) = store();
        let entries = store.list(dir.path(), false).await.unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["sub", "visible.txt"]);

        let with_hidden = store.list(dir.path(), true).await.unwrap();
        assert_eq!(with_hidden.len(), 3);
    }

    #[tokio::test]
    async fn list_reports_entry_kinds_and_sizes() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("file.txt"), "1234").unwrap();
        fs::create_dir(dir.path().join("subdir")).unwrap();

        let (store, _) = store();
        let entries = store.list(dir.path(), false).await.unwrap();

        let file = entries.iter().find(|e| e.name == "file.txt").unwrap();
        assert_eq!(file.kind, EntryKind::File);
        assert_eq!(file.size, Some(4));
        assert!(file.modified.is_some());

        let sub = entries.iter().find(|e| e.name == "subdir").unwrap();
        assert_eq!(sub.kind, EntryKind::Directory);
    }

    #[tokio::test]
    async fn info_for_file_and_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("main.rs");
        fs::write(&file, "fn main() {}").unwrap();

        let (store, _) = store();

        let file_info = store.info(&file).await.unwrap();
        assert_eq!(file_info.kind, EntryKind::File);
        assert_eq!(file_info.extension.as_deref(), Some("rs"));
        assert_eq!(file_info.likely_binary, Some(false));
        assert_eq!(file_info.over_size_limit, Some(false));
        assert!(file_info.readable);
        assert!(file_info.child_count.is_none());

        let dir_info = store.info(dir.path()).await.unwrap();
        assert_eq!(dir_info.kind, EntryKind::Directory);
        assert_eq!(dir_info.child_count, Some(1));
        assert!(dir_info.likely_binary.is_none());
    }

    #[tokio::test]
    async fn binary_detection_by_extension() {
        let dir = TempDir::new().unwrap();
        // Plain text content, but the extension is denylisted.
        let path = dir.path().join("archive.zip");
        fs::write(&path, "just text").unwrap();
        assert!(is_likely_binary(&path, 9).await);
    }

    #[tokio::test]
    async fn binary_detection_by_null_byte() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.dat");
        fs::write(&path, b"abc\0def").unwrap();
        assert!(is_likely_binary(&path, 7).await);
    }

    #[tokio::test]
    async fn ascii_text_is_not_binary() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "plain ascii text under 1024 bytes").unwrap();
        assert!(!is_likely_binary(&path, 33).await);
    }

    #[tokio::test]
    async fn streamed_read_aborts_under_memory_pressure() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("large.log");

        let probe = Arc::new(FixedProbe::new(2 * GIB, GIB));
        let cache = Arc::new(FileCache::new(probe.clone()));
        let store = FileStore::new(cache);
        let settings = store.cache().settings().await;

        // Bigger than max_file_size so the streamed path is taken.
        let content = "x".repeat((settings.max_file_size + 1) as usize);
        fs::write(&path, &content).unwrap();

        // Saturate memory: the first chunk check trips the guard.
        probe.set_free(0);
        let err = store.read(&path).await.unwrap_err();
        assert_eq!(err.op(), FileOp::Read);
        assert!(err.to_string().contains("memory pressure"));
    }

    #[tokio::test]
    async fn streamed_read_completes_when_memory_allows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("large.log");

        let probe = Arc::new(FixedProbe::new(2 * GIB, 2 * GIB - GIB / 4));
        let cache = Arc::new(FileCache::new(probe));
        let store = FileStore::new(cache);
        let settings = store.cache().settings().await;

        let content = "y".repeat((settings.max_file_size + 1) as usize);
        fs::write(&path, &content).unwrap();

        let result = store.read(&path).await.unwrap();
        assert_eq!(result.content.len(), content.len());
        // Oversized files never enter the cache.
        assert_eq!(store.cache().len().await, 0);
    }
}
