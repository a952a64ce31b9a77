//! Cached loader for the telemetry log
//!
//! Reads the whole log into memory and serves that snapshot until either the
//! staleness bound elapses or the file changes on disk. File changes are
//! detected by modification time and length; an append always changes the
//! length even when the filesystem's mtime granularity hides it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use parking_lot::Mutex;
use thiserror::Error;

use crate::types::EventRecord;

/// Default staleness bound for a cached snapshot
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Outcome of the most recent full read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub records: usize,
    pub skipped_lines: usize,
}

/// Identity of the file contents at capture time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: Option<SystemTime>,
    len: u64,
}

struct CacheEntry {
    records: Arc<[EventRecord]>,
    captured_at: Instant,
    stamp: FileStamp,
}

/// Bounded-staleness, read-only view of a log file
pub struct CachedLoader {
    path: PathBuf,
    ttl: Duration,
    cache: Mutex<Option<CacheEntry>>,
    last_report: Mutex<LoadReport>,
}

impl CachedLoader {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self::with_ttl(path, DEFAULT_CACHE_TTL)
    }

    pub fn with_ttl<P: AsRef<Path>>(path: P, ttl: Duration) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            ttl,
            cache: Mutex::new(None),
            last_report: Mutex::new(LoadReport::default()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Counts from the last full read
    pub fn last_report(&self) -> LoadReport {
        *self.last_report.lock()
    }

    /// Drop the cached snapshot; the next load re-reads the file
    pub fn invalidate(&self) {
        self.cache.lock().take();
    }

    /// Current snapshot of the log
    ///
    /// A missing file is an empty log. Each call returns one immutable
    /// snapshot, so a caller never sees a mix of old and new records.
    pub fn load(&self) -> Result<Arc<[EventRecord]>, LoadError> {
        let stamp = match self.stat()? {
            Some(stamp) => stamp,
            None => {
                tracing::debug!(path = %self.path.display(), "log file absent, returning empty set");
                self.invalidate();
                *self.last_report.lock() = LoadReport::default();
                return Ok(Arc::from(Vec::new()));
            }
        };

        let mut cache = self.cache.lock();
        if let Some(entry) = cache.as_ref() {
            if entry.captured_at.elapsed() < self.ttl && entry.stamp == stamp {
                tracing::trace!(records = entry.records.len(), "log cache hit");
                return Ok(Arc::clone(&entry.records));
            }
        }

        let (records, report) = self.read_all()?;
        tracing::debug!(
            path = %self.path.display(),
            records = report.records,
            skipped = report.skipped_lines,
            "reloaded log"
        );

        let records: Arc<[EventRecord]> = Arc::from(records);
        *cache = Some(CacheEntry {
            records: Arc::clone(&records),
            captured_at: Instant::now(),
            stamp,
        });
        *self.last_report.lock() = report;

        Ok(records)
    }

    fn stat(&self) -> Result<Option<FileStamp>, LoadError> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(Some(FileStamp {
                modified: meta.modified().ok(),
                len: meta.len(),
            })),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(LoadError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn read_all(&self) -> Result<(Vec<EventRecord>, LoadReport), LoadError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            // Removed between stat and read
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok((Vec::new(), LoadReport::default()))
            }
            Err(source) => {
                return Err(LoadError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        // A torn trailing write may leave invalid UTF-8; it only spoils that line
        let content = String::from_utf8_lossy(&bytes);
        Ok(parse_lines(&content))
    }
}

/// Parse each non-empty line independently, skipping the ones that fail
pub fn parse_lines(content: &str) -> (Vec<EventRecord>, LoadReport) {
    let mut records = Vec::new();
    let mut skipped_lines = 0;

    for (line_num, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match EventRecord::from_json_line(line) {
            Ok(record) => records.push(record),
            Err(e) => {
                skipped_lines += 1;
                tracing::warn!(line = line_num + 1, error = %e, "skipping unparseable log line");
            }
        }
    }

    let report = LoadReport {
        records: records.len(),
        skipped_lines,
    };
    (records, report)
}
