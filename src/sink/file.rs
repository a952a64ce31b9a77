//! Newline-delimited JSON file sink

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use super::{Sink, SinkError, SinkResult};
use crate::types::EventRecord;

/// Appends each batch to a log file, one JSON record per line
pub struct FileSink {
    path: PathBuf,
    dir_ready: AtomicBool,
    closed: AtomicBool,
}

impl FileSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            dir_ready: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    /// Serialize a batch as `\n`-joined lines with a trailing newline
    pub fn encode_batch(records: &[EventRecord]) -> Result<String, serde_json::Error> {
        let mut buf = String::new();
        for record in records {
            buf.push_str(&record.to_json_line()?);
            buf.push('\n');
        }
        Ok(buf)
    }

    async fn ensure_parent_dir(&self) -> SinkResult<()> {
        if self.dir_ready.load(Ordering::Acquire) {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                // create_dir_all treats an existing directory as success
                fs::create_dir_all(parent).await?;
            }
        }
        self.dir_ready.store(true, Ordering::Release);
        Ok(())
    }
}

#[async_trait]
impl Sink for FileSink {
    async fn deliver(&self, records: &[EventRecord]) -> SinkResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(SinkError::Closed);
        }
        if records.is_empty() {
            return Ok(());
        }

        // Serialize everything before touching the filesystem
        let payload = Self::encode_batch(records)?;

        self.ensure_parent_dir().await?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        // One append per batch
        file.write_all(payload.as_bytes()).await?;
        file.flush().await?;

        tracing::debug!(
            path = %self.path.display(),
            records = records.len(),
            bytes = payload.len(),
            "appended batch"
        );
        Ok(())
    }

    async fn shutdown(&self) -> SinkResult<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
