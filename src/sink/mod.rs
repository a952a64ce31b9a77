//! Delivery destinations for collected records
//!
//! A [`Sink`] receives drained batches from the
//! [`EventCollector`](crate::collector::EventCollector). Only the
//! newline-delimited JSON file sink lives in this crate; console or network
//! sinks implement the same trait elsewhere.

mod file;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::EventRecord;

pub use file::FileSink;

pub type SinkResult<T> = Result<T, SinkError>;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("sink is shut down")]
    Closed,
}

/// A destination for batches of records
///
/// Implementations must not retry internally; a failed `deliver` is retried
/// by the collector.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Persist one batch. An empty batch is a no-op.
    async fn deliver(&self, records: &[EventRecord]) -> SinkResult<()>;

    async fn flush(&self) -> SinkResult<()> {
        Ok(())
    }

    async fn shutdown(&self) -> SinkResult<()> {
        Ok(())
    }
}
