//! Client-side event collection
//!
//! ```text
//! record_*() ──► sample ──► buffer ──┬─ len >= batch_size ──► deliver() ──► Sink
//!                                    └─ arm timer (batch_timeout) ─┘
//!                       deliver() failure: prepend batch, retry on next trigger,
//!                       dead-letter after max_delivery_attempts
//! ```

mod batcher;
mod config;

pub use batcher::{ErrorEvent, EventCollector, Invocation};
pub use config::{CollectorConfig, ConfigError};
