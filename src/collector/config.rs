//! Collector configuration

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("source id must not be empty")]
    EmptySourceId,

    #[error("batch size must be at least 1")]
    InvalidBatchSize,

    #[error("batch timeout must be greater than zero")]
    InvalidBatchTimeout,

    #[error("sampling rate must be within [0, 1], got {0}")]
    InvalidSamplingRate(f64),

    #[error("max delivery attempts must be at least 1")]
    InvalidMaxAttempts,

    #[error("collector must be created inside a tokio runtime")]
    NoRuntime,

    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

/// Configuration for the EventCollector
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Identifier stamped on every record from this process
    pub source_id: String,
    /// Deliver as soon as this many records are buffered
    pub batch_size: usize,
    /// Deliver a partial batch after this delay
    pub batch_timeout: Duration,
    /// Fraction of invocations kept; errors are never sampled
    pub sampling_rate: f64,
    /// Delivery attempts per record before it is dead-lettered
    pub max_delivery_attempts: u32,
    /// Dead-lettered records retained for inspection
    pub dead_letter_capacity: usize,
}

impl CollectorConfig {
    /// Create config with defaults for the given source
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            batch_size: 100,
            batch_timeout: Duration::from_secs(5),
            sampling_rate: 1.0,
            max_delivery_attempts: 3,
            dead_letter_capacity: 1000,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_batch_timeout(mut self, batch_timeout: Duration) -> Self {
        self.batch_timeout = batch_timeout;
        self
    }

    pub fn with_sampling_rate(mut self, sampling_rate: f64) -> Self {
        self.sampling_rate = sampling_rate;
        self
    }

    pub fn with_max_delivery_attempts(mut self, attempts: u32) -> Self {
        self.max_delivery_attempts = attempts;
        self
    }

    pub fn with_dead_letter_capacity(mut self, capacity: usize) -> Self {
        self.dead_letter_capacity = capacity;
        self
    }

    /// Reject values that cannot be honored
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source_id.trim().is_empty() {
            return Err(ConfigError::EmptySourceId);
        }
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize);
        }
        if self.batch_timeout.is_zero() {
            return Err(ConfigError::InvalidBatchTimeout);
        }
        if !(0.0..=1.0).contains(&self.sampling_rate) {
            // NaN fails the range check too
            return Err(ConfigError::InvalidSamplingRate(self.sampling_rate));
        }
        if self.max_delivery_attempts == 0 {
            return Err(ConfigError::InvalidMaxAttempts);
        }
        Ok(())
    }
}
