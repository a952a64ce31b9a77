//! Event collector: sampling, batching and delivery with bounded retry

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Map, Value};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::config::{CollectorConfig, ConfigError};
use crate::sink::{Sink, SinkResult};
use crate::types::{ErrorRecord, EventRecord, InvocationRecord, SUBJECT_METADATA_KEY};
use crate::utils::{current_timestamp_ms, format_timestamp_ms};

/// An invocation to record; identity and timestamp are assigned on record
#[derive(Debug, Clone)]
pub struct Invocation {
    pub subject_name: String,
    pub parameters: Value,
    pub duration: Option<f64>,
    pub success: bool,
    pub failure_detail: Option<String>,
    pub metadata: Option<Map<String, Value>>,
}

impl Invocation {
    /// A successful invocation of `subject_name`
    pub fn new(subject_name: impl Into<String>, parameters: Value) -> Self {
        Self {
            subject_name: subject_name.into(),
            parameters,
            duration: None,
            success: true,
            failure_detail: None,
            metadata: None,
        }
    }

    pub fn with_duration(mut self, duration_ms: f64) -> Self {
        self.duration = Some(duration_ms);
        self
    }

    /// Mark the invocation as failed
    pub fn failed(mut self, detail: impl Into<String>) -> Self {
        self.success = false;
        self.failure_detail = Some(detail.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// An error to record; never sampled
#[derive(Debug, Clone)]
pub struct ErrorEvent {
    pub error_category: String,
    pub message: String,
    pub stack: Option<String>,
    pub metadata: Option<Map<String, Value>>,
}

impl ErrorEvent {
    pub fn new(error_category: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_category: error_category.into(),
            message: message.into(),
            stack: None,
            metadata: None,
        }
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Attach the tool that produced the error
    pub fn with_subject(mut self, subject_name: impl Into<String>) -> Self {
        self.metadata
            .get_or_insert_with(Map::new)
            .insert(SUBJECT_METADATA_KEY.to_string(), Value::String(subject_name.into()));
        self
    }
}

struct Pending {
    record: EventRecord,
    attempts: u32,
}

struct ArmedTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

struct Inner {
    config: CollectorConfig,
    sink: Arc<dyn Sink>,
    buffer: Mutex<Vec<Pending>>,
    timer: Mutex<Option<ArmedTimer>>,
    timer_generation: AtomicU64,
    /// Set while a failed batch waits in the buffer; only the timer retries it
    retry_pending: AtomicBool,
    /// Held for the duration of a delivery; at most one in flight
    delivery: tokio::sync::Mutex<()>,
    rng: Mutex<StdRng>,
    dead_letters: Mutex<VecDeque<EventRecord>>,
    closed: AtomicBool,
    runtime: Handle,
}

/// Buffers records and hands them to a [`Sink`] in batches
///
/// `record_*` never blocks on I/O: deliveries run as tasks on the runtime
/// the collector was created in. Cloning yields another handle to the same
/// buffer.
#[derive(Clone)]
pub struct EventCollector {
    inner: Arc<Inner>,
}

impl EventCollector {
    /// Create a collector with an entropy-seeded sampler
    pub fn new(config: CollectorConfig, sink: Arc<dyn Sink>) -> Result<Self, ConfigError> {
        Self::with_rng(config, sink, StdRng::from_entropy())
    }

    /// Create a collector with an explicit random source
    pub fn with_rng(
        config: CollectorConfig,
        sink: Arc<dyn Sink>,
        rng: StdRng,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| ConfigError::NoRuntime)?;

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                sink,
                buffer: Mutex::new(Vec::new()),
                timer: Mutex::new(None),
                timer_generation: AtomicU64::new(0),
                retry_pending: AtomicBool::new(false),
                delivery: tokio::sync::Mutex::new(()),
                rng: Mutex::new(rng),
                dead_letters: Mutex::new(VecDeque::new()),
                closed: AtomicBool::new(false),
                runtime,
            }),
        })
    }

    /// Record an invocation, subject to sampling
    pub fn record_invocation(&self, invocation: Invocation) {
        if self.inner.is_closed() {
            return;
        }

        let keep = {
            let mut rng = self.inner.rng.lock();
            rng.gen::<f64>() < self.inner.config.sampling_rate
        };
        if !keep {
            return;
        }

        let record = InvocationRecord {
            id: Uuid::new_v4().to_string(),
            timestamp: current_timestamp_ms(),
            source_id: self.inner.config.source_id.clone(),
            subject_name: invocation.subject_name,
            parameters: invocation.parameters,
            duration: invocation.duration,
            success: invocation.success,
            failure_detail: invocation.failure_detail,
            metadata: invocation.metadata,
        };
        self.inner.enqueue(record.into());
    }

    /// Record an error
    pub fn record_error(&self, error: ErrorEvent) {
        if self.inner.is_closed() {
            return;
        }

        let record = ErrorRecord {
            id: Uuid::new_v4().to_string(),
            timestamp: current_timestamp_ms(),
            source_id: self.inner.config.source_id.clone(),
            error_category: error.error_category,
            message: error.message,
            stack: error.stack,
            metadata: error.metadata,
        };
        self.inner.enqueue(record.into());
    }

    /// Deliver whatever is buffered now and flush the sink
    ///
    /// Returns the number of records delivered.
    pub async fn flush(&self) -> SinkResult<usize> {
        let delivered = self.inner.deliver().await?;
        self.inner.sink.flush().await?;
        Ok(delivered)
    }

    /// Deliver the remaining buffer, then shut the sink down
    ///
    /// Records passed to `record_*` afterwards are discarded.
    pub async fn shutdown(&self) -> SinkResult<()> {
        self.inner.closed.store(true, Ordering::Release);
        let delivered = self.inner.deliver().await;
        self.inner.sink.shutdown().await?;
        tracing::debug!(source = %self.inner.config.source_id, "collector shut down");
        delivered.map(|_| ())
    }

    /// Records waiting for delivery
    pub fn buffered_len(&self) -> usize {
        self.inner.buffer.lock().len()
    }

    /// Records that exhausted their delivery attempts, oldest first
    pub fn dead_letters(&self) -> Vec<EventRecord> {
        self.inner.dead_letters.lock().iter().cloned().collect()
    }
}

impl Inner {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn enqueue(self: &Arc<Self>, record: EventRecord) {
        let len = {
            let mut buffer = self.buffer.lock();
            buffer.push(Pending {
                record,
                attempts: 0,
            });
            buffer.len()
        };

        if len >= self.config.batch_size && !self.retry_pending.load(Ordering::Acquire) {
            self.spawn_delivery();
        } else {
            self.arm_timer();
        }
    }

    fn spawn_delivery(self: &Arc<Self>) {
        let inner = Arc::clone(self);
        self.runtime.spawn(async move {
            if let Err(e) = inner.deliver().await {
                tracing::warn!(error = %e, "batch delivery failed");
            }
        });
    }

    /// Arm the delayed delivery unless one is already pending
    fn arm_timer(self: &Arc<Self>) {
        let mut slot = self.timer.lock();
        if slot.is_some() {
            return;
        }

        let generation = self.timer_generation.fetch_add(1, Ordering::Relaxed);
        let inner = Arc::clone(self);
        let delay = self.config.batch_timeout;

        let handle = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            {
                // Disarm before delivering so deliver() cannot abort this task
                let mut slot = inner.timer.lock();
                if slot.as_ref().map(|t| t.generation) != Some(generation) {
                    // Superseded; whoever took the slot drains the buffer
                    return;
                }
                slot.take();
            }
            if let Err(e) = inner.deliver().await {
                tracing::warn!(error = %e, "timed batch delivery failed");
            }
        });

        *slot = Some(ArmedTimer { generation, handle });
    }

    fn cancel_timer(&self) {
        if let Some(timer) = self.timer.lock().take() {
            timer.handle.abort();
        }
    }

    /// Swap out the buffer and hand it to the sink
    async fn deliver(self: &Arc<Self>) -> SinkResult<usize> {
        let _in_flight = self.delivery.lock().await;
        self.cancel_timer();

        let batch = std::mem::take(&mut *self.buffer.lock());
        if batch.is_empty() {
            return Ok(0);
        }

        let (records, attempts): (Vec<EventRecord>, Vec<u32>) =
            batch.into_iter().map(|p| (p.record, p.attempts)).unzip();

        match self.sink.deliver(&records).await {
            Ok(()) => {
                self.retry_pending.store(false, Ordering::Release);
                tracing::debug!(records = records.len(), "delivered batch");
                Ok(records.len())
            }
            Err(e) => {
                tracing::warn!(records = records.len(), error = %e, "sink rejected batch");
                self.requeue(records, attempts);
                Err(e)
            }
        }
    }

    /// Put a failed batch back in front of newer records
    ///
    /// Records out of attempts move to the dead-letter queue instead. Until
    /// a delivery succeeds, retries wait for the timer rather than the batch
    /// size, so attempts are at least `batch_timeout` apart.
    fn requeue(self: &Arc<Self>, records: Vec<EventRecord>, attempts: Vec<u32>) {
        let max_attempts = self.config.max_delivery_attempts;
        let mut retry = Vec::with_capacity(records.len());
        let mut dead_lettered = 0usize;

        {
            let mut dead = self.dead_letters.lock();
            for (record, attempts) in records.into_iter().zip(attempts) {
                let attempts = attempts + 1;
                if attempts >= max_attempts {
                    tracing::debug!(
                        id = record.id(),
                        recorded_at = %format_timestamp_ms(record.timestamp()),
                        "dead-lettering record"
                    );
                    dead.push_back(record);
                    while dead.len() > self.config.dead_letter_capacity {
                        dead.pop_front();
                    }
                    dead_lettered += 1;
                } else {
                    retry.push(Pending { record, attempts });
                }
            }
        }

        if dead_lettered > 0 {
            tracing::warn!(
                records = dead_lettered,
                max_attempts,
                "records exhausted delivery attempts and were dead-lettered"
            );
        }

        self.retry_pending
            .store(!retry.is_empty(), Ordering::Release);
        if retry.is_empty() {
            return;
        }

        {
            let mut buffer = self.buffer.lock();
            let newer = std::mem::replace(&mut *buffer, retry);
            buffer.extend(newer);
        }
        self.arm_timer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::SinkError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// Sink that records batches and can be told to fail
    #[derive(Default)]
    struct RecordingSink {
        batches: Mutex<Vec<Vec<EventRecord>>>,
        calls: AtomicUsize,
        failures_remaining: AtomicUsize,
        always_fail: AtomicBool,
        shut_down: AtomicBool,
    }

    impl RecordingSink {
        fn failing_times(n: usize) -> Self {
            let sink = Self::default();
            sink.failures_remaining.store(n, Ordering::SeqCst);
            sink
        }

        fn always_failing() -> Self {
            let sink = Self::default();
            sink.always_fail.store(true, Ordering::SeqCst);
            sink
        }

        fn batches(&self) -> Vec<Vec<EventRecord>> {
            self.batches.lock().clone()
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Sink for RecordingSink {
        async fn deliver(&self, records: &[EventRecord]) -> SinkResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.always_fail.load(Ordering::SeqCst) {
                return Err(SinkError::Io(std::io::Error::other("disk full")));
            }
            let remaining = self.failures_remaining.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures_remaining.store(remaining - 1, Ordering::SeqCst);
                return Err(SinkError::Io(std::io::Error::other("disk full")));
            }
            self.batches.lock().push(records.to_vec());
            Ok(())
        }

        async fn shutdown(&self) -> SinkResult<()> {
            self.shut_down.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    async fn wait_for<F: Fn() -> bool>(condition: F) -> bool {
        for _ in 0..300 {
            if condition() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        condition()
    }

    fn quiet_config() -> CollectorConfig {
        // Large batch and long timeout: nothing is delivered on its own
        CollectorConfig::new("src_test")
            .with_batch_size(100_000)
            .with_batch_timeout(Duration::from_secs(600))
    }

    fn collector(config: CollectorConfig, sink: Arc<RecordingSink>) -> EventCollector {
        EventCollector::with_rng(config, sink, StdRng::seed_from_u64(7)).unwrap()
    }

    fn subject(record: &EventRecord) -> &str {
        &record.as_invocation().unwrap().subject_name
    }

    #[tokio::test]
    async fn test_sampling_rate_zero_keeps_nothing() {
        let sink = Arc::new(RecordingSink::default());
        let collector = collector(quiet_config().with_sampling_rate(0.0), sink);

        for _ in 0..1000 {
            collector.record_invocation(Invocation::new("search", json!({})));
        }
        assert_eq!(collector.buffered_len(), 0);
    }

    #[tokio::test]
    async fn test_sampling_rate_one_keeps_everything() {
        let sink = Arc::new(RecordingSink::default());
        let collector = collector(quiet_config().with_sampling_rate(1.0), sink);

        for _ in 0..1000 {
            collector.record_invocation(Invocation::new("search", json!({})));
        }
        assert_eq!(collector.buffered_len(), 1000);
    }

    #[tokio::test]
    async fn test_sampling_fraction_converges() {
        let sink = Arc::new(RecordingSink::default());
        let collector = collector(quiet_config().with_sampling_rate(0.3), sink);

        let n = 20_000;
        for _ in 0..n {
            collector.record_invocation(Invocation::new("search", json!({})));
        }
        let fraction = collector.buffered_len() as f64 / n as f64;
        assert!((fraction - 0.3).abs() < 0.02, "fraction was {}", fraction);
    }

    #[tokio::test]
    async fn test_errors_are_never_sampled() {
        let sink = Arc::new(RecordingSink::default());
        let collector = collector(quiet_config().with_sampling_rate(0.0), sink);

        for i in 0..5 {
            collector.record_error(ErrorEvent::new("Io", format!("failure {}", i)));
        }
        assert_eq!(collector.buffered_len(), 5);
    }

    #[tokio::test]
    async fn test_assigns_identity_and_source() {
        let sink = Arc::new(RecordingSink::default());
        let collector = collector(quiet_config(), sink.clone());

        collector.record_invocation(
            Invocation::new("search", json!({"q": "x"}))
                .with_duration(12.0)
                .failed("bad query"),
        );
        collector.record_error(ErrorEvent::new("Timeout", "slow").with_subject("search"));
        collector.flush().await.unwrap();

        let batch = &sink.batches()[0];
        let inv = batch[0].as_invocation().unwrap();
        assert_eq!(inv.source_id, "src_test");
        assert!(!inv.id.is_empty());
        assert!(inv.timestamp > 0);
        assert!(!inv.success);
        assert_eq!(inv.failure_detail.as_deref(), Some("bad query"));

        let err = batch[1].as_error().unwrap();
        assert_ne!(err.id, inv.id);
        assert_eq!(err.subject_name(), "search");
    }

    #[tokio::test]
    async fn test_batch_size_triggers_delivery_without_timeout() {
        let sink = Arc::new(RecordingSink::default());
        let collector = collector(quiet_config().with_batch_size(3), sink.clone());

        for name in ["a", "b", "c"] {
            collector.record_invocation(Invocation::new(name, json!({})));
        }

        assert!(wait_for(|| sink.batches().len() == 1).await);
        assert_eq!(sink.batches()[0].len(), 3);
        assert_eq!(collector.buffered_len(), 0);
    }

    #[tokio::test]
    async fn test_timeout_delivers_partial_batch() {
        let sink = Arc::new(RecordingSink::default());
        let config = CollectorConfig::new("src_test")
            .with_batch_size(100)
            .with_batch_timeout(Duration::from_millis(30));
        let collector = collector(config, sink.clone());

        collector.record_invocation(Invocation::new("a", json!({})));
        collector.record_invocation(Invocation::new("b", json!({})));

        assert!(wait_for(|| sink.batches().len() == 1).await);
        assert_eq!(sink.batches()[0].len(), 2);
    }

    #[tokio::test]
    async fn test_failed_batch_is_prepended() {
        let sink = Arc::new(RecordingSink::failing_times(1));
        let collector = collector(quiet_config().with_batch_size(2), sink.clone());

        collector.record_invocation(Invocation::new("a", json!({})));
        collector.record_invocation(Invocation::new("b", json!({})));
        assert!(wait_for(|| sink.calls() == 1 && collector.buffered_len() == 2).await);

        collector.record_invocation(Invocation::new("c", json!({})));
        assert_eq!(collector.flush().await.unwrap(), 3);

        let batches = sink.batches();
        let names: Vec<&str> = batches[0].iter().map(subject).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_exhausted_records_are_dead_lettered() {
        let sink = Arc::new(RecordingSink::always_failing());
        let config = CollectorConfig::new("src_test")
            .with_batch_size(1)
            .with_batch_timeout(Duration::from_millis(20))
            .with_max_delivery_attempts(2);
        let collector = collector(config, sink.clone());

        collector.record_invocation(Invocation::new("a", json!({})));

        assert!(wait_for(|| collector.dead_letters().len() == 1).await);
        assert_eq!(collector.buffered_len(), 0);
        assert_eq!(sink.calls(), 2);
        assert_eq!(subject(&collector.dead_letters()[0]), "a");
    }

    #[tokio::test]
    async fn test_outage_retries_wait_for_timer() {
        let sink = Arc::new(RecordingSink::always_failing());
        let config = CollectorConfig::new("src_test")
            .with_batch_size(10)
            .with_batch_timeout(Duration::from_millis(300));
        let collector = collector(config, sink.clone());

        for i in 0..10 {
            collector.record_invocation(Invocation::new(format!("first-{}", i), json!({})));
        }
        assert!(wait_for(|| sink.calls() == 1 && collector.buffered_len() == 10).await);

        // Buffer is over batch size, but the requeued batch must not be retried per record
        for i in 0..20 {
            collector.record_invocation(Invocation::new(format!("more-{}", i), json!({})));
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        assert_eq!(sink.calls(), 1);
        assert!(collector.dead_letters().is_empty());

        sink.always_fail.store(false, Ordering::SeqCst);
        assert!(wait_for(|| sink.batches().iter().map(Vec::len).sum::<usize>() == 30).await);
        assert!(collector.dead_letters().is_empty());
        assert_eq!(subject(&sink.batches()[0][0]), "first-0");

        // Size triggers resume once delivery succeeds
        for i in 0..10 {
            collector.record_invocation(Invocation::new(format!("after-{}", i), json!({})));
        }
        assert!(wait_for(|| sink.batches().len() == 2).await);
        assert_eq!(sink.batches()[1].len(), 10);
    }

    #[tokio::test]
    async fn test_flush_supersedes_armed_timer() {
        let sink = Arc::new(RecordingSink::default());
        let config = CollectorConfig::new("src_test")
            .with_batch_size(100)
            .with_batch_timeout(Duration::from_millis(40));
        let collector = collector(config, sink.clone());

        collector.record_invocation(Invocation::new("a", json!({})));
        assert_eq!(collector.flush().await.unwrap(), 1);

        collector.record_invocation(Invocation::new("b", json!({})));
        assert!(wait_for(|| sink.batches().len() == 2).await);

        tokio::time::sleep(Duration::from_millis(80)).await;
        let batches = sink.batches();
        assert_eq!(batches.len(), 2);
        assert_eq!(subject(&batches[0][0]), "a");
        assert_eq!(subject(&batches[1][0]), "b");
        assert_eq!(collector.buffered_len(), 0);
    }

    #[tokio::test]
    async fn test_flush_reports_failure_and_keeps_records() {
        let sink = Arc::new(RecordingSink::failing_times(1));
        let collector = collector(quiet_config(), sink.clone());

        collector.record_invocation(Invocation::new("a", json!({})));
        assert!(collector.flush().await.is_err());
        assert_eq!(collector.buffered_len(), 1);

        assert_eq!(collector.flush().await.unwrap(), 1);
        assert_eq!(collector.buffered_len(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_delivers_remainder_and_closes_sink() {
        let sink = Arc::new(RecordingSink::default());
        let collector = collector(quiet_config(), sink.clone());

        collector.record_invocation(Invocation::new("a", json!({})));
        collector.record_error(ErrorEvent::new("Io", "disk"));
        collector.shutdown().await.unwrap();

        assert_eq!(sink.batches().len(), 1);
        assert_eq!(sink.batches()[0].len(), 2);
        assert!(sink.shut_down.load(Ordering::SeqCst));

        collector.record_invocation(Invocation::new("late", json!({})));
        assert_eq!(collector.buffered_len(), 0);
    }

    #[test]
    fn test_requires_runtime() {
        let sink: Arc<dyn Sink> = Arc::new(RecordingSink::default());
        let result = EventCollector::new(CollectorConfig::new("s"), sink);
        assert!(matches!(result, Err(ConfigError::NoRuntime)));
    }

    #[tokio::test]
    async fn test_rejects_invalid_config() {
        let sink: Arc<dyn Sink> = Arc::new(RecordingSink::default());
        let result = EventCollector::new(CollectorConfig::new("s").with_sampling_rate(2.0), sink);
        assert!(matches!(result, Err(ConfigError::InvalidSamplingRate(_))));
    }
}
