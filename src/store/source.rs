//! Query sources: the consumer-side contract and its file-backed implementation

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::analytics::QueryEngine;
use crate::types::{
    AggregatedInsights, CostEstimate, ErrorLogEntry, InsightsView, MetricsView, QueryError,
    QueryResult, Selector, SubjectStats, TimeWindow,
};
use crate::utils::current_timestamp_ms;

use super::loader::{CachedLoader, LoadReport, DEFAULT_CACHE_TTL};

pub type QueryOutcome<T> = Result<T, QueryError>;

/// Analytical queries over recorded events
///
/// Each call either returns a complete view or fails; implementations never
/// return partially computed results.
pub trait QuerySource: Send + Sync {
    fn metrics(&self, selector: &Selector, window: TimeWindow)
        -> QueryOutcome<QueryResult<MetricsView>>;

    fn subject_stats(
        &self,
        selector: &Selector,
        subject_name: &str,
        window: TimeWindow,
    ) -> QueryOutcome<QueryResult<SubjectStats>>;

    fn error_log(
        &self,
        selector: &Selector,
        limit: usize,
    ) -> QueryOutcome<QueryResult<Vec<ErrorLogEntry>>>;

    fn cost_estimate(
        &self,
        selector: &Selector,
        window: TimeWindow,
    ) -> QueryOutcome<QueryResult<CostEstimate>>;

    fn insights(
        &self,
        selector: &Selector,
        window: TimeWindow,
    ) -> QueryOutcome<QueryResult<InsightsView, AggregatedInsights>>;

    /// Release resources; later queries may fail
    fn shutdown(&self) -> QueryOutcome<()> {
        Ok(())
    }
}

/// Configuration for the file-backed query source
#[derive(Debug, Clone)]
pub struct FileSourceConfig {
    pub log_path: PathBuf,
    pub cache_ttl: Duration,
    pub cost_per_call: f64,
}

impl FileSourceConfig {
    pub fn new<P: AsRef<Path>>(log_path: P) -> Self {
        Self {
            log_path: log_path.as_ref().to_path_buf(),
            cache_ttl: DEFAULT_CACHE_TTL,
            cost_per_call: crate::analytics::DEFAULT_COST_PER_CALL,
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_cost_per_call(mut self, cost_per_call: f64) -> Self {
        self.cost_per_call = cost_per_call;
        self
    }
}

/// Answers queries from an NDJSON log through a [`CachedLoader`]
pub struct FileQuerySource {
    loader: CachedLoader,
    engine: QueryEngine,
}

impl FileQuerySource {
    pub fn new<P: AsRef<Path>>(log_path: P) -> Self {
        Self::with_config(FileSourceConfig::new(log_path))
    }

    pub fn with_config(config: FileSourceConfig) -> Self {
        Self {
            loader: CachedLoader::with_ttl(&config.log_path, config.cache_ttl),
            engine: QueryEngine::new(config.cost_per_call),
        }
    }

    pub fn log_path(&self) -> &Path {
        self.loader.path()
    }

    /// Counts from the loader's last full read
    pub fn last_load_report(&self) -> LoadReport {
        self.loader.last_report()
    }
}

impl QuerySource for FileQuerySource {
    fn metrics(
        &self,
        selector: &Selector,
        window: TimeWindow,
    ) -> QueryOutcome<QueryResult<MetricsView>> {
        let records = self.loader.load()?;
        Ok(self
            .engine
            .metrics(&records, selector, window, current_timestamp_ms()))
    }

    fn subject_stats(
        &self,
        selector: &Selector,
        subject_name: &str,
        window: TimeWindow,
    ) -> QueryOutcome<QueryResult<SubjectStats>> {
        if subject_name.trim().is_empty() {
            return Err(QueryError::MissingArgument("toolName"));
        }
        let records = self.loader.load()?;
        Ok(self.engine.subject_stats(
            &records,
            selector,
            subject_name,
            window,
            current_timestamp_ms(),
        ))
    }

    fn error_log(
        &self,
        selector: &Selector,
        limit: usize,
    ) -> QueryOutcome<QueryResult<Vec<ErrorLogEntry>>> {
        let records = self.loader.load()?;
        Ok(self.engine.error_log(&records, selector, limit))
    }

    fn cost_estimate(
        &self,
        selector: &Selector,
        window: TimeWindow,
    ) -> QueryOutcome<QueryResult<CostEstimate>> {
        let records = self.loader.load()?;
        Ok(self
            .engine
            .cost_estimate(&records, selector, window, current_timestamp_ms()))
    }

    fn insights(
        &self,
        selector: &Selector,
        window: TimeWindow,
    ) -> QueryOutcome<QueryResult<InsightsView, AggregatedInsights>> {
        let records = self.loader.load()?;
        Ok(self
            .engine
            .insights(&records, selector, window, current_timestamp_ms()))
    }

    fn shutdown(&self) -> QueryOutcome<()> {
        self.loader.invalidate();
        Ok(())
    }
}
