//! Environment-driven configuration for the analytics server binary
//!
//! | variable | default |
//! |---|---|
//! | `ANALYTICS_LOG_PATH` | `./data/events.jsonl` |
//! | `ANALYTICS_SOURCE_ID` | `analytics-server` |
//! | `ANALYTICS_BATCH_SIZE` | 100 |
//! | `ANALYTICS_BATCH_TIMEOUT_MS` | 5000 |
//! | `ANALYTICS_SAMPLING_RATE` | 1.0 |
//! | `ANALYTICS_CACHE_TTL_MS` | 5000 |
//! | `ANALYTICS_COST_PER_CALL` | 0.0001 |
//! | `ANALYTICS_INSTRUMENT` | true |

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::analytics::DEFAULT_COST_PER_CALL;
use crate::collector::{CollectorConfig, ConfigError};
use crate::store::{FileSourceConfig, DEFAULT_CACHE_TTL};

pub const LOG_PATH_VAR: &str = "ANALYTICS_LOG_PATH";
pub const SOURCE_ID_VAR: &str = "ANALYTICS_SOURCE_ID";
pub const BATCH_SIZE_VAR: &str = "ANALYTICS_BATCH_SIZE";
pub const BATCH_TIMEOUT_VAR: &str = "ANALYTICS_BATCH_TIMEOUT_MS";
pub const SAMPLING_RATE_VAR: &str = "ANALYTICS_SAMPLING_RATE";
pub const CACHE_TTL_VAR: &str = "ANALYTICS_CACHE_TTL_MS";
pub const COST_PER_CALL_VAR: &str = "ANALYTICS_COST_PER_CALL";
pub const INSTRUMENT_VAR: &str = "ANALYTICS_INSTRUMENT";

pub const DEFAULT_LOG_PATH: &str = "./data/events.jsonl";
pub const DEFAULT_SOURCE_ID: &str = "analytics-server";

/// Resolved server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub log_path: PathBuf,
    pub collector: CollectorConfig,
    pub cache_ttl: Duration,
    pub cost_per_call: f64,
    /// Record the server's own tool calls into the log
    pub instrument: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_path: resolve_path(DEFAULT_LOG_PATH),
            collector: CollectorConfig::new(DEFAULT_SOURCE_ID),
            cache_ttl: DEFAULT_CACHE_TTL,
            cost_per_call: DEFAULT_COST_PER_CALL,
            instrument: true,
        }
    }
}

impl ServerConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`; absent keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(LOG_PATH_VAR) {
            config.log_path = resolve_path(&path);
        }
        if let Some(source_id) = lookup(SOURCE_ID_VAR) {
            config.collector.source_id = source_id;
        }
        if let Some(size) = parse_var::<usize>(&lookup, BATCH_SIZE_VAR)? {
            config.collector.batch_size = size;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, BATCH_TIMEOUT_VAR)? {
            config.collector.batch_timeout = Duration::from_millis(ms);
        }
        if let Some(rate) = parse_var::<f64>(&lookup, SAMPLING_RATE_VAR)? {
            config.collector.sampling_rate = rate;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, CACHE_TTL_VAR)? {
            config.cache_ttl = Duration::from_millis(ms);
        }
        if let Some(cost) = parse_var::<f64>(&lookup, COST_PER_CALL_VAR)? {
            if !cost.is_finite() || cost < 0.0 {
                return Err(ConfigError::InvalidValue {
                    key: COST_PER_CALL_VAR,
                    value: cost.to_string(),
                });
            }
            config.cost_per_call = cost;
        }
        if let Some(flag) = lookup(INSTRUMENT_VAR) {
            config.instrument = parse_flag(INSTRUMENT_VAR, &flag)?;
        }

        config.collector.validate()?;
        Ok(config)
    }

    /// Settings for the query side
    pub fn source_config(&self) -> FileSourceConfig {
        FileSourceConfig::new(&self.log_path)
            .with_cache_ttl(self.cache_ttl)
            .with_cost_per_call(self.cost_per_call)
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
    }
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
        }),
    }
}

fn resolve_path(raw: &str) -> PathBuf {
    let path = Path::new(raw);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let path = path.strip_prefix(".").unwrap_or(path);
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}
