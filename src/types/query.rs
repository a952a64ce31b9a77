//! Query parameters: source selector and time window

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced to query callers
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid selector: {0}")]
    InvalidSelector(String),

    #[error("unknown time window '{0}' (expected one of 5m, 1h, 24h, 7d, 30d)")]
    UnknownWindow(String),

    #[error("missing required argument: {0}")]
    MissingArgument(&'static str),

    #[error("invalid argument {name}: {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    #[error("failed to load events: {0}")]
    Load(#[from] crate::store::LoadError),
}

/// Chooses one source or the union of all sources
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    Source(String),
    All,
}

impl Selector {
    pub const ALL: &'static str = "all";

    pub fn source(id: impl Into<String>) -> Self {
        Selector::Source(id.into())
    }
}

impl FromStr for Selector {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(QueryError::InvalidSelector(
                "selector must be a source id or 'all'".to_string(),
            ));
        }
        if trimmed.eq_ignore_ascii_case(Self::ALL) {
            Ok(Selector::All)
        } else {
            Ok(Selector::Source(trimmed.to_string()))
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Source(id) => write!(f, "{}", id),
            Selector::All => write!(f, "{}", Self::ALL),
        }
    }
}

/// Fixed lookback windows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeWindow {
    #[serde(rename = "5m")]
    FiveMinutes,
    #[default]
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "24h")]
    OneDay,
    #[serde(rename = "7d")]
    SevenDays,
    #[serde(rename = "30d")]
    ThirtyDays,
}

impl TimeWindow {
    /// Window length in milliseconds
    pub fn duration_ms(self) -> i64 {
        match self {
            TimeWindow::FiveMinutes => 300_000,
            TimeWindow::OneHour => 3_600_000,
            TimeWindow::OneDay => 86_400_000,
            TimeWindow::SevenDays => 604_800_000,
            TimeWindow::ThirtyDays => 2_592_000_000,
        }
    }

    /// Oldest timestamp still inside the window
    pub fn cutoff(self, now_ms: i64) -> i64 {
        now_ms - self.duration_ms()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeWindow::FiveMinutes => "5m",
            TimeWindow::OneHour => "1h",
            TimeWindow::OneDay => "24h",
            TimeWindow::SevenDays => "7d",
            TimeWindow::ThirtyDays => "30d",
        }
    }
}

impl FromStr for TimeWindow {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "5m" => Ok(TimeWindow::FiveMinutes),
            "1h" => Ok(TimeWindow::OneHour),
            "24h" => Ok(TimeWindow::OneDay),
            "7d" => Ok(TimeWindow::SevenDays),
            "30d" => Ok(TimeWindow::ThirtyDays),
            other => Err(QueryError::UnknownWindow(other.to_string())),
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
