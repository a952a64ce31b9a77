//! Error log grouping
//!
//! Errors with the same (category, message) pair form one entry. The entry
//! reports the most recent occurrence and how many times the pair was seen.

use std::collections::HashMap;

use crate::types::{ErrorLogEntry, ErrorRecord};

/// Default number of entries returned by the error log
pub const DEFAULT_ERROR_LOG_LIMIT: usize = 50;

/// Group errors, most frequent first, truncated to `limit`
pub fn group_errors(errors: &[&ErrorRecord], limit: usize) -> Vec<ErrorLogEntry> {
    let mut groups: HashMap<(&str, &str), (&ErrorRecord, u64)> = HashMap::new();

    for &error in errors {
        let key = (error.error_category.as_str(), error.message.as_str());
        groups
            .entry(key)
            .and_modify(|(latest, count)| {
                *count += 1;
                if error.timestamp >= latest.timestamp {
                    *latest = error;
                }
            })
            .or_insert((error, 1));
    }

    let mut entries: Vec<ErrorLogEntry> = groups
        .into_values()
        .map(|(latest, frequency)| ErrorLogEntry {
            id: latest.id.clone(),
            timestamp: latest.timestamp,
            source_id: latest.source_id.clone(),
            error_category: latest.error_category.clone(),
            message: latest.message.clone(),
            stack: latest.stack.clone(),
            subject_name: latest.subject_name().to_string(),
            frequency,
        })
        .collect();

    entries.sort_by(|a, b| {
        b.frequency
            .cmp(&a.frequency)
            .then_with(|| b.timestamp.cmp(&a.timestamp))
            .then_with(|| a.error_category.cmp(&b.error_category))
            .then_with(|| a.message.cmp(&b.message))
    });
    entries.truncate(limit);
    entries
}
