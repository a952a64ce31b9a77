//! Time-window filtering and per-source partitioning

use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::types::{Aggregated, ErrorRecord, EventRecord, InvocationRecord, QueryResult, Selector};

/// Records that carry an originating source
pub trait Sourced {
    fn source_id(&self) -> &str;
    fn timestamp(&self) -> i64;
}

impl Sourced for InvocationRecord {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

impl Sourced for ErrorRecord {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

/// Invocations with `timestamp >= cutoff`
pub fn invocations_since(records: &[EventRecord], cutoff: i64) -> Vec<&InvocationRecord> {
    records
        .iter()
        .filter_map(EventRecord::as_invocation)
        .filter(|r| r.timestamp >= cutoff)
        .collect()
}

/// Every error record, regardless of age
pub fn errors(records: &[EventRecord]) -> Vec<&ErrorRecord> {
    records.iter().filter_map(EventRecord::as_error).collect()
}

/// Group items by source id, sources in ascending order
pub fn partition_by_source<'a, R: Sourced>(items: &[&'a R]) -> BTreeMap<String, Vec<&'a R>> {
    let mut partitions: BTreeMap<String, Vec<&'a R>> = BTreeMap::new();
    for item in items {
        partitions
            .entry(item.source_id().to_string())
            .or_default()
            .push(*item);
    }
    partitions
}

/// Apply `view` to the items the selector picks
///
/// For a single source the view covers that source's items (possibly none).
/// For all sources it runs once per source observed in `items` and once more
/// over the union. Sources without items are absent from the breakdown.
pub fn scoped<'a, R, T, F>(items: Vec<&'a R>, selector: &Selector, view: F) -> QueryResult<T>
where
    R: Sourced + Sync + 'a,
    T: Send,
    F: Fn(&[&'a R]) -> T + Sync,
{
    match selector {
        Selector::Source(id) => {
            let own: Vec<&R> = items.into_iter().filter(|r| r.source_id() == id).collect();
            QueryResult::Single(view(&own))
        }
        Selector::All => {
            let by_source: BTreeMap<String, T> = partition_by_source(&items)
                .into_par_iter()
                .map(|(source, part)| {
                    let computed = view(&part);
                    (source, computed)
                })
                .collect();
            let combined = view(&items);
            QueryResult::AllSources(Aggregated {
                combined,
                by_source,
            })
        }
    }
}
