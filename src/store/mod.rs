//! Log storage: reading side
//!
//! - `CachedLoader`: bounded-staleness snapshot of the NDJSON log
//! - `QuerySource`: the query contract every backend satisfies
//! - `FileQuerySource`: the file-backed backend (loader + query engine)

mod loader;
mod source;

pub use loader::{parse_lines, CachedLoader, LoadError, LoadReport, DEFAULT_CACHE_TTL};
pub use source::{FileQuerySource, FileSourceConfig, QueryOutcome, QuerySource};
