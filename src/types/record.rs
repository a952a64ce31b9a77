//! Event records for the telemetry log
//!
//! Two record shapes are written to the log: invocations (one per tool call)
//! and errors. In memory they are a single tagged enum; on the wire each line
//! carries a `kind` discriminant, while untagged lines from older producers
//! are still told apart by their distinguishing field.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Metadata key carrying the tool name on error records
pub const SUBJECT_METADATA_KEY: &str = "subjectName";

/// Legacy metadata key some producers use for the tool name
const LEGACY_SUBJECT_METADATA_KEY: &str = "toolName";

/// Subject reported for errors without a recoverable tool name
pub const UNKNOWN_SUBJECT: &str = "unknown";

/// A single tool invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationRecord {
    pub id: String,

    /// Epoch milliseconds
    pub timestamp: i64,

    pub source_id: String,

    /// Tool or operation that was invoked
    pub subject_name: String,

    #[serde(default)]
    pub parameters: Value,

    /// Duration in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_detail: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

/// An error raised while serving a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    pub id: String,

    /// Epoch milliseconds
    pub timestamp: i64,

    pub source_id: String,

    pub error_category: String,

    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl ErrorRecord {
    /// Tool name recovered from metadata, or `"unknown"`
    pub fn subject_name(&self) -> &str {
        self.metadata
            .as_ref()
            .and_then(|m| {
                m.get(SUBJECT_METADATA_KEY)
                    .or_else(|| m.get(LEGACY_SUBJECT_METADATA_KEY))
            })
            .and_then(|v| v.as_str())
            .unwrap_or(UNKNOWN_SUBJECT)
    }
}

/// One line of the telemetry log
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventRecord {
    Invocation(InvocationRecord),
    Error(ErrorRecord),
}

/// Accepted wire shapes. Tagged lines are tried first.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireRecord {
    Tagged(TaggedRecord),
    Invocation(InvocationRecord),
    Error(ErrorRecord),
}

#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum TaggedRecord {
    Invocation(InvocationRecord),
    Error(ErrorRecord),
}

impl From<WireRecord> for EventRecord {
    fn from(wire: WireRecord) -> Self {
        match wire {
            WireRecord::Tagged(TaggedRecord::Invocation(r)) | WireRecord::Invocation(r) => {
                EventRecord::Invocation(r)
            }
            WireRecord::Tagged(TaggedRecord::Error(r)) | WireRecord::Error(r) => {
                EventRecord::Error(r)
            }
        }
    }
}

impl<'de> Deserialize<'de> for EventRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        WireRecord::deserialize(deserializer).map(EventRecord::from)
    }
}

impl EventRecord {
    pub fn id(&self) -> &str {
        match self {
            EventRecord::Invocation(r) => &r.id,
            EventRecord::Error(r) => &r.id,
        }
    }

    pub fn timestamp(&self) -> i64 {
        match self {
            EventRecord::Invocation(r) => r.timestamp,
            EventRecord::Error(r) => r.timestamp,
        }
    }

    pub fn source_id(&self) -> &str {
        match self {
            EventRecord::Invocation(r) => &r.source_id,
            EventRecord::Error(r) => &r.source_id,
        }
    }

    pub fn as_invocation(&self) -> Option<&InvocationRecord> {
        match self {
            EventRecord::Invocation(r) => Some(r),
            EventRecord::Error(_) => None,
        }
    }

    pub fn as_error(&self) -> Option<&ErrorRecord> {
        match self {
            EventRecord::Error(r) => Some(r),
            EventRecord::Invocation(_) => None,
        }
    }

    /// Serialize to a single JSON line (no trailing newline)
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse one log line
    pub fn from_json_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

impl From<InvocationRecord> for EventRecord {
    fn from(record: InvocationRecord) -> Self {
        EventRecord::Invocation(record)
    }
}

impl From<ErrorRecord> for EventRecord {
    fn from(record: ErrorRecord) -> Self {
        EventRecord::Error(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_invocation() -> InvocationRecord {
        InvocationRecord {
            id: "inv-1".to_string(),
            timestamp: 1_704_067_200_000,
            source_id: "src_1".to_string(),
            subject_name: "search".to_string(),
            parameters: json!({"query": "rust", "filters": {"lang": ["en", "fr"]}}),
            duration: Some(12.5),
            success: true,
            failure_detail: None,
            metadata: None,
        }
    }

    #[test]
    fn test_invocation_serialization() {
        let record = EventRecord::Invocation(sample_invocation());
        let line = record.to_json_line().unwrap();

        assert!(line.contains("\"kind\":\"invocation\""));
        assert!(line.contains("\"sourceId\":\"src_1\""));
        assert!(line.contains("\"subjectName\":\"search\""));
        assert!(!line.contains("failureDetail"));

        let parsed = EventRecord::from_json_line(&line).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_error_serialization() {
        let record = EventRecord::Error(ErrorRecord {
            id: "err-1".to_string(),
            timestamp: 1_704_067_200_000,
            source_id: "src_1".to_string(),
            error_category: "Timeout".to_string(),
            message: "upstream timed out".to_string(),
            stack: Some("at fetch()".to_string()),
            metadata: Some(json!({"subjectName": "fetch"}).as_object().unwrap().clone()),
        });

        let line = record.to_json_line().unwrap();
        assert!(line.contains("\"kind\":\"error\""));
        assert!(line.contains("\"errorCategory\":\"Timeout\""));

        let parsed = EventRecord::from_json_line(&line).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_untagged_lines_discriminated_by_field() {
        let invocation = r#"{"id":"a","timestamp":1,"sourceId":"s","subjectName":"t","parameters":{},"success":false,"failureDetail":"boom"}"#;
        let error = r#"{"id":"b","timestamp":2,"sourceId":"s","errorCategory":"Io","message":"disk"}"#;

        let parsed = EventRecord::from_json_line(invocation).unwrap();
        let inv = parsed.as_invocation().unwrap();
        assert_eq!(inv.subject_name, "t");
        assert_eq!(inv.failure_detail.as_deref(), Some("boom"));

        let parsed = EventRecord::from_json_line(error).unwrap();
        assert_eq!(parsed.as_error().unwrap().error_category, "Io");
    }

    #[test]
    fn test_line_with_neither_shape_is_rejected() {
        assert!(EventRecord::from_json_line(r#"{"id":"x","timestamp":1}"#).is_err());
        assert!(EventRecord::from_json_line("not json").is_err());
    }

    #[test]
    fn test_error_subject_name_recovery() {
        let mut error = ErrorRecord {
            id: "e".to_string(),
            timestamp: 0,
            source_id: "s".to_string(),
            error_category: "Io".to_string(),
            message: "m".to_string(),
            stack: None,
            metadata: None,
        };
        assert_eq!(error.subject_name(), "unknown");

        error.metadata = Some(json!({"toolName": "legacy"}).as_object().unwrap().clone());
        assert_eq!(error.subject_name(), "legacy");

        error.metadata = Some(
            json!({"subjectName": "current", "toolName": "legacy"})
                .as_object()
                .unwrap()
                .clone(),
        );
        assert_eq!(error.subject_name(), "current");
    }
}
