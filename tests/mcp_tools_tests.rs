//! Integration tests for the analytics MCP tools

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};
use tempfile::TempDir;

use tool_analytics::server::McpServer;
use tool_analytics::store::{FileQuerySource, QuerySource};
use tool_analytics::tools::register_all_tools;
use tool_analytics::utils::current_timestamp_ms;

fn seed_log(path: &Path) {
    let now = current_timestamp_ms();
    let lines = [
        format!(
            r#"{{"kind":"invocation","id":"1","timestamp":{},"sourceId":"src_1","subjectName":"search","parameters":{{}},"duration":100.0,"success":true}}"#,
            now
        ),
        format!(
            r#"{{"kind":"invocation","id":"2","timestamp":{},"sourceId":"src_1","subjectName":"fetch","parameters":{{}},"duration":300.0,"success":false,"failureDetail":"boom"}}"#,
            now
        ),
        format!(
            r#"{{"kind":"error","id":"3","timestamp":{},"sourceId":"src_1","errorCategory":"Network","message":"reset","metadata":{{"subjectName":"fetch"}}}}"#,
            now
        ),
    ];
    fs::write(path, lines.join("\n") + "\n").unwrap();
}

fn setup() -> (TempDir, McpServer) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("events.jsonl");
    seed_log(&path);

    let source: Arc<dyn QuerySource> = Arc::new(FileQuerySource::new(&path));
    let mut server = McpServer::new();
    register_all_tools(&mut server, source);
    (temp_dir, server)
}

fn call_tool(server: &McpServer, name: &str, arguments: Value) -> Value {
    let request = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "tools/call",
        "params": {"name": name, "arguments": arguments}
    });
    let response = server.handle_request(&request.to_string()).unwrap().unwrap();
    serde_json::from_str(&response).unwrap()
}

/// Parse the JSON view carried in the first text block
fn view(response: &Value) -> Value {
    let text = response["result"]["content"][0]["text"].as_str().unwrap();
    serde_json::from_str(text).unwrap()
}

#[test]
fn test_all_tools_are_listed() {
    let (_temp_dir, server) = setup();
    assert_eq!(server.tool_count(), 5);

    let response = server
        .handle_request(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#)
        .unwrap()
        .unwrap();
    let response: Value = serde_json::from_str(&response).unwrap();
    let names: Vec<&str> = response["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec![
            "get_cost_estimate",
            "get_error_log",
            "get_insights",
            "get_metrics",
            "get_tool_stats"
        ]
    );
}

#[test]
fn test_get_metrics_defaults_to_all_sources() {
    let (_temp_dir, server) = setup();
    let metrics = view(&call_tool(&server, "get_metrics", json!({})));

    assert_eq!(metrics["combined"]["total_calls"], 2);
    assert_eq!(metrics["combined"]["success_rate"], 0.5);
    assert_eq!(metrics["combined"]["p50"], 300.0);
    assert_eq!(metrics["by_source"]["src_1"]["total_calls"], 2);
}

#[test]
fn test_get_metrics_single_source() {
    let (_temp_dir, server) = setup();
    let metrics = view(&call_tool(
        &server,
        "get_metrics",
        json!({"selector": "src_1", "window": "5m"}),
    ));
    assert_eq!(metrics["total_calls"], 2);
    assert!(metrics.get("by_source").is_none());
}

#[test]
fn test_get_tool_stats() {
    let (_temp_dir, server) = setup();
    let stats = view(&call_tool(
        &server,
        "get_tool_stats",
        json!({"toolName": "fetch", "selector": "src_1"}),
    ));
    assert_eq!(stats["subject_name"], "fetch");
    assert_eq!(stats["total_calls"], 1);
    assert_eq!(stats["error_count"], 1);

    let missing = call_tool(&server, "get_tool_stats", json!({}));
    assert_eq!(missing["error"]["code"], -32603);
    assert!(missing["error"]["data"]["details"]
        .as_str()
        .unwrap()
        .contains("toolName"));
}

#[test]
fn test_get_error_log() {
    let (_temp_dir, server) = setup();
    let log = view(&call_tool(&server, "get_error_log", json!({"limit": 5})));
    assert_eq!(log["combined"][0]["error_category"], "Network");
    assert_eq!(log["combined"][0]["subject_name"], "fetch");
    assert_eq!(log["combined"][0]["frequency"], 1);
}

#[test]
fn test_get_cost_estimate() {
    let (_temp_dir, server) = setup();
    let cost = view(&call_tool(
        &server,
        "get_cost_estimate",
        json!({"selector": "src_1"}),
    ));
    assert_eq!(cost["total_calls"], 2);
    assert_eq!(cost["estimated_cost"], 0.0002);
}

#[test]
fn test_get_insights() {
    let (_temp_dir, server) = setup();
    let report = view(&call_tool(&server, "get_insights", json!({})));

    assert_eq!(report["overall_health_score"], 0.5);
    assert_eq!(report["critical_insights"][0]["kind"], "error_spike");
    assert_eq!(report["critical_insights"][0]["severity"], "critical");
    assert_eq!(report["critical_insights"][0]["source_id"], "src_1");
}

#[test]
fn test_invalid_window_is_reported() {
    let (_temp_dir, server) = setup();
    let response = call_tool(&server, "get_metrics", json!({"window": "1y"}));
    assert_eq!(response["error"]["message"], "Tool execution error");
    assert!(response["error"]["data"]["details"]
        .as_str()
        .unwrap()
        .contains("1y"));
}

#[test]
fn test_malformed_arguments_are_reported() {
    let (_temp_dir, server) = setup();

    let window = call_tool(&server, "get_cost_estimate", json!({"window": 5}));
    assert_eq!(window["error"]["code"], -32603);

    let limit = call_tool(&server, "get_error_log", json!({"limit": "10"}));
    assert!(limit["error"]["data"]["details"]
        .as_str()
        .unwrap()
        .contains("limit"));
}
