//! MCP Server implementation
//!
//! Line-delimited JSON-RPC over stdio. Each `tools/call` is timed and, when
//! a collector is attached, recorded as an invocation; failed calls are also
//! recorded as errors.

mod handlers;

use std::collections::HashMap;
use std::io::{self, BufRead, BufWriter, Write};
use std::time::Instant;

use serde::Serialize;
use serde_json::{json, Value};

use crate::collector::{ErrorEvent, EventCollector, Invocation};
use crate::protocol::{
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, McpTool, ServerInfo, Tool, PROTOCOL_VERSION,
};
use crate::types::McpResult;

pub use handlers::*;

/// MCP Server that handles JSON-RPC communication over stdio
pub struct McpServer {
    server_info: ServerInfo,
    tools: HashMap<String, Box<dyn Tool>>,
    collector: Option<EventCollector>,
}

impl McpServer {
    /// Create a new MCP server with default settings
    pub fn new() -> Self {
        Self::with_info(ServerInfo::default())
    }

    /// Create a new MCP server with custom server info
    pub fn with_info(info: ServerInfo) -> Self {
        Self {
            server_info: info,
            tools: HashMap::new(),
            collector: None,
        }
    }

    /// Record every tool call through `collector`
    pub fn with_collector(mut self, collector: EventCollector) -> Self {
        self.collector = Some(collector);
        self
    }

    /// Register a tool with the server
    pub fn register_tool(&mut self, tool: Box<dyn Tool>) -> &mut Self {
        let name = tool.definition().name;
        self.tools.insert(name, tool);
        self
    }

    /// Get the number of registered tools
    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    /// Run the server on stdin/stdout until stdin closes (blocking)
    pub fn run(&self) -> McpResult<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.serve(stdin.lock(), BufWriter::new(stdout.lock()))
    }

    /// Serve requests from `reader`, writing one response line per request
    pub fn serve<R: BufRead, W: Write>(&self, mut reader: R, mut writer: W) -> McpResult<()> {
        tracing::info!(
            name = %self.server_info.name,
            version = %self.server_info.version,
            tools = self.tools.len(),
            "MCP server listening on stdio"
        );

        let mut line = String::new();
        while reader.read_line(&mut line)? > 0 {
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                if let Some(response) = self.handle_request(trimmed)? {
                    writeln!(writer, "{}", response)?;
                    writer.flush()?;
                }
            }
            line.clear();
        }

        tracing::info!("stdin closed, MCP server stopping");
        Ok(())
    }

    /// Handle a single JSON-RPC request, returning the encoded response
    ///
    /// Notifications produce no response.
    pub fn handle_request(&self, request_str: &str) -> McpResult<Option<String>> {
        let request: JsonRpcRequest = match serde_json::from_str(request_str) {
            Ok(req) => req,
            Err(e) => {
                tracing::warn!(error = %e, "unparseable request");
                return encode(&JsonRpcError::parse_error(e.to_string())).map(Some);
            }
        };

        let notification = request.is_notification();
        let id = request.id.clone().unwrap_or(Value::Null);

        if !request.is_valid() {
            return encode(&JsonRpcError::invalid_request(id, "jsonrpc must be '2.0'")).map(Some);
        }

        tracing::debug!(method = %request.method, "request");

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(id),
            "notifications/initialized" => return Ok(None),
            "tools/list" => self.handle_tools_list(id),
            "tools/call" => self.handle_tool_call(id, request.params),
            "ping" => encode(&JsonRpcResponse::new(id, json!({}))),
            _ => encode(&JsonRpcError::method_not_found(id, &request.method)),
        }?;

        if notification {
            return Ok(None);
        }
        Ok(Some(response))
    }

    fn handle_initialize(&self, id: Value) -> McpResult<String> {
        let result = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": self.server_info.name,
                "version": self.server_info.version
            }
        });
        encode(&JsonRpcResponse::new(id, result))
    }

    fn handle_tools_list(&self, id: Value) -> McpResult<String> {
        let mut tools: Vec<McpTool> = self.tools.values().map(|t| t.definition()).collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        encode(&JsonRpcResponse::new(id, json!({ "tools": tools })))
    }

    fn handle_tool_call(&self, id: Value, params: Option<Value>) -> McpResult<String> {
        let Some(params) = params else {
            return encode(&JsonRpcError::invalid_params(id, "missing parameters"));
        };
        let Some(tool_name) = extract_tool_name(&params) else {
            return encode(&JsonRpcError::invalid_params(id, "missing tool name"));
        };
        let arguments = extract_arguments(&params);

        let started = Instant::now();
        let outcome = match self.tools.get(tool_name) {
            Some(tool) => tool
                .execute(arguments.clone())
                .map_err(|e| CallFailure::Execution(e.to_string())),
            None => Err(CallFailure::UnknownTool),
        };
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        self.instrument(tool_name, arguments, elapsed_ms, &outcome);

        match outcome {
            Ok(result) => encode(&JsonRpcResponse::new(id, result)),
            Err(CallFailure::UnknownTool) => encode(&JsonRpcError::unknown_tool(id, tool_name)),
            Err(CallFailure::Execution(details)) => {
                tracing::warn!(tool = tool_name, error = %details, "tool call failed");
                encode(&JsonRpcError::tool_failed(id, details))
            }
        }
    }

    fn instrument(
        &self,
        tool_name: &str,
        arguments: Value,
        elapsed_ms: f64,
        outcome: &Result<Value, CallFailure>,
    ) {
        let Some(collector) = &self.collector else {
            return;
        };

        let invocation = Invocation::new(tool_name, arguments).with_duration(elapsed_ms);
        match outcome {
            Ok(_) => collector.record_invocation(invocation),
            Err(failure) => {
                let message = failure.message(tool_name);
                collector.record_invocation(invocation.failed(message.clone()));
                collector.record_error(
                    ErrorEvent::new(failure.category(), message).with_subject(tool_name),
                );
            }
        }
    }
}

impl Default for McpServer {
    fn default() -> Self {
        Self::new()
    }
}

fn encode<T: Serialize>(response: &T) -> McpResult<String> {
    Ok(serde_json::to_string(response)?)
}
