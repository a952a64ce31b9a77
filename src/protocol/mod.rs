//! Protocol types for MCP and JSON-RPC communication
//!
//! JSON-RPC 2.0 framing plus the MCP tool definitions layered on top of it.

mod jsonrpc;
mod mcp;

pub use jsonrpc::{
    ErrorObject, JsonRpcError, JsonRpcRequest, JsonRpcResponse, INTERNAL_ERROR, INVALID_PARAMS,
    INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR,
};
pub use mcp::{McpTool, ServerInfo, Tool, PROTOCOL_VERSION};
