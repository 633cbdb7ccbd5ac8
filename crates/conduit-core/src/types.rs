//! Core type definitions: JSON-RPC envelopes and node descriptors.
//!
//! # Type Categories
//!
//! ## JSON-RPC Protocol Types
//! - [`JsonRpcRequest`], [`JsonRpcResponse`], [`JsonRpcError`]: protocol conformance
//!
//! ## Node Descriptors
//! - [`NodeKind`]: the dual-pool discriminator (normal vs. archive)
//! - [`RpcNode`]: a caller-supplied or manifest-sourced endpoint definition
//!
//! # Performance Notes
//!
//! - `jsonrpc` uses `Cow<'static, str>` so envelopes built with the static
//!   version string allocate nothing for it.
//! - `id` uses `Arc<serde_json::Value>` so echoing a request id into a
//!   response is a reference-count bump, not a deep copy.

use serde::{Deserialize, Serialize};
use std::{borrow::Cow, fmt, sync::Arc};

/// JSON-RPC protocol version constant.
pub const JSONRPC_VERSION: &str = "2.0";

/// Pre-allocated `Cow` for the JSON-RPC version.
pub const JSONRPC_VERSION_COW: Cow<'static, str> = Cow::Borrowed(JSONRPC_VERSION);

/// Which pool an endpoint belongs to.
///
/// A NORMAL node serves recent chain state; an ARCHIVE node retains full
/// history. An endpoint belongs to exactly one kind, though the same URL may
/// be registered under both kinds as two independent records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Normal,
    Archive,
}

impl NodeKind {
    /// Both kinds, in the order pools are probed and displayed.
    pub const ALL: [NodeKind; 2] = [NodeKind::Normal, NodeKind::Archive];

    /// The other pool, used by the URL resolver's fallback.
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            NodeKind::Normal => NodeKind::Archive,
            NodeKind::Archive => NodeKind::Normal,
        }
    }

    /// Static label for logging and metrics fields.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Normal => "normal",
            NodeKind::Archive => "archive",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An endpoint definition as supplied by the caller or decoded from the
/// remote endpoint manifest.
///
/// This is pure configuration; runtime state (block height, latency, failure
/// flag) lives in the registry's endpoint records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcNode {
    /// Absolute HTTP(S) URL of the endpoint.
    pub url: String,
    /// Pool the endpoint belongs to.
    #[serde(rename = "type")]
    pub kind: NodeKind,
}

impl RpcNode {
    #[must_use]
    pub fn new(url: impl Into<String>, kind: NodeKind) -> Self {
        Self { url: url.into(), kind }
    }
}

/// JSON-RPC 2.0 request structure.
///
/// The balancer is agnostic to `method` and `params`; it forwards the
/// envelope verbatim to the selected endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: Cow<'static, str>,
    pub method: String,
    pub params: serde_json::Value,
    pub id: Arc<serde_json::Value>,
}

impl JsonRpcRequest {
    /// Creates a new JSON-RPC request with zero allocation for the version string.
    #[must_use]
    pub fn new(method: impl Into<String>, params: serde_json::Value, id: serde_json::Value) -> Self {
        Self { jsonrpc: JSONRPC_VERSION_COW, method: method.into(), params, id: Arc::new(id) }
    }
}

/// JSON-RPC 2.0 response structure.
///
/// A response carries either a `result` (success) or an `error` (failure).
/// The balancer returns responses to callers without interpreting either
/// field; only the status probe inspects `result`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: Cow<'static, str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: Arc<serde_json::Value>,
}

impl JsonRpcResponse {
    /// Creates a successful response, echoing the request id cheaply.
    #[must_use]
    pub fn success(result: serde_json::Value, id: Arc<serde_json::Value>) -> Self {
        Self { jsonrpc: JSONRPC_VERSION_COW, result: Some(result), error: None, id }
    }

    /// Creates an error response, echoing the request id cheaply.
    #[must_use]
    pub fn error(code: i32, message: String, id: Arc<serde_json::Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION_COW,
            result: None,
            error: Some(JsonRpcError { code, message, data: None }),
            id,
        }
    }
}

/// JSON-RPC 2.0 error object.
///
/// Standard error codes follow the JSON-RPC 2.0 convention (`-32700` parse
/// error, `-32600` invalid request, `-32601` method not found, `-32602`
/// invalid params, `-32603` internal error, `-32000..=-32099` server errors).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}
