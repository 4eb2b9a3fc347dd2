// crates/rfc-bridge-mcp/src/server.rs
// ============================================================================
// Module: MCP Server
// Description: MCP server over stdio and HTTP transports.
// Purpose: Expose the RFC bridge tools via JSON-RPC 2.0.
// Dependencies: rfc-bridge-core, rfc-bridge-config, axum, tokio, tokio-util
// ============================================================================

//! ## Overview
//! The MCP server exposes the RFC bridge tools using JSON-RPC 2.0 and always
//! routes calls through [`crate::tools::ToolRouter`]. Requests are dispatched
//! on blocking workers so many calls can be in flight while the session
//! manager serializes access to the native session. Stdio replies share one
//! locked writer and may complete out of order.
//!
//! Each call receives a child of the server shutdown token; a transport
//! failure cancels it so queued calls stop before their next attempt.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::BufReader;
use std::io::Read;
use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::Mutex;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::post;
use rfc_bridge_config::RfcBridgeConfig;
use rfc_bridge_config::ServerConfig;
use rfc_bridge_config::ServerTransport;
use rfc_bridge_core::CallMetrics;
use rfc_bridge_core::ConnectionSpec;
use rfc_bridge_core::SessionDiagnostics;
use rfc_bridge_core::SessionError;
use rfc_bridge_core::SessionManager;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::audit::audit_sink_from_config;
use crate::bridge::StdioBridgeConnector;
use crate::framing::Frame;
use crate::framing::FramingError;
use crate::framing::read_message;
use crate::framing::write_message;
use crate::tools::ToolDefinition;
use crate::tools::ToolError;
use crate::tools::ToolOutput;
use crate::tools::ToolRouter;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Server name reported by `initialize`.
pub const SERVER_NAME: &str = "rfc-bridge";

/// Protocol version used when the client does not request one.
pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";

/// Frames buffered between the stdin reader and the dispatcher.
const STDIO_QUEUE_DEPTH: usize = 64;

// ============================================================================
// SECTION: MCP Server
// ============================================================================

/// MCP server instance.
pub struct McpServer {
    /// Server configuration.
    config: ServerConfig,
    /// Tool router for request dispatch.
    router: ToolRouter,
    /// Cancels in-flight calls when the transport fails.
    shutdown: CancellationToken,
}

impl McpServer {
    /// Creates a server around an existing router.
    #[must_use]
    pub fn new(config: ServerConfig, router: ToolRouter) -> Self {
        Self {
            config,
            router,
            shutdown: CancellationToken::new(),
        }
    }

    /// Connects to the remote system and builds a server from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerError`] when the configuration is invalid, the audit
    /// sink cannot be opened, or the initial connect fails.
    pub fn from_config(
        config: &RfcBridgeConfig,
        spec: ConnectionSpec,
    ) -> Result<Self, McpServerError> {
        config.validate().map_err(|err| McpServerError::Config(err.to_string()))?;
        let audit = audit_sink_from_config(&config.server.audit)
            .map_err(|err| McpServerError::Init(format!("audit sink: {err}")))?;
        let diagnostics: Arc<dyn SessionDiagnostics> = audit.clone();
        let session = SessionManager::connect(
            StdioBridgeConnector::from_config(&config.bridge),
            spec,
            config.session.retry_policy(),
            diagnostics,
        )
        .map_err(McpServerError::Connect)?;
        let router = ToolRouter::new(
            Arc::new(session),
            Arc::new(CallMetrics::new()),
            audit,
            config.query.clone(),
        );
        Ok(Self::new(config.server.clone(), router))
    }

    /// Returns the token that cancels in-flight calls.
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Serves requests using the configured transport.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerError`] when the transport fails.
    pub async fn serve(self) -> Result<(), McpServerError> {
        match self.config.transport {
            ServerTransport::Stdio => {
                serve_stdio(
                    self.router,
                    std::io::stdin(),
                    std::io::stdout(),
                    self.config.max_body_bytes,
                    self.shutdown,
                )
                .await
            }
            ServerTransport::Http => serve_http(&self.config, self.router, self.shutdown).await,
        }
    }
}

// ============================================================================
// SECTION: Stdio Transport
// ============================================================================

/// Serves JSON-RPC requests from `reader`, writing replies to `writer`.
///
/// Returns after the reader reaches end of stream and every in-flight call
/// has replied.
///
/// # Errors
///
/// Returns [`McpServerError::Transport`] when a frame is malformed or a reply
/// cannot be written; in-flight calls are canceled first.
pub async fn serve_stdio<R, W>(
    router: ToolRouter,
    reader: R,
    writer: W,
    max_body_bytes: usize,
    shutdown: CancellationToken,
) -> Result<(), McpServerError>
where
    R: Read + Send + 'static,
    W: Write + Send + 'static,
{
    let (frames_tx, mut frames_rx) =
        mpsc::channel::<Result<Frame, FramingError>>(STDIO_QUEUE_DEPTH);
    let reader_task = tokio::task::spawn_blocking(move || {
        let mut reader = BufReader::new(reader);
        loop {
            let frame = read_message(&mut reader, max_body_bytes);
            let stop = frame.is_err();
            if frames_tx.blocking_send(frame).is_err() || stop {
                break;
            }
        }
    });
    let writer = Arc::new(Mutex::new(writer));
    let mut inflight = JoinSet::new();
    let mut failure = None;

    while let Some(frame) = frames_rx.recv().await {
        match frame {
            Ok(frame) => {
                let router = router.clone();
                let writer = Arc::clone(&writer);
                let cancel = shutdown.child_token();
                inflight.spawn_blocking(move || {
                    let Some(reply) = handle_message(&router, &frame.payload, &cancel) else {
                        return Ok(());
                    };
                    let payload = serde_json::to_vec(&reply)
                        .map_err(|err| FramingError::Io(err.to_string()))?;
                    let mut writer = writer
                        .lock()
                        .map_err(|_| FramingError::Io("stdout lock poisoned".to_string()))?;
                    write_message(&mut *writer, &payload, frame.style)
                });
            }
            Err(FramingError::Closed) => break,
            Err(err) => {
                failure = Some(McpServerError::Transport(err.to_string()));
                break;
            }
        }
        while let Some(done) = inflight.try_join_next() {
            if let Some(err) = write_failure(done) {
                failure = Some(err);
            }
        }
        if failure.is_some() {
            break;
        }
    }

    if failure.is_some() {
        shutdown.cancel();
    }
    drop(frames_rx);
    while let Some(done) = inflight.join_next().await {
        if let Some(err) = write_failure(done)
            && failure.is_none()
        {
            failure = Some(err);
        }
    }
    if failure.is_none() {
        let _ = reader_task.await;
    }
    failure.map_or(Ok(()), Err)
}

/// Extracts a transport error from a finished reply task.
fn write_failure(
    done: Result<Result<(), FramingError>, tokio::task::JoinError>,
) -> Option<McpServerError> {
    match done {
        Ok(Ok(())) => None,
        Ok(Err(err)) => Some(McpServerError::Transport(err.to_string())),
        Err(err) => Some(McpServerError::Transport(format!("reply task failed: {err}"))),
    }
}

// ============================================================================
// SECTION: HTTP Transport
// ============================================================================

/// Shared server state for HTTP handlers.
#[derive(Clone)]
struct ServerState {
    /// Tool router for request dispatch.
    router: ToolRouter,
    /// Maximum allowed request body size.
    max_body_bytes: usize,
    /// Parent token for per-call cancellation.
    shutdown: CancellationToken,
}

/// Serves JSON-RPC requests over HTTP.
async fn serve_http(
    config: &ServerConfig,
    router: ToolRouter,
    shutdown: CancellationToken,
) -> Result<(), McpServerError> {
    let addr: SocketAddr =
        config.bind_addr().map_err(|err| McpServerError::Config(err.to_string()))?;
    let state = Arc::new(ServerState {
        router,
        max_body_bytes: config.max_body_bytes,
        shutdown: shutdown.clone(),
    });
    let app = Router::new().route("/rpc", post(handle_http)).with_state(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| McpServerError::Transport(format!("http bind failed: {err}")))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|err| McpServerError::Transport(format!("http server failed: {err}")))
}

/// Handles HTTP JSON-RPC requests.
async fn handle_http(State(state): State<Arc<ServerState>>, bytes: Bytes) -> Response {
    if bytes.len() > state.max_body_bytes {
        let reply = error_response(Value::Null, -32600, "request body too large".to_string());
        return (StatusCode::PAYLOAD_TOO_LARGE, axum::Json(reply)).into_response();
    }
    let router = state.router.clone();
    let cancel = state.shutdown.child_token();
    let reply =
        tokio::task::spawn_blocking(move || handle_message(&router, bytes.as_ref(), &cancel)).await;
    match reply {
        Ok(Some(reply)) => (StatusCode::OK, axum::Json(reply)).into_response(),
        Ok(None) => StatusCode::ACCEPTED.into_response(),
        Err(err) => {
            let reply = error_response(Value::Null, -32603, format!("dispatch failed: {err}"));
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(reply)).into_response()
        }
    }
}

// ============================================================================
// SECTION: JSON-RPC Handling
// ============================================================================

/// Incoming JSON-RPC request payload.
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    /// JSON-RPC protocol version.
    jsonrpc: String,
    /// Request identifier; absent for notifications.
    #[serde(default)]
    id: Option<Value>,
    /// Method name.
    method: String,
    /// Optional parameters payload.
    #[serde(default)]
    params: Option<Value>,
}

/// JSON-RPC response envelope.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC protocol version.
    jsonrpc: &'static str,
    /// Request identifier.
    id: Value,
    /// Successful result payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    /// Error payload when the request fails.
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

/// JSON-RPC error payload.
#[derive(Debug, Serialize)]
struct JsonRpcError {
    /// Error code.
    code: i64,
    /// Human-readable error message.
    message: String,
}

/// Tool call parameters for JSON-RPC requests.
#[derive(Debug, Deserialize)]
struct ToolCallParams {
    /// Tool name.
    name: String,
    /// Raw JSON arguments.
    #[serde(default)]
    arguments: Value,
}

/// Tool list response payload.
#[derive(Debug, Serialize)]
struct ToolListResult {
    /// Registered tool definitions.
    tools: Vec<ToolDefinition>,
}

/// Tool call response payload.
#[derive(Debug, Serialize)]
struct ToolCallResult {
    /// Tool output content.
    content: Vec<ToolContent>,
    /// Whether the content describes a failure.
    #[serde(rename = "isError")]
    is_error: bool,
}

/// Tool output payloads for JSON-RPC responses.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ToolContent {
    /// Text tool output.
    Text {
        /// Rendered text.
        text: String,
    },
}

/// Handles one raw JSON-RPC message; returns `None` for notifications.
#[must_use]
pub fn handle_message(
    router: &ToolRouter,
    payload: &[u8],
    cancel: &CancellationToken,
) -> Option<JsonRpcResponse> {
    let value: Value = match serde_json::from_slice(payload) {
        Ok(value) => value,
        Err(_) => return Some(error_response(Value::Null, -32700, "parse error".to_string())),
    };
    let id_hint = value.get("id").cloned().unwrap_or(Value::Null);
    let request: JsonRpcRequest = match serde_json::from_value(value) {
        Ok(request) => request,
        Err(_) => {
            return Some(error_response(id_hint, -32600, "invalid json-rpc request".to_string()));
        }
    };
    let id = request.id?;
    if request.jsonrpc != "2.0" {
        return Some(error_response(id, -32600, "invalid json-rpc version".to_string()));
    }
    let params = request.params.unwrap_or(Value::Null);
    let result = match request.method.as_str() {
        "initialize" => Ok(initialize_result(&params)),
        "ping" => Ok(json!({})),
        "tools/list" => serde_json::to_value(ToolListResult {
            tools: router.list_tools(),
        })
        .map_err(|_| (-32603, "serialization failed".to_string())),
        "tools/call" => call_tool(router, &id, params, cancel),
        _ => Err((-32601, "method not found".to_string())),
    };
    Some(match result {
        Ok(result) => JsonRpcResponse {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        },
        Err((code, message)) => error_response(id, code, message),
    })
}

/// Executes `tools/call`, mapping tool failures to `isError` results.
fn call_tool(
    router: &ToolRouter,
    id: &Value,
    params: Value,
    cancel: &CancellationToken,
) -> Result<Value, (i64, String)> {
    let call: ToolCallParams =
        serde_json::from_value(params).map_err(|_| (-32602, "invalid tool params".to_string()))?;
    let request_id = Some(id.to_string());
    let (text, is_error) =
        match router.handle_tool_call(request_id, &call.name, call.arguments, cancel) {
            Ok(ToolOutput::Text(text)) => (text, false),
            Ok(ToolOutput::Json(value)) => match serde_json::to_string_pretty(&value) {
                Ok(text) => (text, false),
                Err(err) => (format!("json marshal error: {err}"), false),
            },
            Err(ToolError::UnknownTool(name)) => {
                return Err((-32602, format!("unknown tool: {name}")));
            }
            Err(err) => (err.to_string(), true),
        };
    serde_json::to_value(ToolCallResult {
        content: vec![ToolContent::Text {
            text,
        }],
        is_error,
    })
    .map_err(|_| (-32603, "serialization failed".to_string()))
}

/// Builds the `initialize` result.
fn initialize_result(params: &Value) -> Value {
    let protocol_version = params
        .get("protocolVersion")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_PROTOCOL_VERSION);
    json!({
        "protocolVersion": protocol_version,
        "capabilities": {"tools": {"listChanged": false}},
        "serverInfo": {"name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION")},
    })
}

/// Builds a JSON-RPC error response.
fn error_response(id: Value, code: i64, message: String) -> JsonRpcResponse {
    JsonRpcResponse {
        jsonrpc: "2.0",
        id,
        result: None,
        error: Some(JsonRpcError {
            code,
            message,
        }),
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// MCP server errors.
#[derive(Debug, thiserror::Error)]
pub enum McpServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// The initial session could not be established.
    #[error("failed to connect: {0}")]
    Connect(SessionError),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}
