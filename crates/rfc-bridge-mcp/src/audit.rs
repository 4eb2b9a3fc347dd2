// crates/rfc-bridge-mcp/src/audit.rs
// ============================================================================
// Module: MCP Audit Logging
// Description: Structured audit events for tool calls and session activity.
// Purpose: Emit JSON-line audit logs without hard dependencies.
// Dependencies: rfc-bridge-config, rfc-bridge-core, serde
// ============================================================================

//! ## Overview
//! This module defines the tool-call audit payload and the sinks that write
//! it. Every sink also receives [`SessionEvent`]s from the session manager,
//! so reconnect activity lands in the same JSON-line stream as tool calls.
//! Argument values are never logged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use rfc_bridge_config::ServerAuditConfig;
use rfc_bridge_core::SessionDiagnostics;
use rfc_bridge_core::SessionEvent;
use serde::Serialize;

use crate::tools::ToolName;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Outcome label for one tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolOutcome {
    /// The tool returned a result.
    Success,
    /// The tool returned an error.
    Failure,
}

/// Tool call audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct McpAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// JSON-RPC request identifier when provided.
    pub request_id: Option<String>,
    /// Tool name.
    pub tool: ToolName,
    /// Remote operation the tool ran (function module name).
    pub operation: Option<String>,
    /// Call outcome.
    pub outcome: ToolOutcome,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// Wall-clock duration of the tool call in milliseconds.
    pub duration_ms: u128,
}

/// Inputs required to construct an audit event.
pub struct McpAuditEventParams {
    /// JSON-RPC request identifier when provided.
    pub request_id: Option<String>,
    /// Tool name.
    pub tool: ToolName,
    /// Remote operation the tool ran.
    pub operation: Option<String>,
    /// Call outcome.
    pub outcome: ToolOutcome,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u128,
}

impl McpAuditEvent {
    /// Creates a new audit event with a consistent timestamp.
    #[must_use]
    pub fn new(params: McpAuditEventParams) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: "mcp_tool_call",
            timestamp_ms,
            request_id: params.request_id,
            tool: params.tool,
            operation: params.operation,
            outcome: params.outcome,
            error_kind: params.error_kind,
            duration_ms: params.duration_ms,
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink for tool calls and session events.
pub trait McpAuditSink: SessionDiagnostics {
    /// Record a tool call audit event.
    fn record(&self, event: &McpAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct McpStderrAuditSink;

impl McpAuditSink for McpStderrAuditSink {
    fn record(&self, event: &McpAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

impl SessionDiagnostics for McpStderrAuditSink {
    fn record_session(&self, event: &SessionEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct McpFileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl McpFileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Appends one serialized line.
    fn append(&self, payload: &str) {
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

impl McpAuditSink for McpFileAuditSink {
    fn record(&self, event: &McpAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            self.append(&payload);
        }
    }
}

impl SessionDiagnostics for McpFileAuditSink {
    fn record_session(&self, event: &SessionEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            self.append(&payload);
        }
    }
}

/// No-op audit sink.
pub struct McpNoopAuditSink;

impl McpAuditSink for McpNoopAuditSink {
    fn record(&self, _event: &McpAuditEvent) {}
}

impl SessionDiagnostics for McpNoopAuditSink {
    fn record_session(&self, _event: &SessionEvent) {}
}

/// Builds the sink selected by `[server.audit]`.
///
/// # Errors
///
/// Returns an error when the audit file cannot be opened.
pub fn audit_sink_from_config(config: &ServerAuditConfig) -> io::Result<Arc<dyn McpAuditSink>> {
    if !config.enabled {
        return Ok(Arc::new(McpNoopAuditSink));
    }
    match &config.path {
        Some(path) => Ok(Arc::new(McpFileAuditSink::new(Path::new(path.trim()))?)),
        None => Ok(Arc::new(McpStderrAuditSink)),
    }
}
