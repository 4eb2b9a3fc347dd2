// crates/rfc-bridge-mcp/src/lib.rs
// ============================================================================
// Module: RFC Bridge MCP
// Description: MCP server, tool router, and native session bridge.
// Purpose: Expose remote function modules to MCP clients.
// Dependencies: rfc-bridge-core, rfc-bridge-config, axum, tokio
// ============================================================================

//! ## Overview
//! RFC bridge MCP exposes the remote system through MCP tools. All tools are
//! thin wrappers over an [`rfc_bridge_core::RfcClient`], normally the
//! [`rfc_bridge_core::SessionManager`] driving a [`StdioBridgeConnector`]
//! helper process. Tool calls and session events are audited as JSON lines.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod bridge;
pub mod framing;
pub mod server;
pub mod tools;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::McpAuditEvent;
pub use audit::McpAuditSink;
pub use audit::McpFileAuditSink;
pub use audit::McpNoopAuditSink;
pub use audit::McpStderrAuditSink;
pub use audit::ToolOutcome;
pub use audit::audit_sink_from_config;
pub use bridge::StdioBridgeConnector;
pub use bridge::StdioBridgeSession;
pub use server::McpServer;
pub use server::McpServerError;
pub use server::handle_message;
pub use server::serve_stdio;
pub use tools::ToolError;
pub use tools::ToolName;
pub use tools::ToolOutput;
pub use tools::ToolRouter;
