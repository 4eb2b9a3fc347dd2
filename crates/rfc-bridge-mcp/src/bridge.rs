// crates/rfc-bridge-mcp/src/bridge.rs
// ============================================================================
// Module: Native Session Bridge
// Description: Session connector backed by a native helper process.
// Purpose: Reach the RFC library through a framed JSON-RPC child process.
// Dependencies: rfc-bridge-core, rfc-bridge-config, serde_json
// ============================================================================

//! ## Overview
//! The native RFC library is linked into a separate helper executable. Each
//! [`StdioBridgeSession`] owns one helper process and talks to it with
//! `Content-Length` framed JSON-RPC 2.0 over the child's stdin and stdout.
//! The helper's stderr is inherited so its diagnostics reach the operator.
//!
//! Helper-reported faults carry `error.data = {code, group, key, message}`
//! and are classified with [`SessionError::remote`]. Broken pipes, early EOF,
//! and oversized or malformed frames become connection faults with
//! [`rfc_bridge_core::COMMUNICATION_FAILURE`], so the session manager replaces
//! the helper on retry. Dropping a session kills and reaps its process.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::io::BufReader;
use std::process::Child;
use std::process::ChildStdin;
use std::process::ChildStdout;
use std::process::Command;
use std::process::Stdio;

use rfc_bridge_config::BridgeConfig;
use rfc_bridge_core::CoercedTree;
use rfc_bridge_core::ConnectionSpec;
use rfc_bridge_core::InterfaceDescription;
use rfc_bridge_core::NativeSession;
use rfc_bridge_core::ResultMap;
use rfc_bridge_core::RfcErrorInfo;
use rfc_bridge_core::SessionConnector;
use rfc_bridge_core::SessionError;
use serde::Deserialize;
use serde_json::Value;
use serde_json::json;

use crate::framing::FrameStyle;
use crate::framing::FramingError;
use crate::framing::read_message;
use crate::framing::write_message;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Error code for a helper that cannot be started.
pub const BRIDGE_SPAWN_FAILURE: &str = "BRIDGE_SPAWN_FAILURE";

/// Error code for helper errors without structured data.
pub const BRIDGE_ERROR: &str = "BRIDGE_ERROR";

// ============================================================================
// SECTION: Connector
// ============================================================================

/// Spawns one helper process per session.
#[derive(Debug, Clone)]
pub struct StdioBridgeConnector {
    /// Helper program and arguments.
    command: Vec<String>,
    /// Largest response frame accepted from the helper.
    max_frame_bytes: usize,
}

impl StdioBridgeConnector {
    /// Creates a connector for the given helper command.
    #[must_use]
    pub const fn new(command: Vec<String>, max_frame_bytes: usize) -> Self {
        Self {
            command,
            max_frame_bytes,
        }
    }

    /// Creates a connector from the `[bridge]` configuration.
    #[must_use]
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(config.command.clone(), config.max_frame_bytes)
    }

    /// Starts the helper process with piped stdio.
    fn spawn(&self) -> Result<Child, SessionError> {
        let Some((program, args)) = self.command.split_first() else {
            return Err(SessionError::Connect(RfcErrorInfo::new(
                BRIDGE_SPAWN_FAILURE,
                "bridge command is empty",
            )));
        };
        Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|err| {
                SessionError::Connect(RfcErrorInfo::new(
                    BRIDGE_SPAWN_FAILURE,
                    format!("failed to start {program}: {err}"),
                ))
            })
    }
}

impl SessionConnector for StdioBridgeConnector {
    type Session = StdioBridgeSession;

    fn connect(&self, spec: &ConnectionSpec) -> Result<Self::Session, SessionError> {
        let mut child = self.spawn()?;
        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(SessionError::Connect(RfcErrorInfo::communication_failure(
                "helper stdio unavailable",
            )));
        };
        let mut session = StdioBridgeSession {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            next_id: 1,
            max_frame_bytes: self.max_frame_bytes,
            library_version: None,
        };
        let result = session
            .request("connect", json!({ "parameters": spec.parameters() }))
            .map_err(into_connect_error)?;
        session.library_version =
            result.get("library_version").and_then(Value::as_str).map(str::to_string);
        Ok(session)
    }
}

// ============================================================================
// SECTION: Session
// ============================================================================

/// One live helper process.
pub struct StdioBridgeSession {
    /// Helper process handle.
    child: Child,
    /// Request stream to the helper.
    stdin: ChildStdin,
    /// Response stream from the helper.
    stdout: BufReader<ChildStdout>,
    /// Next JSON-RPC request identifier.
    next_id: u64,
    /// Largest response frame accepted from the helper.
    max_frame_bytes: usize,
    /// Library version reported at connect.
    library_version: Option<String>,
}

/// JSON-RPC response from the helper.
#[derive(Debug, Deserialize)]
struct BridgeResponse {
    /// Request identifier echoed by the helper.
    #[serde(default)]
    id: Option<u64>,
    /// Success payload.
    #[serde(default)]
    result: Option<Value>,
    /// Error payload.
    #[serde(default)]
    error: Option<BridgeErrorPayload>,
}

/// JSON-RPC error object from the helper.
#[derive(Debug, Deserialize)]
struct BridgeErrorPayload {
    /// Human-readable message.
    #[serde(default)]
    message: String,
    /// Structured RFC error signature.
    #[serde(default)]
    data: Option<RfcErrorInfo>,
}

impl StdioBridgeSession {
    /// Sends one request and waits for its response.
    fn request(&mut self, method: &str, params: Value) -> Result<Value, SessionError> {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        let envelope = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        let payload = serde_json::to_vec(&envelope)
            .map_err(|err| protocol_fault(format!("encode {method} request: {err}")))?;
        write_message(&mut self.stdin, &payload, FrameStyle::ContentLength)
            .map_err(transport_fault)?;
        let frame = read_message(&mut self.stdout, self.max_frame_bytes).map_err(transport_fault)?;
        let response: BridgeResponse = serde_json::from_slice(&frame.payload)
            .map_err(|err| protocol_fault(format!("malformed {method} response: {err}")))?;
        if response.id != Some(id) {
            return Err(protocol_fault(format!("{method} response id mismatch")));
        }
        if let Some(error) = response.error {
            let info =
                error.data.unwrap_or_else(|| RfcErrorInfo::new(BRIDGE_ERROR, error.message));
            return Err(SessionError::remote(info));
        }
        Ok(response.result.unwrap_or(Value::Null))
    }
}

impl NativeSession for StdioBridgeSession {
    fn ping(&mut self) -> Result<(), SessionError> {
        self.request("ping", json!({})).map(|_| ())
    }

    fn attributes(&mut self) -> Result<BTreeMap<String, String>, SessionError> {
        let result = self.request("attributes", json!({}))?;
        let Value::Object(map) = result else {
            return Err(protocol_fault("attributes response must be an object".to_string()));
        };
        Ok(map
            .into_iter()
            .map(|(key, value)| match value {
                Value::String(text) => (key, text),
                other => (key, other.to_string()),
            })
            .collect())
    }

    fn describe(&mut self, name: &str) -> Result<InterfaceDescription, SessionError> {
        let result = self.request("describe", json!({ "name": name }))?;
        serde_json::from_value(result)
            .map_err(|err| protocol_fault(format!("malformed describe response: {err}")))
    }

    fn invoke(&mut self, name: &str, parameters: &CoercedTree) -> Result<ResultMap, SessionError> {
        let parameters = serde_json::to_value(parameters)
            .map_err(|err| protocol_fault(format!("encode {name} parameters: {err}")))?;
        let result = self.request("invoke", json!({ "name": name, "parameters": parameters }))?;
        match result {
            Value::Object(map) => Ok(map),
            Value::Null => Ok(ResultMap::new()),
            _ => Err(protocol_fault("invoke response must be an object".to_string())),
        }
    }

    fn library_version(&self) -> Option<String> {
        self.library_version.clone()
    }
}

impl Drop for StdioBridgeSession {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Maps framing failures to connection faults.
fn transport_fault(err: FramingError) -> SessionError {
    SessionError::ConnectionFault(RfcErrorInfo::communication_failure(format!(
        "helper transport: {err}"
    )))
}

/// Maps protocol violations to connection faults.
fn protocol_fault(message: String) -> SessionError {
    SessionError::ConnectionFault(RfcErrorInfo::communication_failure(message))
}

/// Reclassifies faults raised during connect as connect errors.
fn into_connect_error(err: SessionError) -> SessionError {
    match err {
        SessionError::ConnectionFault(info) | SessionError::BusinessFault(info) => {
            SessionError::Connect(info)
        }
        other => other,
    }
}
