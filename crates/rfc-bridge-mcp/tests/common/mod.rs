// crates/rfc-bridge-mcp/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: Shared fakes and router builders for MCP tests.
// Purpose: Exercise tool routing without a native helper process.
// Dependencies: rfc-bridge-core, rfc-bridge-mcp
// ============================================================================

//! ## Overview
//! Provides a scripted [`RfcClient`] that records every remote call and an
//! audit sink that keeps events in memory.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use rfc_bridge_config::QueryConfig;
use rfc_bridge_core::CallMetrics;
use rfc_bridge_core::CoercedTree;
use rfc_bridge_core::ConnectionAttributes;
use rfc_bridge_core::InterfaceDescription;
use rfc_bridge_core::ResultMap;
use rfc_bridge_core::RfcClient;
use rfc_bridge_core::RfcErrorInfo;
use rfc_bridge_core::SessionDiagnostics;
use rfc_bridge_core::SessionError;
use rfc_bridge_core::SessionEvent;
use rfc_bridge_mcp::McpAuditEvent;
use rfc_bridge_mcp::McpAuditSink;
use rfc_bridge_mcp::ToolRouter;
use serde_json::Value;
use serde_json::json;
use tokio_util::sync::CancellationToken;

// ============================================================================
// SECTION: Fake Client
// ============================================================================

/// One recorded remote invocation.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub name: String,
    pub parameters: CoercedTree,
}

/// Scripted client returning canned descriptions and results.
#[derive(Default)]
pub struct FakeClient {
    pub descriptions: BTreeMap<String, InterfaceDescription>,
    pub results: Mutex<BTreeMap<String, Result<ResultMap, SessionError>>>,
    pub invocations: Mutex<Vec<Invocation>>,
    pub describes: Mutex<Vec<String>>,
    pub ping_error: Option<SessionError>,
}

impl FakeClient {
    /// Scripts the result of one function module.
    pub fn with_result(self, name: &str, result: Result<Value, SessionError>) -> Self {
        let result = result.map(|value| match value {
            Value::Object(map) => map,
            _ => ResultMap::new(),
        });
        self.results.lock().unwrap().insert(name.to_string(), result);
        self
    }

    /// Registers an interface description.
    pub fn with_description(mut self, description: Value) -> Self {
        let description: InterfaceDescription = serde_json::from_value(description).unwrap();
        self.descriptions.insert(description.name.clone(), description);
        self
    }

    /// Returns every recorded invocation.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }
}

impl RfcClient for FakeClient {
    fn ping(&self, _cancel: &CancellationToken) -> Result<(), SessionError> {
        self.ping_error.clone().map_or(Ok(()), Err)
    }

    fn connection_attributes(
        &self,
        _cancel: &CancellationToken,
    ) -> Result<ConnectionAttributes, SessionError> {
        Ok(ConnectionAttributes {
            connection: BTreeMap::from([
                ("client".to_string(), "001".to_string()),
                ("sysId".to_string(), "NPL".to_string()),
            ]),
            sdk_version: Some("7.50.13".to_string()),
        })
    }

    fn describe(
        &self,
        name: &str,
        _cancel: &CancellationToken,
    ) -> Result<InterfaceDescription, SessionError> {
        self.describes.lock().unwrap().push(name.to_string());
        self.descriptions.get(name).cloned().ok_or_else(|| {
            SessionError::BusinessFault(RfcErrorInfo::new(
                "FU_NOT_FOUND",
                format!("ID:FL Type:E Number:046 {name}"),
            ))
        })
    }

    fn invoke(
        &self,
        name: &str,
        parameters: &CoercedTree,
        _cancel: &CancellationToken,
    ) -> Result<ResultMap, SessionError> {
        self.invocations.lock().unwrap().push(Invocation {
            name: name.to_string(),
            parameters: parameters.clone(),
        });
        self.results.lock().unwrap().get(name).cloned().unwrap_or_else(|| Ok(ResultMap::new()))
    }
}

// ============================================================================
// SECTION: Recording Audit Sink
// ============================================================================

/// Audit sink keeping events in memory.
#[derive(Default)]
pub struct RecordingAuditSink {
    pub tool_events: Mutex<Vec<McpAuditEvent>>,
    pub session_events: Mutex<Vec<SessionEvent>>,
}

impl McpAuditSink for RecordingAuditSink {
    fn record(&self, event: &McpAuditEvent) {
        self.tool_events.lock().unwrap().push(event.clone());
    }
}

impl SessionDiagnostics for RecordingAuditSink {
    fn record_session(&self, event: &SessionEvent) {
        self.session_events.lock().unwrap().push(event.clone());
    }
}

// ============================================================================
// SECTION: Router Fixtures
// ============================================================================

/// Router wired to inspectable fakes.
pub struct Harness {
    pub router: ToolRouter,
    pub client: Arc<FakeClient>,
    pub metrics: Arc<CallMetrics>,
    pub audit: Arc<RecordingAuditSink>,
}

/// Builds a router over the given client with default query settings.
pub fn harness(client: FakeClient) -> Harness {
    harness_with_query(client, QueryConfig::default())
}

/// Builds a router over the given client and query settings.
pub fn harness_with_query(client: FakeClient, query: QueryConfig) -> Harness {
    let client = Arc::new(client);
    let metrics = Arc::new(CallMetrics::new());
    let audit = Arc::new(RecordingAuditSink::default());
    let router = ToolRouter::new(client.clone(), Arc::clone(&metrics), audit.clone(), query);
    Harness {
        router,
        client,
        metrics,
        audit,
    }
}

/// Interface with one character import and one character export.
pub fn stfc_connection() -> Value {
    json!({
        "name": "STFC_CONNECTION",
        "parameters": [
            {"name": "REQUTEXT", "parameter_type": "RFCTYPE_CHAR", "direction": "RFC_IMPORT", "length": 255},
            {"name": "ECHOTEXT", "parameter_type": "RFCTYPE_CHAR", "direction": "RFC_EXPORT", "length": 255}
        ]
    })
}

/// Interface with an integer import and a date import.
pub fn flight_lookup() -> Value {
    json!({
        "name": "Z_FLIGHT_LOOKUP",
        "parameters": [
            {"name": "MAX_ROWS", "parameter_type": "RFCTYPE_INT", "direction": "RFC_IMPORT", "optional": true},
            {"name": "FLDATE", "parameter_type": "RFCTYPE_DATE", "direction": "RFC_IMPORT", "length": 8}
        ]
    })
}

/// Fixed-width table read result with two fields and two rows.
pub fn table_texts_result() -> Value {
    json!({
        "FIELDS": [
            {"FIELDNAME": "TABNAME", "OFFSET": "000000", "LENGTH": "000030"},
            {"FIELDNAME": "DDTEXT", "OFFSET": "000030", "LENGTH": "000060"}
        ],
        "DATA": [
            {"WA": format!("{:<30}{}", "VBAK", "Sales Document: Header Data")},
            {"WA": format!("{:<30}{}", "VBAP", "Sales Document: Item Data")}
        ]
    })
}
