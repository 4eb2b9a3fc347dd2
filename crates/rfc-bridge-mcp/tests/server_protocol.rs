//! JSON-RPC protocol tests for rfc-bridge-mcp.
// crates/rfc-bridge-mcp/tests/server_protocol.rs
// ============================================================================
// Module: Server Protocol Tests
// Description: Exercise JSON-RPC envelopes and the stdio transport.
// Purpose: Ensure MCP methods, notifications, and framing behave as clients expect.
// Dependencies: rfc-bridge-core, rfc-bridge-mcp, tokio
// ============================================================================

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use std::collections::BTreeMap;
use std::io::BufReader;
use std::io::Cursor;
use std::io::Write;
use std::sync::Arc;
use std::sync::Mutex;

use rfc_bridge_core::RfcErrorInfo;
use rfc_bridge_core::SessionError;
use rfc_bridge_mcp::McpServerError;
use rfc_bridge_mcp::ToolRouter;
use rfc_bridge_mcp::framing::FrameStyle;
use rfc_bridge_mcp::framing::FramingError;
use rfc_bridge_mcp::framing::read_message;
use rfc_bridge_mcp::handle_message;
use rfc_bridge_mcp::serve_stdio;
use rfc_bridge_mcp::server::DEFAULT_PROTOCOL_VERSION;
use rfc_bridge_mcp::server::SERVER_NAME;
use serde_json::Value;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::common::FakeClient;
use crate::common::harness;

type TestResult = Result<(), String>;

/// Writer whose bytes stay readable after the server drops its handle.
#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn router() -> ToolRouter {
    harness(FakeClient::default()).router
}

fn call(router: &ToolRouter, request: &Value) -> Option<Value> {
    let payload = serde_json::to_vec(request).unwrap();
    handle_message(router, &payload, &CancellationToken::new())
        .map(|reply| serde_json::to_value(reply).unwrap())
}

fn content_length(payload: &Value) -> Vec<u8> {
    let body = serde_json::to_vec(payload).unwrap();
    let mut framed = format!("Content-Length: {}\r\n\r\n", body.len()).into_bytes();
    framed.extend_from_slice(&body);
    framed
}

fn line(payload: &Value) -> Vec<u8> {
    let mut framed = serde_json::to_vec(payload).unwrap();
    framed.push(b'\n');
    framed
}

/// Reads every reply frame keyed by its numeric id.
fn replies(bytes: Vec<u8>) -> BTreeMap<u64, (FrameStyle, Value)> {
    let mut reader = BufReader::new(Cursor::new(bytes));
    let mut replies = BTreeMap::new();
    loop {
        match read_message(&mut reader, 1 << 20) {
            Ok(frame) => {
                let value: Value = serde_json::from_slice(&frame.payload).unwrap();
                let id = value["id"].as_u64().unwrap();
                replies.insert(id, (frame.style, value));
            }
            Err(FramingError::Closed) => return replies,
            Err(err) => panic!("unreadable reply stream: {err}"),
        }
    }
}

// ============================================================================
// SECTION: Method Dispatch
// ============================================================================

#[test]
fn initialize_echoes_protocol_version_and_server_info() {
    let router = router();
    let reply = call(
        &router,
        &json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {"protocolVersion": "2025-03-26"}}),
    )
    .unwrap();
    assert_eq!(reply["id"], 1);
    assert_eq!(reply["result"]["protocolVersion"], "2025-03-26");
    assert_eq!(reply["result"]["serverInfo"]["name"], SERVER_NAME);
    assert_eq!(reply["result"]["capabilities"]["tools"]["listChanged"], false);
    assert!(reply.get("error").is_none());

    let reply = call(&router, &json!({"jsonrpc": "2.0", "id": 2, "method": "initialize"})).unwrap();
    assert_eq!(reply["result"]["protocolVersion"], DEFAULT_PROTOCOL_VERSION);
}

#[test]
fn notifications_receive_no_reply() {
    let router = router();
    let reply = call(&router, &json!({"jsonrpc": "2.0", "method": "notifications/initialized"}));
    assert!(reply.is_none());
}

#[test]
fn ping_and_tools_list_succeed() -> TestResult {
    let router = router();
    let reply = call(&router, &json!({"jsonrpc": "2.0", "id": "a", "method": "ping"}))
        .ok_or("missing ping reply")?;
    assert_eq!(reply["result"], json!({}));
    let reply = call(&router, &json!({"jsonrpc": "2.0", "id": 3, "method": "tools/list"}))
        .ok_or("missing tools/list reply")?;
    let tools = reply["result"]["tools"].as_array().ok_or("tools is not an array")?;
    if tools.len() != 9 {
        return Err(format!("expected 9 tools, got {}", tools.len()));
    }
    Ok(())
}

#[test]
fn protocol_errors_use_json_rpc_codes() {
    let router = router();
    let reply = handle_message(&router, b"{not json", &CancellationToken::new()).unwrap();
    let reply = serde_json::to_value(reply).unwrap();
    assert_eq!(reply["error"]["code"], -32700);
    assert_eq!(reply["id"], Value::Null);

    let reply = call(&router, &json!({"jsonrpc": "2.0", "id": 4})).unwrap();
    assert_eq!(reply["error"]["code"], -32600);
    assert_eq!(reply["id"], 4);

    let reply = call(&router, &json!({"jsonrpc": "1.0", "id": 5, "method": "ping"})).unwrap();
    assert_eq!(reply["error"]["code"], -32600);

    let reply = call(&router, &json!({"jsonrpc": "2.0", "id": 6, "method": "resources/list"})).unwrap();
    assert_eq!(reply["error"]["code"], -32601);
}

// ============================================================================
// SECTION: Tool Calls
// ============================================================================

#[test]
fn tool_failures_are_reported_as_error_content() {
    let client = FakeClient {
        ping_error: Some(SessionError::BusinessFault(RfcErrorInfo::new(
            "RFC_ABAP_EXCEPTION",
            "SYSTEM_FAILURE",
        ))),
        ..FakeClient::default()
    };
    let router = harness(client).router;
    let reply = call(
        &router,
        &json!({"jsonrpc": "2.0", "id": 7, "method": "tools/call", "params": {"name": "rfc_ping"}}),
    )
    .unwrap();
    assert_eq!(reply["result"]["isError"], true);
    assert_eq!(reply["result"]["content"][0]["type"], "text");
    let text = reply["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("SYSTEM_FAILURE"), "{text}");
}

#[test]
fn tool_results_are_pretty_printed_json_text() {
    let router = router();
    let reply = call(
        &router,
        &json!({"jsonrpc": "2.0", "id": 8, "method": "tools/call", "params": {"name": "metrics_get", "arguments": {}}}),
    )
    .unwrap();
    assert_eq!(reply["result"]["isError"], false);
    let text = reply["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("\n  \"total\": 0"), "{text}");
}

#[test]
fn unknown_tools_and_bad_params_are_invalid_params() {
    let router = router();
    let reply = call(
        &router,
        &json!({"jsonrpc": "2.0", "id": 9, "method": "tools/call", "params": {"name": "rfc_exec"}}),
    )
    .unwrap();
    assert_eq!(reply["error"]["code"], -32602);
    assert_eq!(reply["error"]["message"], "unknown tool: rfc_exec");

    let reply =
        call(&router, &json!({"jsonrpc": "2.0", "id": 10, "method": "tools/call", "params": 5}))
            .unwrap();
    assert_eq!(reply["error"]["code"], -32602);
}

// ============================================================================
// SECTION: Stdio Transport
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn stdio_replies_in_the_style_of_each_request() {
    let mut input = content_length(&json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}));
    input.extend(line(&json!({"jsonrpc": "2.0", "method": "notifications/initialized"})));
    input.extend(line(&json!({"jsonrpc": "2.0", "id": 2, "method": "ping"})));
    input.extend(b"\r\n");
    input.extend(content_length(&json!({
        "jsonrpc": "2.0",
        "id": 3,
        "method": "tools/call",
        "params": {"name": "rfc_ping"}
    })));
    let output = SharedBuffer::default();
    serve_stdio(router(), Cursor::new(input), output.clone(), 1 << 20, CancellationToken::new())
        .await
        .unwrap();

    let replies = replies(output.0.lock().unwrap().clone());
    assert_eq!(replies.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
    assert_eq!(replies[&1].0, FrameStyle::ContentLength);
    assert_eq!(replies[&2].0, FrameStyle::Line);
    assert_eq!(replies[&3].0, FrameStyle::ContentLength);
    assert_eq!(replies[&3].1["result"]["isError"], false);
}

#[tokio::test(flavor = "multi_thread")]
async fn stdio_oversized_frame_fails_and_cancels() {
    let input = content_length(&json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}));
    let shutdown = CancellationToken::new();
    let result =
        serve_stdio(router(), Cursor::new(input), SharedBuffer::default(), 8, shutdown.clone())
            .await;
    assert!(matches!(result, Err(McpServerError::Transport(_))));
    assert!(shutdown.is_cancelled());
}

#[tokio::test(flavor = "multi_thread")]
async fn stdio_empty_input_ends_cleanly() {
    let output = SharedBuffer::default();
    serve_stdio(router(), Cursor::new(Vec::new()), output.clone(), 1024, CancellationToken::new())
        .await
        .unwrap();
    assert!(output.0.lock().unwrap().is_empty());
}
