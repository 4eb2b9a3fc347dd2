// crates/rfc-bridge-mcp/src/tools.rs
// ============================================================================
// Module: MCP Tool Router
// Description: Tool catalog and dispatch for the RFC bridge.
// Purpose: Expose thin wrappers over the retrying RFC client.
// Dependencies: rfc-bridge-core, rfc-bridge-config, serde_json, tokio-util
// ============================================================================

//! ## Overview
//! The tool router maps MCP tool calls onto [`RfcClient`] operations. Every
//! handler is synchronous and may block on the session lock, so transports
//! run it on a blocking worker.
//!
//! ## Invariants
//! - Function and table names are uppercased before they reach the remote
//!   system.
//! - `rfc_call` validates parameter names against the interface description
//!   before coercing values.
//! - Metrics record only the remote call itself; argument errors are not
//!   counted.
//! - Every call emits exactly one audit event.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Instant;

use rfc_bridge_config::QueryConfig;
use rfc_bridge_core::CallMetrics;
use rfc_bridge_core::CoercedTree;
use rfc_bridge_core::CoercionError;
use rfc_bridge_core::RfcClient;
use rfc_bridge_core::RfcValue;
use rfc_bridge_core::RowDecodeError;
use rfc_bridge_core::SessionError;
use rfc_bridge_core::coerce_parameters;
use rfc_bridge_core::decode_rows;
use rfc_bridge_core::validate_parameters;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::audit::McpAuditEvent;
use crate::audit::McpAuditEventParams;
use crate::audit::McpAuditSink;
use crate::audit::ToolOutcome;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Reply text for a successful ping.
pub const PING_REPLY: &str = "PONG — SAP system is reachable.";

/// Dictionary field lookup function module.
const FIELD_INFO_FUNCTION: &str = "DDIF_FIELDINFO_GET";
/// Foreign key lookup function module.
const FOREIGN_KEY_FUNCTION: &str = "FAPI_GET_FOREIGN_KEY_RELATIONS";
/// Generic table reader function module.
const READ_TABLE_FUNCTION: &str = "RFC_READ_TABLE";
/// Table holding table short texts.
const TABLE_TEXTS: &str = "DD02T";
/// Width of one `OPTIONS` line accepted by the table reader.
pub const WHERE_LINE_WIDTH: usize = 72;

// ============================================================================
// SECTION: Tool Catalog
// ============================================================================

/// Tools exposed by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    /// Check connectivity.
    RfcPing,
    /// Report connection attributes and library version.
    RfcConnectionInfo,
    /// Describe a function module interface.
    RfcDescribe,
    /// Invoke a function module.
    RfcCall,
    /// Read dictionary field metadata for a table.
    GetTableMetadata,
    /// Read foreign key relations for a table.
    GetTableRelations,
    /// Search table short texts.
    SearchSapTables,
    /// Read rows from a table.
    ReadTable,
    /// Report call statistics.
    MetricsGet,
}

impl ToolName {
    /// Every tool in catalog order.
    pub const ALL: [Self; 9] = [
        Self::RfcPing,
        Self::RfcConnectionInfo,
        Self::RfcDescribe,
        Self::RfcCall,
        Self::GetTableMetadata,
        Self::GetTableRelations,
        Self::SearchSapTables,
        Self::ReadTable,
        Self::MetricsGet,
    ];

    /// Returns the canonical string name for the tool.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RfcPing => "rfc_ping",
            Self::RfcConnectionInfo => "rfc_connection_info",
            Self::RfcDescribe => "rfc_describe",
            Self::RfcCall => "rfc_call",
            Self::GetTableMetadata => "get_table_metadata",
            Self::GetTableRelations => "get_table_relations",
            Self::SearchSapTables => "search_sap_tables",
            Self::ReadTable => "read_table",
            Self::MetricsGet => "metrics_get",
        }
    }

    /// Parses a tool name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.as_str() == name)
    }

    /// Returns the client-facing description.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::RfcPing => "Verify SAP connectivity by pinging the connected system.",
            Self::RfcConnectionInfo => {
                "Get SAP connection attributes (SID, client, host, user) and NW RFC SDK version."
            }
            Self::RfcDescribe => {
                "Get function module metadata: parameters, types, directions, and optionally \
                 field details for structures/tables."
            }
            Self::RfcCall => {
                "Invoke an RFC function module with parameters and return the result. Parameter \
                 names are case-insensitive."
            }
            Self::GetTableMetadata => {
                "Retrieve field details (name, type, length, domain, description) for a SAP table \
                 via DDIF_FIELDINFO_GET."
            }
            Self::GetTableRelations => {
                "Retrieve foreign-key relationships and cardinalities for a SAP table via \
                 FAPI_GET_FOREIGN_KEY_RELATIONS."
            }
            Self::SearchSapTables => {
                "Search SAP tables by description/business term via RFC_READ_TABLE on DD02T. Use \
                 % as wildcard (e.g. '%material%')."
            }
            Self::ReadTable => {
                "Read rows from a SAP table via RFC_READ_TABLE with an optional field list and \
                 WHERE clause."
            }
            Self::MetricsGet => {
                "Return RFC call statistics: total/success/failure counts, durations, and \
                 per-function call counts."
            }
        }
    }

    /// Returns the JSON schema for the tool input.
    #[must_use]
    pub fn input_schema(self) -> Value {
        match self {
            Self::RfcPing | Self::RfcConnectionInfo | Self::MetricsGet => {
                json!({"type": "object", "properties": {}})
            }
            Self::RfcDescribe => json!({
                "type": "object",
                "properties": {
                    "function_name": {
                        "type": "string",
                        "description": "Name of the RFC function module (e.g. STFC_CONNECTION)"
                    }
                },
                "required": ["function_name"]
            }),
            Self::RfcCall => json!({
                "type": "object",
                "properties": {
                    "function_name": {
                        "type": "string",
                        "description": "Name of the RFC function module to call"
                    },
                    "parameters": {
                        "type": "object",
                        "description": "Input parameters (IMPORT/CHANGING/TABLE). DATE fields use \
                                        YYYYMMDD, TIME fields use HHMMSS, BYTE/XSTRING fields use \
                                        base64."
                    }
                },
                "required": ["function_name"]
            }),
            Self::GetTableMetadata => json!({
                "type": "object",
                "properties": {
                    "table_name": {
                        "type": "string",
                        "description": "SAP table name (e.g. SFLIGHT)"
                    },
                    "language": {
                        "type": "string",
                        "description": "Language key for descriptions (default: D)"
                    }
                },
                "required": ["table_name"]
            }),
            Self::GetTableRelations => json!({
                "type": "object",
                "properties": {
                    "table_name": {"type": "string", "description": "SAP table name"}
                },
                "required": ["table_name"]
            }),
            Self::SearchSapTables => json!({
                "type": "object",
                "properties": {
                    "search_term": {
                        "type": "string",
                        "description": "Text to search for with LIKE semantics (% as wildcard)"
                    },
                    "language": {"type": "string", "description": "Language key (default: D)"},
                    "max_results": {
                        "type": "integer",
                        "description": "Maximum results to return (default: 100)"
                    }
                },
                "required": ["search_term"]
            }),
            Self::ReadTable => json!({
                "type": "object",
                "properties": {
                    "table_name": {"type": "string", "description": "SAP table name"},
                    "fields": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Field names to return (default: all fields)"
                    },
                    "where": {
                        "type": "string",
                        "description": "Open SQL WHERE clause without the WHERE keyword"
                    },
                    "max_results": {
                        "type": "integer",
                        "description": "Maximum rows to return (default: 100)"
                    },
                    "skip": {"type": "integer", "description": "Rows to skip before reading"}
                },
                "required": ["table_name"]
            }),
        }
    }
}

/// Tool definition advertised through `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    /// Tool name.
    pub name: ToolName,
    /// Tool description for clients.
    pub description: String,
    /// JSON schema for tool input.
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Successful tool payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    /// Plain text reply.
    Text(String),
    /// Structured reply rendered as indented JSON text.
    Json(Value),
}

// ============================================================================
// SECTION: Arguments
// ============================================================================

/// Arguments naming one function module.
#[derive(Debug, Deserialize)]
struct FunctionArgs {
    /// Function module name.
    #[serde(default)]
    function_name: String,
}

/// Arguments for `rfc_call`.
#[derive(Debug, Deserialize)]
struct CallArgs {
    /// Function module name.
    #[serde(default)]
    function_name: String,
    /// Input parameter tree.
    #[serde(default)]
    parameters: Option<Map<String, Value>>,
}

/// Arguments naming one table.
#[derive(Debug, Deserialize)]
struct TableArgs {
    /// Table name.
    #[serde(default)]
    table_name: String,
    /// Language key.
    #[serde(default)]
    language: Option<String>,
}

/// Arguments for `search_sap_tables`.
#[derive(Debug, Deserialize)]
struct SearchArgs {
    /// LIKE pattern.
    #[serde(default)]
    search_term: String,
    /// Language key.
    #[serde(default)]
    language: Option<String>,
    /// Row limit.
    #[serde(default)]
    max_results: Option<i64>,
}

/// Arguments for `read_table`.
#[derive(Debug, Deserialize)]
struct ReadTableArgs {
    /// Table name.
    #[serde(default)]
    table_name: String,
    /// Field names to select.
    #[serde(default)]
    fields: Vec<String>,
    /// WHERE clause body.
    #[serde(default, rename = "where")]
    where_clause: Option<String>,
    /// Row limit.
    #[serde(default)]
    max_results: Option<i64>,
    /// Rows to skip.
    #[serde(default)]
    skip: Option<u32>,
}

// ============================================================================
// SECTION: Router
// ============================================================================

/// Tool router shared by every transport.
#[derive(Clone)]
pub struct ToolRouter {
    /// Retrying RFC client.
    client: Arc<dyn RfcClient>,
    /// Process-wide call metrics.
    metrics: Arc<CallMetrics>,
    /// Audit sink for tool calls.
    audit: Arc<dyn McpAuditSink>,
    /// Table query defaults.
    query: QueryConfig,
}

impl ToolRouter {
    /// Creates a router over the given client, metrics, and audit sink.
    #[must_use]
    pub fn new(
        client: Arc<dyn RfcClient>,
        metrics: Arc<CallMetrics>,
        audit: Arc<dyn McpAuditSink>,
        query: QueryConfig,
    ) -> Self {
        Self {
            client,
            metrics,
            audit,
            query,
        }
    }

    /// Returns the tool catalog.
    #[must_use]
    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        ToolName::ALL
            .into_iter()
            .map(|tool| ToolDefinition {
                name: tool,
                description: tool.description().to_string(),
                input_schema: tool.input_schema(),
            })
            .collect()
    }

    /// Handles a tool call by name with JSON arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError`] when the tool is unknown or the call fails.
    pub fn handle_tool_call(
        &self,
        request_id: Option<String>,
        name: &str,
        arguments: Value,
        cancel: &CancellationToken,
    ) -> Result<ToolOutput, ToolError> {
        let tool = ToolName::parse(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        let arguments = if arguments.is_null() { json!({}) } else { arguments };
        let started = Instant::now();
        let mut operation = None;
        let outcome = self.dispatch(tool, arguments, cancel, &mut operation);
        self.audit.record(&McpAuditEvent::new(McpAuditEventParams {
            request_id,
            tool,
            operation,
            outcome: if outcome.is_ok() { ToolOutcome::Success } else { ToolOutcome::Failure },
            error_kind: outcome.as_ref().err().map(ToolError::kind),
            duration_ms: started.elapsed().as_millis(),
        }));
        outcome
    }

    /// Routes a parsed tool call to its handler.
    fn dispatch(
        &self,
        tool: ToolName,
        arguments: Value,
        cancel: &CancellationToken,
        operation: &mut Option<String>,
    ) -> Result<ToolOutput, ToolError> {
        match tool {
            ToolName::RfcPing => self.handle_ping(cancel),
            ToolName::RfcConnectionInfo => self.handle_connection_info(cancel),
            ToolName::RfcDescribe => self.handle_describe(arguments, cancel, operation),
            ToolName::RfcCall => self.handle_call(arguments, cancel, operation),
            ToolName::GetTableMetadata => {
                *operation = Some(FIELD_INFO_FUNCTION.to_string());
                self.handle_table_metadata(arguments, cancel)
            }
            ToolName::GetTableRelations => {
                *operation = Some(FOREIGN_KEY_FUNCTION.to_string());
                self.handle_table_relations(arguments, cancel)
            }
            ToolName::SearchSapTables => {
                *operation = Some(READ_TABLE_FUNCTION.to_string());
                self.handle_search_tables(arguments, cancel)
            }
            ToolName::ReadTable => {
                *operation = Some(READ_TABLE_FUNCTION.to_string());
                self.handle_read_table(arguments, cancel)
            }
            ToolName::MetricsGet => encode(&self.metrics.snapshot()).map(ToolOutput::Json),
        }
    }

    /// Handles `rfc_ping`.
    fn handle_ping(&self, cancel: &CancellationToken) -> Result<ToolOutput, ToolError> {
        let started = Instant::now();
        let result = self.client.ping(cancel);
        self.metrics.record(ToolName::RfcPing.as_str(), started.elapsed(), &result);
        result?;
        Ok(ToolOutput::Text(PING_REPLY.to_string()))
    }

    /// Handles `rfc_connection_info`.
    fn handle_connection_info(&self, cancel: &CancellationToken) -> Result<ToolOutput, ToolError> {
        let started = Instant::now();
        let result = self.client.connection_attributes(cancel);
        self.metrics.record(ToolName::RfcConnectionInfo.as_str(), started.elapsed(), &result);
        encode(&result?).map(ToolOutput::Json)
    }

    /// Handles `rfc_describe`.
    fn handle_describe(
        &self,
        arguments: Value,
        cancel: &CancellationToken,
        operation: &mut Option<String>,
    ) -> Result<ToolOutput, ToolError> {
        let args: FunctionArgs = decode(arguments)?;
        let function = required_name(&args.function_name, "function_name")?;
        *operation = Some(function.clone());
        let started = Instant::now();
        let result = self.client.describe(&function, cancel);
        self.metrics.record(ToolName::RfcDescribe.as_str(), started.elapsed(), &result);
        encode(&result?).map(ToolOutput::Json)
    }

    /// Handles `rfc_call`: describe, validate, coerce, invoke.
    fn handle_call(
        &self,
        arguments: Value,
        cancel: &CancellationToken,
        operation: &mut Option<String>,
    ) -> Result<ToolOutput, ToolError> {
        let args: CallArgs = decode(arguments)?;
        let function = required_name(&args.function_name, "function_name")?;
        *operation = Some(function.clone());
        let tree = RfcValue::tree_from_json(&args.parameters.unwrap_or_default());
        let description = self.client.describe(&function, cancel).map_err(|source| {
            ToolError::Describe {
                function: function.clone(),
                source,
            }
        })?;
        validate_parameters(&tree, &description).map_err(ToolError::Validation)?;
        let coerced = coerce_parameters(&tree, &description).map_err(ToolError::Coercion)?;
        let started = Instant::now();
        let result = self.client.invoke(&function, &coerced, cancel);
        self.metrics.record(&function, started.elapsed(), &result);
        Ok(ToolOutput::Json(Value::Object(result?)))
    }

    /// Handles `get_table_metadata`.
    fn handle_table_metadata(
        &self,
        arguments: Value,
        cancel: &CancellationToken,
    ) -> Result<ToolOutput, ToolError> {
        let args: TableArgs = decode(arguments)?;
        let table = required_name(&args.table_name, "table_name")?;
        let mut parameters = CoercedTree::new();
        parameters.insert("TABNAME".to_string(), RfcValue::Text(table));
        parameters.insert("LANGU".to_string(), RfcValue::Text(self.language(args.language)));
        let result = self.call_recorded(
            ToolName::GetTableMetadata,
            FIELD_INFO_FUNCTION,
            &parameters,
            cancel,
        )?;
        Ok(ToolOutput::Json(Value::Object(result)))
    }

    /// Handles `get_table_relations`.
    fn handle_table_relations(
        &self,
        arguments: Value,
        cancel: &CancellationToken,
    ) -> Result<ToolOutput, ToolError> {
        let args: TableArgs = decode(arguments)?;
        let table = required_name(&args.table_name, "table_name")?;
        let mut parameters = CoercedTree::new();
        parameters.insert("TABNAME".to_string(), RfcValue::Text(table));
        let result = self.call_recorded(
            ToolName::GetTableRelations,
            FOREIGN_KEY_FUNCTION,
            &parameters,
            cancel,
        )?;
        Ok(ToolOutput::Json(Value::Object(result)))
    }

    /// Handles `search_sap_tables`.
    fn handle_search_tables(
        &self,
        arguments: Value,
        cancel: &CancellationToken,
    ) -> Result<ToolOutput, ToolError> {
        let args: SearchArgs = decode(arguments)?;
        if args.search_term.is_empty() {
            return Err(ToolError::InvalidParams("search_term is required".to_string()));
        }
        let language = self.language(args.language);
        let clause = format!(
            "DDLANGUAGE = '{}' AND DDTEXT LIKE '{}'",
            escape_literal(&language),
            escape_literal(&args.search_term)
        );
        let parameters = read_table_parameters(
            TABLE_TEXTS,
            &["TABNAME".to_string(), "DDTEXT".to_string()],
            split_where_clause(&clause)?,
            self.row_limit(args.max_results),
            None,
        );
        let result = self.call_recorded(
            ToolName::SearchSapTables,
            READ_TABLE_FUNCTION,
            &parameters,
            cancel,
        )?;
        encode(&decode_rows(&result)?).map(ToolOutput::Json)
    }

    /// Handles `read_table`.
    fn handle_read_table(
        &self,
        arguments: Value,
        cancel: &CancellationToken,
    ) -> Result<ToolOutput, ToolError> {
        let args: ReadTableArgs = decode(arguments)?;
        let table = required_name(&args.table_name, "table_name")?;
        let fields: Vec<String> = args
            .fields
            .iter()
            .map(|field| field.trim().to_uppercase())
            .filter(|field| !field.is_empty())
            .collect();
        let options = match args.where_clause.as_deref().map(str::trim) {
            Some(clause) if !clause.is_empty() => split_where_clause(clause)?,
            _ => Vec::new(),
        };
        let parameters = read_table_parameters(
            &table,
            &fields,
            options,
            self.row_limit(args.max_results),
            args.skip,
        );
        let result =
            self.call_recorded(ToolName::ReadTable, READ_TABLE_FUNCTION, &parameters, cancel)?;
        encode(&decode_rows(&result)?).map(ToolOutput::Json)
    }

    /// Invokes a fixed function module and records it under the tool name.
    fn call_recorded(
        &self,
        tool: ToolName,
        function: &str,
        parameters: &CoercedTree,
        cancel: &CancellationToken,
    ) -> Result<Map<String, Value>, ToolError> {
        let started = Instant::now();
        let result = self.client.invoke(function, parameters, cancel);
        self.metrics.record(tool.as_str(), started.elapsed(), &result);
        Ok(result?)
    }

    /// Resolves a language argument against the configured default.
    fn language(&self, language: Option<String>) -> String {
        language
            .map(|language| language.trim().to_string())
            .filter(|language| !language.is_empty())
            .unwrap_or_else(|| self.query.default_language.clone())
    }

    /// Resolves a row limit argument against the configured bounds.
    fn row_limit(&self, requested: Option<i64>) -> u32 {
        match requested {
            Some(limit) if limit > 0 => {
                u32::try_from(limit).unwrap_or(u32::MAX).min(self.query.max_results_limit)
            }
            _ => self.query.default_max_results,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Tool routing errors.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Tool name not recognized.
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    /// Arguments missing or malformed.
    #[error("{0}")]
    InvalidParams(String),
    /// Interface lookup for `rfc_call` failed.
    #[error("describe \"{function}\": {source}")]
    Describe {
        /// Function module name.
        function: String,
        /// Underlying session error.
        source: SessionError,
    },
    /// A parameter name is not part of the interface.
    #[error("{0}")]
    Validation(CoercionError),
    /// A parameter value does not fit its declared kind.
    #[error("coerce parameters: {0}")]
    Coercion(CoercionError),
    /// The remote call failed.
    #[error("{0}")]
    Session(#[from] SessionError),
    /// A table reader result had an unexpected shape.
    #[error("{0}")]
    RowDecode(#[from] RowDecodeError),
    /// Tool payload serialization failed.
    #[error("serialization failure")]
    Serialization,
}

impl ToolError {
    /// Returns a stable label for audit logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::UnknownTool(_) => "unknown_tool",
            Self::InvalidParams(_) => "invalid_params",
            Self::Describe {
                ..
            } => "describe_failed",
            Self::Validation(_) => "unknown_parameter",
            Self::Coercion(_) => "type_coercion",
            Self::Session(err) => err.kind(),
            Self::RowDecode(_) => "row_decode",
            Self::Serialization => "serialization",
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Decodes tool arguments.
fn decode<T: for<'de> Deserialize<'de>>(payload: Value) -> Result<T, ToolError> {
    serde_json::from_value(payload)
        .map_err(|err| ToolError::InvalidParams(format!("invalid arguments: {err}")))
}

/// Encodes a tool result.
fn encode<T: Serialize>(value: &T) -> Result<Value, ToolError> {
    serde_json::to_value(value).map_err(|_| ToolError::Serialization)
}

/// Uppercases a required name argument.
fn required_name(value: &str, field: &str) -> Result<String, ToolError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ToolError::InvalidParams(format!("{field} is required")));
    }
    Ok(trimmed.to_uppercase())
}

/// Doubles single quotes so the value is safe inside an ABAP literal.
#[must_use]
pub fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// Splits a WHERE clause into `OPTIONS` lines of at most 72 characters.
///
/// Lines break only between tokens; quoted literals are kept whole.
///
/// # Errors
///
/// Returns [`ToolError::InvalidParams`] when a single token is wider than one
/// line or a literal is unterminated.
pub fn split_where_clause(clause: &str) -> Result<Vec<String>, ToolError> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for token in where_tokens(clause)? {
        let width = token.chars().count();
        if width > WHERE_LINE_WIDTH {
            return Err(ToolError::InvalidParams(format!(
                "where clause token exceeds {WHERE_LINE_WIDTH} characters: {token}"
            )));
        }
        let current_width = current.chars().count();
        if current.is_empty() {
            current = token;
        } else if current_width + 1 + width <= WHERE_LINE_WIDTH {
            current.push(' ');
            current.push_str(&token);
        } else {
            lines.push(std::mem::replace(&mut current, token));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    Ok(lines)
}

/// Splits a clause at whitespace outside single-quoted literals.
fn where_tokens(clause: &str) -> Result<Vec<String>, ToolError> {
    let mut tokens = Vec::new();
    let mut token = String::new();
    let mut quoted = false;
    for ch in clause.chars() {
        if ch == '\'' {
            quoted = !quoted;
        }
        if ch.is_whitespace() && !quoted {
            if !token.is_empty() {
                tokens.push(std::mem::take(&mut token));
            }
        } else {
            token.push(ch);
        }
    }
    if quoted {
        return Err(ToolError::InvalidParams(
            "where clause has an unterminated literal".to_string(),
        ));
    }
    if !token.is_empty() {
        tokens.push(token);
    }
    Ok(tokens)
}

/// Builds `RFC_READ_TABLE` parameters.
fn read_table_parameters(
    table: &str,
    fields: &[String],
    options: Vec<String>,
    row_limit: u32,
    skip: Option<u32>,
) -> CoercedTree {
    let rows = |name: &str, values: Vec<String>| {
        RfcValue::Table(
            values
                .into_iter()
                .map(|value| {
                    RfcValue::Structure([(name.to_string(), RfcValue::Text(value))].into())
                })
                .collect(),
        )
    };
    let mut parameters = CoercedTree::new();
    parameters.insert("QUERY_TABLE".to_string(), RfcValue::Text(table.to_string()));
    parameters.insert("ROWCOUNT".to_string(), RfcValue::Int(i64::from(row_limit)));
    if let Some(skip) = skip {
        parameters.insert("ROWSKIPS".to_string(), RfcValue::Int(i64::from(skip)));
    }
    if !options.is_empty() {
        parameters.insert("OPTIONS".to_string(), rows("TEXT", options));
    }
    if !fields.is_empty() {
        parameters.insert("FIELDS".to_string(), rows("FIELDNAME", fields.to_vec()));
    }
    parameters
}

// ============================================================================
// SECTION: Tests
// ============================================================================
