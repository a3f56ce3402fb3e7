//! MCP tool surface for the Lacework client.
//!
//! Four tools: an auth ping, saved-query execution, alert listing, and the
//! chunked compliance search. Tools never fail at the MCP protocol level;
//! every client error is folded into a structured `{error, details?}`
//! result so the host always receives a JSON payload to inspect.

use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
    },
    schemars, tool, tool_handler, tool_router,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::warn;

use lacework_client::{
    AlertsRequest, ComplianceSearch, DEFAULT_ALERT_LIMIT, DEFAULT_COMPLIANCE_LIMIT,
    LaceworkClient, QueryRequest,
};

/// Parameters for the `run_lql_query` tool.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct RunQueryParams {
    /// Saved LQL query ID, e.g. "samv_out_of_canada".
    pub query_id: String,
    /// Window start as UTC ISO-8601 (`YYYY-MM-DDTHH:MM:SSZ`); a bare
    /// `YYYY-MM-DD` is accepted and coerced to midnight UTC.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    /// Window end, same forms as `start_time`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    /// Extra query arguments as `{"name": ..., "value": ...}` objects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<Value>>,
}

/// Parameters for the `list_alerts` tool.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ListAlertsParams {
    /// Window start as UTC ISO-8601 (`YYYY-MM-DDTHH:MM:SSZ`). Defaults to
    /// seven days before now.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    /// Window end, same form. Defaults to now.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    /// Maximum number of alerts to return (default 50).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Parameters for the `search_aws_compliance` tool.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SearchComplianceParams {
    /// Window start as UTC ISO-8601 (`YYYY-MM-DDTHH:MM:SSZ`); bare dates
    /// are rejected. Defaults to `end_time` minus seven days.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    /// Window end, same form. Defaults to now.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    /// Status filter, e.g. ["NonCompliant", "PartiallyCompliant"].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statuses: Option<Vec<String>>,
    /// AWS account ID filter, e.g. ["123456789012"].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_ids: Option<Vec<String>>,
    /// Fields to return; defaults to account, id, recommendation,
    /// severity, status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns: Option<Vec<String>>,
    /// Overall row limit across all time chunks (default 1000).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

/// MCP server handler wrapping a [`LaceworkClient`].
#[derive(Clone)]
pub struct LaceworkServer {
    client: Arc<LaceworkClient>,
    tool_router: ToolRouter<Self>,
}

impl LaceworkServer {
    /// Creates the server around a ready client.
    #[must_use]
    pub fn new(client: LaceworkClient) -> Self {
        Self {
            client: Arc::new(client),
            tool_router: Self::tool_router(),
        }
    }

    /// Renders a JSON payload as the tool's text content.
    fn reply(payload: &Value) -> Result<CallToolResult, McpError> {
        let text = serde_json::to_string_pretty(payload)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    /// Folds a client error into the structured `{error, details?}` shape
    /// the host contract promises.
    fn failure(err: &lacework_client::ClientError) -> Value {
        warn!("tool call failed: {err}");
        let mut payload = json!({ "error": err.to_string() });
        if let Some(details) = err.details() {
            payload["details"] = json!(details);
        }
        payload
    }
}

#[tool_router]
impl LaceworkServer {
    /// Check authentication by fetching a short-lived token.
    #[tool(description = "Check Lacework authentication by fetching a short-lived API token.")]
    async fn ping(&self) -> Result<CallToolResult, McpError> {
        let payload = match self.client.fetch_token().await {
            Ok(token) => json!({ "ok": true, "token_preview": token.preview() }),
            Err(err) => json!({ "ok": false, "error": err.to_string() }),
        };
        Self::reply(&payload)
    }

    /// Execute a saved LQL query by ID.
    #[tool(
        description = "Execute a saved Lacework LQL query by ID, optionally over a time range \
                       and with extra named arguments. Returns the raw API response."
    )]
    async fn run_lql_query(
        &self,
        Parameters(params): Parameters<RunQueryParams>,
    ) -> Result<CallToolResult, McpError> {
        let request = QueryRequest {
            query_id: params.query_id,
            start_time: params.start_time,
            end_time: params.end_time,
            args: params.args.unwrap_or_default(),
        };
        let payload = match self.client.run_query(&request).await {
            Ok(body) => body,
            Err(err) => Self::failure(&err),
        };
        Self::reply(&payload)
    }

    /// List alerts over a time window.
    #[tool(
        description = "List Lacework alerts over a time window (defaults to the last 7 days). \
                       Returns the raw API response."
    )]
    async fn list_alerts(
        &self,
        Parameters(params): Parameters<ListAlertsParams>,
    ) -> Result<CallToolResult, McpError> {
        let request = AlertsRequest {
            start_time: params.start_time,
            end_time: params.end_time,
            limit: params.limit.unwrap_or(DEFAULT_ALERT_LIMIT),
        };
        let payload = match self.client.list_alerts(&request).await {
            Ok(body) => body,
            Err(err) => Self::failure(&err),
        };
        Self::reply(&payload)
    }

    /// Search AWS compliance evaluations.
    #[tool(
        description = "Search Lacework AWS compliance evaluations with status/account filters. \
                       Long time ranges are chunked into 7-day slices and paginated \
                       automatically; results are capped at the requested limit."
    )]
    async fn search_aws_compliance(
        &self,
        Parameters(params): Parameters<SearchComplianceParams>,
    ) -> Result<CallToolResult, McpError> {
        let request = ComplianceSearch {
            start_time: params.start_time,
            end_time: params.end_time,
            statuses: params.statuses.unwrap_or_default(),
            account_ids: params.account_ids.unwrap_or_default(),
            returns: params.returns,
            limit: params.limit.unwrap_or(DEFAULT_COMPLIANCE_LIMIT),
        };
        let payload = match self.client.search_compliance(&request).await {
            Ok(body) => body,
            Err(err) => Self::failure(&err),
        };
        Self::reply(&payload)
    }
}

#[tool_handler]
impl ServerHandler for LaceworkServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Lacework API tools. Use 'ping' to verify credentials, 'run_lql_query' to \
                 execute saved LQL queries, 'list_alerts' for recent alerts, and \
                 'search_aws_compliance' for AWS compliance evaluations. All timestamps are \
                 UTC ISO-8601 (YYYY-MM-DDTHH:MM:SSZ). Failures come back as JSON with an \
                 'error' field rather than protocol errors."
                    .to_string(),
            ),
        }
    }
}
