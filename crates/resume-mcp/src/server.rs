//! MCP server implementation
//!
//! Holds the tool registry and dispatches JSON-RPC requests to it.

use crate::types::*;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// MCP server error types.
#[derive(Debug, Error)]
pub enum McpServerError {
    /// Tool not found
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Tool execution failed
    #[error("Tool execution failed: {0}")]
    ExecutionError(String),

    /// Invalid parameters
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for MCP server operations.
pub type McpServerResult<T> = Result<T, McpServerError>;

/// Trait for tool implementations.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool definition.
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool with given arguments.
    async fn execute(&self, args: Value, context: &ToolContext) -> McpServerResult<ToolResult>;
}

/// Context for tool execution.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Request correlation ID, attached to every log line of the call
    pub correlation_id: String,
}

impl ToolContext {
    /// Create a context with a fresh correlation ID.
    pub fn new() -> Self {
        Self {
            correlation_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Create a context with a caller-chosen correlation ID.
    pub fn with_correlation_id(id: impl Into<String>) -> Self {
        Self {
            correlation_id: id.into(),
        }
    }
}

impl Default for ToolContext {
    fn default() -> Self {
        Self::new()
    }
}

/// MCP server.
pub struct McpServer {
    /// Server info
    info: ServerInfo,

    /// Server capabilities
    capabilities: ServerCapabilities,

    /// Usage hints returned from `initialize`
    instructions: Option<String>,

    /// Registered tools
    tools: Arc<RwLock<HashMap<String, Arc<dyn Tool>>>>,
}

impl McpServer {
    /// Create a new MCP server.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            info: ServerInfo {
                name: name.into(),
                version: version.into(),
            },
            capabilities: ServerCapabilities {
                tools: Some(ToolCapabilities { list_changed: false }),
            },
            instructions: None,
            tools: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Set the instructions returned from `initialize`.
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Register a tool. A tool with the same name is replaced.
    pub async fn register_tool(&self, tool: Arc<dyn Tool>) {
        let name = tool.definition().name;
        let mut tools = self.tools.write().await;
        if tools.insert(name.clone(), tool).is_some() {
            warn!(tool = %name, "Replacing already registered tool");
        }
    }

    /// Register multiple tools.
    pub async fn register_tools(&self, tools: Vec<Arc<dyn Tool>>) {
        for tool in tools {
            self.register_tool(tool).await;
        }
    }

    /// Get all tool definitions, sorted by name.
    pub async fn list_tools(&self) -> Vec<ToolDefinition> {
        let tools = self.tools.read().await;
        let mut definitions: Vec<ToolDefinition> = tools.values().map(|t| t.definition()).collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    /// Execute a tool.
    pub async fn call_tool(&self, name: &str, arguments: Value, context: &ToolContext) -> McpServerResult<ToolResult> {
        let tool = {
            let tools = self.tools.read().await;
            tools
                .get(name)
                .cloned()
                .ok_or_else(|| McpServerError::ToolNotFound(name.to_string()))?
        };

        info!(tool = %name, correlation_id = %context.correlation_id, "Calling tool");
        let result = tool.execute(arguments, context).await;
        match &result {
            Ok(r) if r.is_error => {
                warn!(tool = %name, correlation_id = %context.correlation_id, "Tool reported an error")
            }
            Ok(_) => debug!(tool = %name, correlation_id = %context.correlation_id, "Tool succeeded"),
            Err(e) => warn!(tool = %name, correlation_id = %context.correlation_id, error = %e, "Tool failed"),
        }
        result
    }

    /// Handle an MCP request. Notifications produce no response.
    pub async fn handle_request(&self, request: McpRequest) -> Option<McpResponse> {
        if request.is_notification() {
            debug!(method = %request.method, "Notification received");
            return None;
        }

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.id),
            "ping" => McpResponse::success(request.id, json!({})),
            "tools/list" => self.handle_tools_list(request.id).await,
            "tools/call" => self.handle_tools_call(request.id, request.params).await,
            _ => McpResponse::error(request.id, McpError::method_not_found(&request.method)),
        };
        Some(response)
    }

    fn handle_initialize(&self, id: RequestId) -> McpResponse {
        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: self.capabilities.clone(),
            server_info: self.info.clone(),
            instructions: self.instructions.clone(),
        };
        match serde_json::to_value(result) {
            Ok(value) => McpResponse::success(id, value),
            Err(e) => McpResponse::error(id, McpError::internal_error(e.to_string())),
        }
    }

    async fn handle_tools_list(&self, id: RequestId) -> McpResponse {
        let tools = self.list_tools().await;
        McpResponse::success(id, json!({ "tools": tools }))
    }

    async fn handle_tools_call(&self, id: RequestId, params: Option<Value>) -> McpResponse {
        let params = match params {
            Some(p) => p,
            None => return McpResponse::error(id, McpError::invalid_params("Missing params")),
        };

        let call: ToolCall = match serde_json::from_value(params) {
            Ok(c) => c,
            Err(e) => return McpResponse::error(id, McpError::invalid_params(e.to_string())),
        };

        let arguments = match call.arguments {
            Value::Null => json!({}),
            other => other,
        };

        let context = ToolContext::new();
        match self.call_tool(&call.name, arguments, &context).await {
            Ok(result) => match serde_json::to_value(result) {
                Ok(value) => McpResponse::success(id, value),
                Err(e) => McpResponse::error(id, McpError::internal_error(e.to_string())),
            },
            Err(McpServerError::ToolNotFound(name)) => McpResponse::error(
                id,
                McpError::invalid_params(format!("Unknown tool: {}", name)),
            ),
            Err(McpServerError::InvalidParams(msg)) => McpResponse::error(id, McpError::invalid_params(msg)),
            Err(e) => McpResponse::error(id, McpError::internal_error(e.to_string())),
        }
    }

    /// Get server info.
    pub fn info(&self) -> &ServerInfo {
        &self.info
    }
}
