//! # Resume MCP
//!
//! An MCP (Model Context Protocol) server that lets an AI assistant edit
//! resumes stored in a Reactive Resume style REST API.
//!
//! ## Overview
//!
//! - **Tools**: section mutations, resume CRUD, bulk updates and a section reader
//! - **JSON-RPC**: `initialize`, `ping`, `tools/list`, `tools/call` over stdio
//! - **Client**: cookie-session HTTP client for the resume service
//! - **Retry**: exponential backoff for the section reader
//!
//! Every tool call logs in, fetches the resume, applies its change with the
//! merge rules from [`resume_core`], and PATCHes the whole document back.
//! Tool failures are returned as results with `isError: true` and a
//! `{success: false, error, details?}` body.
//!
//! ## Available Tools
//!
//! ### Sections
//! - `update_summary`, `update_skills`, `update_experience`, `update_education`, ...:
//!   add, update or remove one item of a section
//! - `update_resume_section`: batch add/update/remove on any section
//!
//! ### Resumes
//! - `get_resume`, `list_resumes`, `get_resume_schema`
//! - `create_resume`, `delete_resume`, `print_resume`, `update_resume`
//! - `read_resume_section`: condensed view of a section, with retries
//! - `create_and_update_resume`, `simple_resume_manager`
//!
//! ## Usage
//!
//! ```rust,no_run
//! use resume_mcp::clients::{ResumeClient, ResumeConfig};
//! use resume_mcp::{all_tools, McpServer};
//! use std::sync::Arc;
//!
//! async fn run() -> anyhow::Result<()> {
//!     let config = Arc::new(ResumeConfig::from_env()?);
//!     let client = Arc::new(ResumeClient::new(config));
//!
//!     let server = McpServer::new("resume-mcp", env!("CARGO_PKG_VERSION"));
//!     server.register_tools(all_tools(client)).await;
//!
//!     resume_mcp::transport::serve_stdio(&server).await?;
//!     Ok(())
//! }
//! ```

pub mod clients;
pub mod retry;
pub mod server;
pub mod tools;
pub mod transport;
pub mod types;

// Re-export main types
pub use retry::{with_retry_if, RetryConfig};
pub use server::{McpServer, McpServerError, McpServerResult, Tool, ToolContext};
pub use types::{
    ContentBlock, InitializeResult, McpError, McpRequest, McpResponse, RequestId, ServerCapabilities,
    ServerInfo, ToolAnnotations, ToolCall, ToolCapabilities, ToolDefinition, ToolResult,
};

// Re-export tool collections
pub use tools::{all_tools, bulk_tools, read_tools, resume_tools, section_tools};

// Re-export service client
pub use clients::{ResumeApiError, ResumeClient, ResumeConfig};

/// Instructions returned from `initialize`.
pub const SERVER_INSTRUCTIONS: &str = "Tools for editing resumes. Call list_resumes to find a resume id, \
read_resume_section to see item ids, then update_<section> to add, update or remove items. \
Pass expected_updated_at from a previous read to refuse writes over someone else's changes.";
