//! Section reader
//!
//! `read_resume_section` is the only tool that retries: login and fetch are
//! attempted up to the configured number of times with exponential backoff
//! and a short per-request timeout.

use super::common::{finish, object_schema, parse_args, require_text, resume_id_schema, ToolOutcome};
use crate::clients::{CredentialOverride, ResumeApiError, ResumeClient};
use crate::retry::{with_retry_if, RetryConfig};
use crate::server::{McpServerResult, Tool, ToolContext};
use crate::types::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use resume_core::view::{resume_overview, section_summary};
use resume_core::{ResumeDocument, SectionKind};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::instrument;

#[derive(Debug, Deserialize)]
struct ReadArgs {
    #[serde(default)]
    resume_id: String,
    #[serde(default)]
    section_name: Option<String>,
    #[serde(default)]
    auth: Option<CredentialOverride>,
}

/// Fetch a resume, retrying transient failures.
pub async fn fetch_with_retry(
    client: &ResumeClient,
    resume_id: &str,
    auth: Option<&CredentialOverride>,
) -> Result<ResumeDocument, ResumeApiError> {
    let config = client.config();
    let retry = RetryConfig::reads(config.max_retries);
    let timeout = config.read_timeout();

    with_retry_if(
        &retry,
        move || async move {
            let session = client.login_with_timeout(auth, timeout).await?;
            session.get_resume(resume_id).await
        },
        |e: &ResumeApiError| e.is_transient(),
    )
    .await
}

/// `read_resume_section`: condensed view of one section, or of all of them.
pub async fn read_resume_section(client: &ResumeClient, args: Value) -> ToolOutcome {
    let args: ReadArgs = parse_args(args)?;
    let resume_id = require_text("resume_id", &args.resume_id)?;
    let kind = args
        .section_name
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(str::parse::<SectionKind>)
        .transpose()?;

    let doc = fetch_with_retry(client, resume_id, args.auth.as_ref()).await?;

    let mut body = Map::new();
    body.insert("success".to_string(), json!(true));
    body.insert("resume_id".to_string(), json!(doc.id));
    body.insert("updated_at".to_string(), json!(doc.updated_at));
    match kind {
        Some(kind) => {
            body.insert("title".to_string(), json!(doc.title));
            body.insert("section".to_string(), section_summary(&doc, kind));
        }
        None => {
            body.insert("overview".to_string(), resume_overview(&doc));
        }
    }
    Ok(Value::Object(body))
}

/// `read_resume_section` tool.
pub struct ReadResumeSectionTool {
    client: Arc<ResumeClient>,
}

impl ReadResumeSectionTool {
    /// Create the tool.
    pub fn new(client: Arc<ResumeClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for ReadResumeSectionTool {
    fn definition(&self) -> ToolDefinition {
        let sections: Vec<&str> = SectionKind::ALL.iter().map(|k| k.key()).collect();
        let mut properties = Map::new();
        properties.insert("resume_id".to_string(), resume_id_schema());
        properties.insert(
            "section_name".to_string(),
            json!({
                "type": "string",
                "enum": sections,
                "description": "Section to summarize; omit for an overview of every section"
            }),
        );

        ToolDefinition::new(
            "read_resume_section",
            "Summarize one section of a resume (item ids and one-line descriptions), or all sections",
        )
        .with_category("read")
        .read_only()
        .with_schema(object_schema(properties, &["resume_id"]))
    }

    #[instrument(skip(self, args, context), fields(tool = "read_resume_section", correlation_id = %context.correlation_id))]
    async fn execute(&self, args: Value, context: &ToolContext) -> McpServerResult<ToolResult> {
        Ok(finish("read_resume_section", read_resume_section(&self.client, args).await))
    }
}

/// Read tools.
pub fn read_tools(client: Arc<ResumeClient>) -> Vec<Arc<dyn Tool>> {
    vec![Arc::new(ReadResumeSectionTool::new(client))]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::ResumeConfig;

    #[tokio::test]
    async fn test_unknown_section_fails_before_network() {
        let client = ResumeClient::new(Arc::new(ResumeConfig::new("http://127.0.0.1:9/api", "a", "b")));
        let err = read_resume_section(&client, json!({ "resume_id": "r1", "section_name": "hobbies" }))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Unknown section: hobbies");
    }

    #[test]
    fn test_definition() {
        let client = Arc::new(ResumeClient::new(Arc::new(ResumeConfig::new("http://localhost/api", "a", "b"))));
        let def = ReadResumeSectionTool::new(client).definition();
        assert_eq!(def.name, "read_resume_section");
        assert_eq!(def.input_schema["required"], json!(["resume_id"]));
    }
}
