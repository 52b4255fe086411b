//! Bulk and facade tools
//!
//! `create_and_update_resume` validates a whole payload up front, creates
//! or fetches the resume, and writes everything in one PATCH.
//! `simple_resume_manager` routes a single `action` to the shared tool bodies.

use super::common::{
    check_expected_version, finish, object_schema, parse_args, resume_id_schema, save_with, version_schema,
    ToolError, ToolOutcome,
};
use super::resumes::{self, new_resume, saved_body, sections_schema, UpdateArgs};
use crate::clients::ResumeClient;
use crate::server::{McpServerResult, Tool, ToolContext};
use crate::types::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use resume_core::Validator;
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Collect every problem in a bulk payload before touching the network.
pub fn validate_payload(args: &UpdateArgs, creating: bool) -> Result<(), ToolError> {
    let mut validator = Validator::new();

    if creating && args.title.as_deref().map(str::trim).unwrap_or("").is_empty() {
        validator.push("title is required when resume_id is not provided");
    }
    if let Some(visibility) = args.visibility.as_deref() {
        validator.check_visibility(visibility);
    }
    if let Some(basics) = &args.basics {
        validator.check_basics(basics);
    }
    if let Some(sections) = &args.sections {
        for (key, payload) in sections {
            validator.check_section(key, payload);
        }
    }

    Ok(validator.finish()?)
}

/// `create_and_update_resume`: validate, create or fetch, merge, PATCH once.
pub async fn create_and_update_resume(client: &ResumeClient, args: Value) -> ToolOutcome {
    let args: UpdateArgs = parse_args(args)?;
    let resume_id = args.target.resume_id.trim().to_string();
    let creating = resume_id.is_empty();
    validate_payload(&args, creating)?;

    let session = client.login(args.target.auth.as_ref()).await?;
    let doc = if creating {
        let new = new_resume(
            args.title.as_deref().unwrap_or_default(),
            args.slug.as_deref(),
            args.visibility.as_deref(),
        )?;
        let created = session.create_resume(&new).await?;
        info!(resume_id = %created.id, "Resume created");
        session.get_resume(&created.id).await?
    } else {
        let doc = session.get_resume(&resume_id).await?;
        check_expected_version(&doc, args.target.expected_updated_at.as_deref())?;
        doc
    };

    let (saved, outcomes) = save_with(&session, doc, |doc| args.apply_to(doc)).await?;
    debug!(resume_id = %saved.id, sections = outcomes.len(), "Bulk update saved");

    let message = if creating {
        "Resume created and populated successfully"
    } else {
        "Resume updated successfully"
    };
    let mut body = saved_body(&session, &saved, message, &outcomes).await;
    body.insert("created".to_string(), json!(creating));
    Ok(Value::Object(body))
}

/// Actions of `simple_resume_manager`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerAction {
    /// Create a resume, optionally with content
    Create,
    /// Fetch one resume
    Get,
    /// Validate and merge content into an existing resume
    Update,
    /// Delete a resume
    Delete,
    /// List the user's resumes
    List,
}

impl fmt::Display for ManagerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ManagerAction::Create => "create",
            ManagerAction::Get => "get",
            ManagerAction::Update => "update",
            ManagerAction::Delete => "delete",
            ManagerAction::List => "list",
        })
    }
}

impl FromStr for ManagerAction {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "create" => Ok(ManagerAction::Create),
            "get" => Ok(ManagerAction::Get),
            "update" => Ok(ManagerAction::Update),
            "delete" => Ok(ManagerAction::Delete),
            "list" => Ok(ManagerAction::List),
            other => Err(ToolError::InvalidArguments(format!(
                "Invalid action '{}'. Must be one of: create, get, update, delete, list",
                other
            ))),
        }
    }
}

/// `simple_resume_manager`: one entry point for the common resume actions.
pub async fn simple_resume_manager(client: &ResumeClient, args: Value) -> ToolOutcome {
    let mut args = match args {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        _ => return Err(ToolError::InvalidArguments("arguments must be an object".to_string())),
    };
    let action: ManagerAction = match args.remove("action") {
        Some(Value::String(action)) => action.parse()?,
        _ => return Err(resume_core::ResumeError::MissingField("action".to_string()).into()),
    };
    debug!(%action, "Routing resume manager action");

    if action == ManagerAction::Create {
        args.remove("resume_id");
    }
    let args = Value::Object(args);

    let mut body = match action {
        ManagerAction::Create => create_and_update_resume(client, args).await?,
        ManagerAction::Get => resumes::get_resume(client, args).await?,
        ManagerAction::Update => create_and_update_resume_existing(client, args).await?,
        ManagerAction::Delete => resumes::delete_resume(client, args).await?,
        ManagerAction::List => resumes::list_resumes(client, args).await?,
    };
    if let Value::Object(map) = &mut body {
        map.insert("action".to_string(), json!(action.to_string()));
    }
    Ok(body)
}

/// `update` through the manager: same validation as the bulk tool, but the resume must exist.
async fn create_and_update_resume_existing(client: &ResumeClient, args: Value) -> ToolOutcome {
    let has_id = args
        .get("resume_id")
        .and_then(Value::as_str)
        .map(|s| !s.trim().is_empty())
        .unwrap_or(false);
    if !has_id {
        return Err(resume_core::ResumeError::MissingField("resume_id".to_string()).into());
    }
    create_and_update_resume(client, args).await
}

fn payload_properties() -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert("resume_id".to_string(), resume_id_schema());
    properties.insert("title".to_string(), json!({ "type": "string" }));
    properties.insert("slug".to_string(), json!({ "type": "string" }));
    properties.insert(
        "visibility".to_string(),
        json!({ "type": "string", "enum": ["private", "public"] }),
    );
    properties.insert(
        "basics".to_string(),
        json!({ "type": "object", "description": "Personal details: name, headline, email, phone, location, url" }),
    );
    properties.insert("sections".to_string(), sections_schema());
    properties.insert("expected_updated_at".to_string(), version_schema());
    properties
}

/// `create_and_update_resume` tool.
pub struct CreateAndUpdateResumeTool {
    client: Arc<ResumeClient>,
}

impl CreateAndUpdateResumeTool {
    /// Create the tool.
    pub fn new(client: Arc<ResumeClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for CreateAndUpdateResumeTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "create_and_update_resume",
            "Create a resume (when resume_id is omitted) or fetch an existing one, then apply \
             title, visibility, basics and sections in a single validated write",
        )
        .with_category("bulk")
        .with_schema(object_schema(payload_properties(), &[]))
    }

    #[instrument(skip(self, args, context), fields(tool = "create_and_update_resume", correlation_id = %context.correlation_id))]
    async fn execute(&self, args: Value, context: &ToolContext) -> McpServerResult<ToolResult> {
        Ok(finish("create_and_update_resume", create_and_update_resume(&self.client, args).await))
    }
}

/// `simple_resume_manager` tool.
pub struct SimpleResumeManagerTool {
    client: Arc<ResumeClient>,
}

impl SimpleResumeManagerTool {
    /// Create the tool.
    pub fn new(client: Arc<ResumeClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for SimpleResumeManagerTool {
    fn definition(&self) -> ToolDefinition {
        let mut properties = payload_properties();
        properties.insert(
            "action".to_string(),
            json!({ "type": "string", "enum": ["create", "get", "update", "delete", "list"] }),
        );
        properties.insert("page".to_string(), json!({ "type": "integer", "minimum": 1 }));
        properties.insert("page_size".to_string(), json!({ "type": "integer", "minimum": 1 }));
        properties.insert("include_public_urls".to_string(), json!({ "type": "boolean" }));

        ToolDefinition::new(
            "simple_resume_manager",
            "Create, get, update, delete or list resumes through one tool",
        )
        .with_category("bulk")
        .with_schema(object_schema(properties, &["action"]))
    }

    #[instrument(skip(self, args, context), fields(tool = "simple_resume_manager", correlation_id = %context.correlation_id))]
    async fn execute(&self, args: Value, context: &ToolContext) -> McpServerResult<ToolResult> {
        Ok(finish("simple_resume_manager", simple_resume_manager(&self.client, args).await))
    }
}

/// Bulk tools.
pub fn bulk_tools(client: Arc<ResumeClient>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(CreateAndUpdateResumeTool::new(client.clone())),
        Arc::new(SimpleResumeManagerTool::new(client)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::ResumeConfig;

    fn args(value: Value) -> UpdateArgs {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_validation_aggregates_every_problem() {
        let payload = args(json!({
            "visibility": "friends",
            "basics": { "email": "not-an-email" },
            "sections": {
                "skills": { "items": [{ "level": 9 }] },
                "experience": { "items": [{ "company": "Acme", "startDate": "Jan 2022" }] },
                "hobbies": { "items": [] }
            }
        }));

        let err = validate_payload(&payload, true).unwrap_err();
        let details = err.details();
        assert!(details.iter().any(|d| d.contains("title is required")));
        assert!(details.iter().any(|d| d.contains("visibility")));
        assert!(details.iter().any(|d| d.contains("skills[0]: name is required")));
        assert!(details.iter().any(|d| d.contains("startDate")));
        assert!(details.iter().any(|d| d.contains("unknown section 'hobbies'")));
    }

    #[test]
    fn test_valid_payload_passes() {
        let payload = args(json!({
            "resume_id": "r1",
            "sections": {
                "summary": { "content": "Hello" },
                "skills": { "items": [{ "id": "s1", "level": 3 }, { "name": "Go", "level": "4" }] }
            }
        }));
        assert!(validate_payload(&payload, false).is_ok());
    }

    #[test]
    fn test_manager_actions() {
        assert_eq!("LIST".parse::<ManagerAction>().unwrap(), ManagerAction::List);
        let err = "archive".parse::<ManagerAction>().unwrap_err();
        assert!(err.to_string().contains("Must be one of: create, get, update, delete, list"));
    }

    #[tokio::test]
    async fn test_manager_requires_action_before_network() {
        let client = ResumeClient::new(Arc::new(ResumeConfig::new("http://127.0.0.1:9/api", "a", "b")));
        let err = simple_resume_manager(&client, json!({ "resume_id": "r1" })).await.unwrap_err();
        assert_eq!(err.to_string(), "Missing required field: action");

        let err = simple_resume_manager(&client, json!({ "action": "update" })).await.unwrap_err();
        assert_eq!(err.to_string(), "Missing required field: resume_id");
    }

    #[test]
    fn test_bulk_tools() {
        let client = Arc::new(ResumeClient::new(Arc::new(ResumeConfig::new("http://localhost/api", "a", "b"))));
        let names: Vec<String> = bulk_tools(client).iter().map(|t| t.definition().name).collect();
        assert_eq!(names, vec!["create_and_update_resume", "simple_resume_manager"]);
    }
}
