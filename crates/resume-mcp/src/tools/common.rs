//! Shared plumbing for resume tools
//!
//! Argument parsing, the fetch-mutate-PATCH cycle, and the success/failure
//! bodies every tool returns.

use crate::clients::{CredentialOverride, ResumeApiError, ResumeClient, ResumeSession};
use crate::types::ToolResult;
use chrono::Utc;
use resume_core::merge::sanitize;
use resume_core::view::public_url;
use resume_core::{ResumeDocument, ResumeError};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{debug, error, warn};

/// Argument keys that steer a tool rather than describe resume content.
pub const CONTROL_KEYS: &[&str] = &[
    "resume_id",
    "operation",
    "item_id",
    "auth",
    "expected_updated_at",
    "section_name",
    "action",
];

/// Tool failure.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Arguments did not match the tool's schema.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Input or merge error raised before any write.
    #[error(transparent)]
    Resume(#[from] ResumeError),

    /// Remote service error.
    #[error(transparent)]
    Api(#[from] ResumeApiError),
}

impl ToolError {
    /// Individual problems behind this error, for the `details` field.
    pub fn details(&self) -> Vec<String> {
        match self {
            ToolError::Resume(ResumeError::Validation(problems)) if problems.len() > 1 => problems.clone(),
            ToolError::Api(e) => e.details().to_vec(),
            _ => Vec::new(),
        }
    }
}

/// Result of a tool body.
pub type ToolOutcome = Result<Value, ToolError>;

/// Arguments shared by every tool that touches one resume.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResumeTarget {
    /// Resume ID.
    #[serde(default)]
    pub resume_id: String,

    /// Per-call credential overrides.
    #[serde(default)]
    pub auth: Option<CredentialOverride>,

    /// Version token the caller last saw.
    #[serde(default)]
    pub expected_updated_at: Option<String>,
}

impl ResumeTarget {
    /// The resume ID, which must not be blank.
    pub fn id(&self) -> Result<&str, ToolError> {
        require_text("resume_id", &self.resume_id)
    }
}

/// Deserialize tool arguments.
pub fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, ToolError> {
    let args = match args {
        Value::Null => json!({}),
        other => other,
    };
    serde_json::from_value(args).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

/// Tool arguments as an object.
pub fn args_object(args: &Value) -> Result<Map<String, Value>, ToolError> {
    match args {
        Value::Object(map) => Ok(map.clone()),
        Value::Null => Ok(Map::new()),
        _ => Err(ToolError::InvalidArguments("arguments must be an object".to_string())),
    }
}

/// Item fields from flat tool arguments: everything except control keys and nulls.
pub fn content_fields(args: &Map<String, Value>) -> Map<String, Value> {
    args.iter()
        .filter(|(k, v)| !CONTROL_KEYS.contains(&k.as_str()) && !v.is_null())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// A non-blank string argument.
pub fn require_text<'a>(field: &str, value: &'a str) -> Result<&'a str, ToolError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ResumeError::MissingField(field.to_string()).into())
    } else {
        Ok(trimmed)
    }
}

/// Fail if the caller's version token does not match the fetched document.
pub fn check_expected_version(doc: &ResumeDocument, expected: Option<&str>) -> Result<(), ToolError> {
    let Some(expected) = expected.filter(|s| !s.trim().is_empty()) else {
        return Ok(());
    };
    match doc.version() {
        Some(actual) if actual == expected => Ok(()),
        actual => Err(ResumeApiError::Conflict {
            expected: expected.to_string(),
            actual: actual.unwrap_or_default().to_string(),
        }
        .into()),
    }
}

/// Apply `change` to a fetched document, then bring it up to schema and PATCH it.
pub async fn save_with<F, R>(session: &ResumeSession, mut doc: ResumeDocument, change: F) -> Result<(ResumeDocument, R), ToolError>
where
    F: FnOnce(&mut ResumeDocument) -> Result<R, ToolError>,
{
    let result = change(&mut doc)?;
    sanitize(&mut doc.data);
    let saved = session.patch_resume(&doc).await?;
    debug!(resume_id = %saved.id, "Resume saved");
    Ok((saved, result))
}

/// Log in, fetch, check the version token, change and PATCH one resume.
pub async fn mutate_resume<F, R>(
    client: &ResumeClient,
    target: &ResumeTarget,
    change: F,
) -> Result<(ResumeSession, ResumeDocument, R), ToolError>
where
    F: FnOnce(&mut ResumeDocument) -> Result<R, ToolError>,
{
    let resume_id = target.id()?;
    let session = client.login(target.auth.as_ref()).await?;
    let doc = session.get_resume(resume_id).await?;
    check_expected_version(&doc, target.expected_updated_at.as_deref())?;
    let (saved, result) = save_with(&session, doc, change).await?;
    Ok((session, saved, result))
}

/// Public URL of a resume, if it is public and the username can be looked up.
pub async fn lookup_public_url(session: &ResumeSession, doc: &ResumeDocument) -> Option<String> {
    if !doc.is_public() {
        return None;
    }
    match session.get_user().await {
        Ok(user) if !user.username.is_empty() => Some(public_url(
            &session.endpoint().public_base(),
            &user.username,
            &doc.slug,
        )),
        Ok(_) => None,
        Err(e) => {
            warn!(error = %e, "Could not look up username for public URL");
            None
        }
    }
}

/// Start of a success body: `{success, message, resume_id, timestamp}`.
pub fn success_body(message: impl Into<String>, resume_id: &str) -> Map<String, Value> {
    let mut body = Map::new();
    body.insert("success".to_string(), json!(true));
    body.insert("message".to_string(), json!(message.into()));
    body.insert("resume_id".to_string(), json!(resume_id));
    body.insert("timestamp".to_string(), json!(Utc::now().to_rfc3339()));
    body
}

/// Failure body: `{success: false, error, details?}`.
pub fn failure_body(err: &ToolError) -> Value {
    let mut body = Map::new();
    body.insert("success".to_string(), json!(false));
    body.insert("error".to_string(), json!(err.to_string()));
    let details = err.details();
    if !details.is_empty() {
        body.insert("details".to_string(), json!(details));
    }
    Value::Object(body)
}

/// Turn a tool body's outcome into a tool result.
pub fn finish(tool: &str, outcome: ToolOutcome) -> ToolResult {
    match outcome {
        Ok(body) => ToolResult::json(body),
        Err(e) => {
            match &e {
                ToolError::Api(_) => error!(tool, error = %e, "Tool failed"),
                _ => warn!(tool, error = %e, "Tool rejected input"),
            }
            ToolResult::json_error(failure_body(&e))
        }
    }
}

/// JSON Schema of the `auth` override argument.
pub fn auth_schema() -> Value {
    json!({
        "type": "object",
        "description": "Optional credential overrides for this call; defaults to the server configuration",
        "properties": {
            "email": { "type": "string" },
            "password": { "type": "string" },
            "base_url": { "type": "string" }
        }
    })
}

/// JSON Schema of the `expected_updated_at` argument.
pub fn version_schema() -> Value {
    json!({
        "type": "string",
        "description": "updatedAt of the resume as last read; the write is refused if it has changed since"
    })
}

/// Object schema with the shared `auth` property added.
pub fn object_schema(mut properties: Map<String, Value>, required: &[&str]) -> Value {
    properties.insert("auth".to_string(), auth_schema());
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// `resume_id` property schema.
pub fn resume_id_schema() -> Value {
    json!({ "type": "string", "description": "ID of the resume" })
}
