//! Resume service client.
//!
//! HTTP client for a Reactive Resume style API. Authentication is cookie
//! based: [`ResumeClient::login`] returns a [`ResumeSession`] whose HTTP
//! client holds the session cookies, so every tool call gets its own jar.

use super::config::{CredentialOverride, Credentials, ResumeConfig, ResumeEndpoint};
use reqwest::{Client, StatusCode};
use resume_core::{NewResume, ResumeDocument};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

/// Resume service client errors.
#[derive(Debug, Error)]
pub enum ResumeApiError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Login was rejected.
    #[error("Authentication failed ({status}): {message}")]
    AuthenticationFailed {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// Resume not found.
    #[error("Resume not found: {0}")]
    NotFound(String),

    /// API returned an error response.
    #[error("API error ({status}): {message}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
        /// Validation details reported by the API.
        details: Vec<String>,
    },

    /// Invalid response from the API.
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// The resume changed between read and write.
    #[error("Resume was modified by someone else (expected version {expected}, found {actual}); fetch it again and retry")]
    Conflict {
        /// Version the caller worked from.
        expected: String,
        /// Version currently stored.
        actual: String,
    },

    /// Client could not be configured.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ResumeApiError {
    /// Remote validation details, if any.
    pub fn details(&self) -> &[String] {
        match self {
            ResumeApiError::ApiError { details, .. } => details,
            _ => &[],
        }
    }

    /// Whether retrying the same request might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ResumeApiError::RequestFailed(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            ResumeApiError::ApiError { status, .. } => *status >= 500 || *status == 429,
            ResumeApiError::AuthenticationFailed { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Result type for resume service calls.
pub type ApiResult<T> = Result<T, ResumeApiError>;

/// The authenticated user, from `GET /user/me`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    /// User ID.
    #[serde(default)]
    pub id: Option<String>,

    /// Display name.
    #[serde(default)]
    pub name: Option<String>,

    /// Username, used in public resume URLs.
    #[serde(default)]
    pub username: String,

    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
}

/// Resume service client.
///
/// Holds the injected configuration. Each call to [`login`](Self::login)
/// starts an independent session.
#[derive(Debug, Clone)]
pub struct ResumeClient {
    /// Shared configuration.
    config: Arc<ResumeConfig>,
}

impl ResumeClient {
    /// Create a new resume client.
    pub fn new(config: Arc<ResumeConfig>) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &ResumeConfig {
        &self.config
    }

    /// Log in with the configured credentials, or per-call overrides.
    pub async fn login(&self, overrides: Option<&CredentialOverride>) -> ApiResult<ResumeSession> {
        self.login_with_timeout(overrides, self.config.timeout()).await
    }

    /// Log in with a specific per-request timeout.
    #[instrument(skip(self, overrides), fields(timeout_ms = timeout.as_millis() as u64))]
    pub async fn login_with_timeout(
        &self,
        overrides: Option<&CredentialOverride>,
        timeout: Duration,
    ) -> ApiResult<ResumeSession> {
        let (endpoint, credentials) = self.config.resolve(overrides);
        if credentials.email.is_empty() || credentials.password.is_empty() {
            return Err(ResumeApiError::Config(
                "email and password are required to log in".to_string(),
            ));
        }

        let client = Client::builder().cookie_store(true).timeout(timeout).build()?;
        let session = ResumeSession {
            client,
            endpoint,
            verify_before_patch: self.config.verify_before_patch,
        };
        session.authenticate(&credentials).await?;
        Ok(session)
    }
}

/// An authenticated session with the resume service.
#[derive(Debug, Clone)]
pub struct ResumeSession {
    /// HTTP client holding the session cookies.
    client: Client,

    /// Service endpoint.
    endpoint: ResumeEndpoint,

    /// Re-read the version before every PATCH.
    verify_before_patch: bool,
}

impl ResumeSession {
    /// Endpoint this session talks to.
    pub fn endpoint(&self) -> &ResumeEndpoint {
        &self.endpoint
    }

    #[instrument(skip(self, credentials), fields(base_url = %self.endpoint.base_url))]
    async fn authenticate(&self, credentials: &Credentials) -> ApiResult<()> {
        debug!("Logging in to resume service");

        let url = self.endpoint.url("/auth/login");
        let response = self
            .client
            .post(&url)
            .json(&json!({
                "identifier": credentials.email,
                "password": credentials.password,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let (message, _) = parse_error_body(&body, status);
            error!("Resume service login failed ({}): {}", status.as_u16(), message);
            return Err(ResumeApiError::AuthenticationFailed {
                status: status.as_u16(),
                message,
            });
        }

        info!("Logged in to resume service");
        Ok(())
    }

    /// Get a resume by ID.
    #[instrument(skip(self), fields(resume_id = %resume_id))]
    pub async fn get_resume(&self, resume_id: &str) -> ApiResult<ResumeDocument> {
        debug!("Fetching resume {}", resume_id);

        let url = self.resource_url("/resume", resume_id)?;
        let response = self.client.get(&url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ResumeApiError::NotFound(resume_id.to_string()));
        }

        self.handle_response(response).await
    }

    /// List the user's resumes.
    #[instrument(skip(self))]
    pub async fn list_resumes(&self) -> ApiResult<Vec<ResumeDocument>> {
        debug!("Listing resumes");

        let url = self.endpoint.url("/resume");
        let response = self.client.get(&url).send().await?;
        let body: Value = self.handle_response(response).await?;

        let rows = match body {
            Value::Array(rows) => rows,
            Value::Object(mut map) => match map.remove("items").or_else(|| map.remove("data")) {
                Some(Value::Array(rows)) => rows,
                _ => return Err(ResumeApiError::InvalidResponse("expected a list of resumes".to_string())),
            },
            _ => return Err(ResumeApiError::InvalidResponse("expected a list of resumes".to_string())),
        };

        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(|e| ResumeApiError::InvalidResponse(e.to_string())))
            .collect()
    }

    /// Create a bare resume.
    #[instrument(skip(self), fields(title = %new.title))]
    pub async fn create_resume(&self, new: &NewResume) -> ApiResult<ResumeDocument> {
        debug!("Creating resume '{}'", new.title);

        let url = self.endpoint.url("/resume");
        let response = self.client.post(&url).json(new).send().await?;
        self.handle_response(response).await
    }

    /// Current version token of a resume.
    pub async fn current_version(&self, resume_id: &str) -> ApiResult<Option<String>> {
        Ok(self.get_resume(resume_id).await?.updated_at)
    }

    /// Write a whole resume back with `PATCH /resume/{id}`.
    ///
    /// When version checking is enabled and the document carries an
    /// `updatedAt`, the stored version is re-read first and the write is
    /// refused with [`ResumeApiError::Conflict`] if it moved.
    #[instrument(skip(self, doc), fields(resume_id = %doc.id))]
    pub async fn patch_resume(&self, doc: &ResumeDocument) -> ApiResult<ResumeDocument> {
        if self.verify_before_patch {
            if let Some(expected) = doc.version() {
                let actual = self.current_version(&doc.id).await?;
                if actual.as_deref() != Some(expected) {
                    warn!(expected, actual = ?actual, "Resume changed since it was read");
                    return Err(ResumeApiError::Conflict {
                        expected: expected.to_string(),
                        actual: actual.unwrap_or_default(),
                    });
                }
            }
        }

        debug!("Updating resume {}", doc.id);

        let url = self.resource_url("/resume", &doc.id)?;
        let response = self.client.patch(&url).json(&doc.to_patch()).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ResumeApiError::NotFound(doc.id.clone()));
        }

        match self.handle_value(response).await? {
            Value::Null => Ok(doc.clone()),
            value => Ok(serde_json::from_value(value).unwrap_or_else(|e| {
                debug!(error = %e, "PATCH response is not a full resume, keeping local copy");
                doc.clone()
            })),
        }
    }

    /// Delete a resume.
    #[instrument(skip(self), fields(resume_id = %resume_id))]
    pub async fn delete_resume(&self, resume_id: &str) -> ApiResult<()> {
        debug!("Deleting resume {}", resume_id);

        let url = self.resource_url("/resume", resume_id)?;
        let response = self.client.delete(&url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ResumeApiError::NotFound(resume_id.to_string()));
        }

        self.handle_value(response).await.map(|_| ())
    }

    /// Get the JSON schema of resume data.
    #[instrument(skip(self))]
    pub async fn get_schema(&self) -> ApiResult<Value> {
        let url = self.endpoint.url("/resume/schema");
        let response = self.client.get(&url).send().await?;
        self.handle_response(response).await
    }

    /// Get the authenticated user.
    #[instrument(skip(self))]
    pub async fn get_user(&self) -> ApiResult<UserProfile> {
        let url = self.endpoint.url("/user/me");
        let response = self.client.get(&url).send().await?;
        self.handle_response(response).await
    }

    /// Render a resume to PDF and return the download URL.
    #[instrument(skip(self), fields(resume_id = %resume_id))]
    pub async fn print_resume(&self, resume_id: &str) -> ApiResult<String> {
        debug!("Printing resume {}", resume_id);

        let url = self.resource_url("/resume/print", resume_id)?;
        let response = self.client.get(&url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ResumeApiError::NotFound(resume_id.to_string()));
        }

        match self.handle_value(response).await? {
            Value::String(url) => Ok(url),
            Value::Object(map) => map
                .get("url")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| ResumeApiError::InvalidResponse("print response has no url".to_string())),
            other => Err(ResumeApiError::InvalidResponse(format!("unexpected print response: {}", other))),
        }
    }

    fn resource_url(&self, path: &str, id: &str) -> ApiResult<String> {
        self.endpoint
            .segment_url(path, id)
            .map_err(|e| ResumeApiError::Config(e.to_string()))
    }

    /// Check status, then parse a JSON body. An empty body yields `Null`.
    async fn handle_value(&self, response: reqwest::Response) -> ApiResult<Value> {
        let response = self.check_status(response).await?;
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body).unwrap_or_else(|_| Value::String(body.trim().to_string())))
    }

    /// Handle API response, converting errors appropriately.
    async fn handle_response<T>(&self, response: reqwest::Response) -> ApiResult<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        self.check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ResumeApiError::InvalidResponse(e.to_string()))
    }

    async fn check_status(&self, response: reqwest::Response) -> ApiResult<reqwest::Response> {
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            let (message, _) = parse_error_body(&body, status);
            error!("Resume service rejected the session ({})", status.as_u16());
            return Err(ResumeApiError::AuthenticationFailed {
                status: status.as_u16(),
                message,
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let (message, details) = parse_error_body(&body, status);
            warn!("Resume API error ({}): {}", status.as_u16(), message);
            return Err(ResumeApiError::ApiError {
                status: status.as_u16(),
                message,
                details,
            });
        }

        Ok(response)
    }
}

/// Extract a message and validation details from an error body.
///
/// Understands `{message, details: [..]}` and `{error, errors: [..]}`
/// shapes, where `message` may itself be a list. Anything else falls back
/// to the raw body, or the status reason when the body is empty.
pub fn parse_error_body(body: &str, status: StatusCode) -> (String, Vec<String>) {
    let fallback = || {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            status.canonical_reason().unwrap_or("Unknown error").to_string()
        } else {
            trimmed.to_string()
        }
    };

    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) else {
        return (fallback(), Vec::new());
    };

    let mut details: Vec<String> = ["details", "errors", "issues"]
        .iter()
        .filter_map(|key| map.get(*key))
        .filter_map(Value::as_array)
        .flatten()
        .map(describe_detail)
        .collect();

    let message = match map.get("message").or_else(|| map.get("error")) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => {
            details.extend(items.iter().map(describe_detail));
            "Request validation failed".to_string()
        }
        _ => fallback(),
    };

    (message, details)
}

fn describe_detail(detail: &Value) -> String {
    match detail {
        Value::String(s) => s.clone(),
        Value::Object(map) => {
            let message = map
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| Value::Object(map.clone()).to_string());
            match map.get("path") {
                Some(Value::Array(path)) if !path.is_empty() => {
                    format!("{}: {}", join_path(path), message)
                }
                Some(Value::String(path)) => format!("{}: {}", path, message),
                _ => message,
            }
        }
        other => other.to_string(),
    }
}

fn join_path(path: &[Value]) -> String {
    path.iter()
        .map(|segment| match segment {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Build the `{error, details}` part of a failure body.
pub fn error_payload(err: &ResumeApiError) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert("error".to_string(), json!(err.to_string()));
    if !err.details().is_empty() {
        payload.insert("details".to_string(), json!(err.details()));
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_zod_style_details() {
        let body = r#"{
            "statusCode": 400,
            "message": "Invalid input",
            "details": [
                {"path": ["data", "sections", "skills", "items", 0, "name"], "message": "Required"},
                "slug is taken"
            ]
        }"#;
        let (message, details) = parse_error_body(body, StatusCode::BAD_REQUEST);
        assert_eq!(message, "Invalid input");
        assert_eq!(details[0], "data.sections.skills.items.0.name: Required");
        assert_eq!(details[1], "slug is taken");
    }

    #[test]
    fn test_parse_message_list() {
        let body = r#"{"message": ["title should not be empty"], "error": "Bad Request"}"#;
        let (message, details) = parse_error_body(body, StatusCode::BAD_REQUEST);
        assert_eq!(message, "Request validation failed");
        assert_eq!(details, vec!["title should not be empty".to_string()]);
    }

    #[test]
    fn test_parse_plain_and_empty_bodies() {
        let (message, details) = parse_error_body("gateway exploded", StatusCode::BAD_GATEWAY);
        assert_eq!(message, "gateway exploded");
        assert!(details.is_empty());

        let (message, _) = parse_error_body("", StatusCode::NOT_FOUND);
        assert_eq!(message, "Not Found");
    }

    #[test]
    fn test_error_payload_includes_details() {
        let err = ResumeApiError::ApiError {
            status: 400,
            message: "Invalid input".to_string(),
            details: vec!["name: Required".to_string()],
        };
        let payload = error_payload(&err);
        assert_eq!(payload["error"], json!("API error (400): Invalid input"));
        assert_eq!(payload["details"], json!(["name: Required"]));

        let payload = error_payload(&ResumeApiError::NotFound("r1".to_string()));
        assert!(payload.get("details").is_none());
    }

    #[test]
    fn test_transient_classification() {
        let server_error = ResumeApiError::ApiError {
            status: 503,
            message: String::new(),
            details: Vec::new(),
        };
        assert!(server_error.is_transient());
        assert!(!ResumeApiError::NotFound("x".to_string()).is_transient());
        assert!(!ResumeApiError::AuthenticationFailed {
            status: 401,
            message: String::new()
        }
        .is_transient());
    }
}
