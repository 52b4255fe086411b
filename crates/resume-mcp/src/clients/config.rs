//! Resume service configuration.
//!
//! Provides the endpoint, credentials and timeout settings for the resume
//! API client. Configuration is loaded from environment variables at
//! startup and injected into tools; credentials have no built-in defaults.

use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Missing required environment variable.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },
}

/// Environment variables for the API base URL, in lookup order.
pub const BASE_URL_VARS: &[&str] = &["RX_RESUME_BASE_URL", "RX_BASE_URL"];
/// Environment variables for the login email, in lookup order.
pub const EMAIL_VARS: &[&str] = &["RX_RESUME_EMAIL", "RX_EMAIL"];
/// Environment variables for the login password, in lookup order.
pub const PASSWORD_VARS: &[&str] = &["RX_RESUME_PASSWORD", "RX_PASSWORD"];
/// Environment variables for the public site URL, in lookup order.
pub const PUBLIC_URL_VARS: &[&str] = &["RX_RESUME_PUBLIC_URL", "RX_PUBLIC_URL"];

/// Configuration for the resume service client.
#[derive(Debug, Clone)]
pub struct ResumeConfig {
    /// API endpoint.
    pub endpoint: ResumeEndpoint,

    /// Login credentials.
    pub credentials: Credentials,

    /// Default request timeout in seconds.
    pub default_timeout_secs: u64,

    /// Per-request timeout for retried section reads, in seconds.
    pub read_timeout_secs: u64,

    /// Maximum attempts for retried reads.
    pub max_retries: u32,

    /// Re-read `updatedAt` right before each PATCH and refuse to write if it moved.
    pub verify_before_patch: bool,
}

impl ResumeConfig {
    /// Create a configuration with default timeouts.
    pub fn new(
        base_url: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: ResumeEndpoint {
                base_url: base_url.into(),
                public_url: None,
            },
            credentials: Credentials::new(email, password),
            default_timeout_secs: 30,
            read_timeout_secs: 5,
            max_retries: 3,
            verify_before_patch: true,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `RX_RESUME_BASE_URL` / `RX_BASE_URL`: API base URL, e.g. `https://rx.example.com/api` (required)
    /// - `RX_RESUME_EMAIL` / `RX_EMAIL`: login email or username (required)
    /// - `RX_RESUME_PASSWORD` / `RX_PASSWORD`: login password (required)
    /// - `RX_RESUME_PUBLIC_URL` / `RX_PUBLIC_URL`: public site URL (default: base URL without `/api`)
    /// - `RX_RESUME_TIMEOUT_SECS`: request timeout in seconds (default: 30)
    /// - `RX_RESUME_READ_TIMEOUT_SECS`: timeout for retried reads (default: 5)
    /// - `RX_RESUME_MAX_RETRIES`: attempts for retried reads (default: 3)
    /// - `RX_RESUME_VERIFY_BEFORE_PATCH`: version re-check before PATCH (default: true)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |keys: &[&str]| {
            keys.iter()
                .filter_map(|k| lookup(k))
                .map(|v| v.trim().to_string())
                .find(|v| !v.is_empty())
        };
        let required = |keys: &[&str]| {
            first(keys).ok_or_else(|| ConfigError::MissingEnvVar(keys[0].to_string()))
        };

        let base_url = required(BASE_URL_VARS)?;
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                key: BASE_URL_VARS[0].to_string(),
                message: format!("'{}' must start with http:// or https://", base_url),
            });
        }

        let mut config = Self::new(base_url, required(EMAIL_VARS)?, required(PASSWORD_VARS)?);
        config.endpoint.public_url = first(PUBLIC_URL_VARS);

        if let Some(v) = first(&["RX_RESUME_TIMEOUT_SECS"]) {
            config.default_timeout_secs = parse_number("RX_RESUME_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = first(&["RX_RESUME_READ_TIMEOUT_SECS"]) {
            config.read_timeout_secs = parse_number("RX_RESUME_READ_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = first(&["RX_RESUME_MAX_RETRIES"]) {
            config.max_retries = parse_number("RX_RESUME_MAX_RETRIES", &v)?;
        }
        if let Some(v) = first(&["RX_RESUME_VERIFY_BEFORE_PATCH"]) {
            config.verify_before_patch = v != "false" && v != "0";
        }

        Ok(config)
    }

    /// Get the default request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }

    /// Get the retried-read timeout as a Duration.
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    /// Apply per-call overrides, returning the endpoint and credentials to use.
    pub fn resolve(&self, overrides: Option<&CredentialOverride>) -> (ResumeEndpoint, Credentials) {
        let mut endpoint = self.endpoint.clone();
        let mut credentials = self.credentials.clone();

        if let Some(o) = overrides {
            if let Some(base_url) = o.base_url.as_deref().filter(|s| !s.trim().is_empty()) {
                endpoint.base_url = base_url.trim().to_string();
            }
            if let Some(email) = o.email.as_deref().filter(|s| !s.trim().is_empty()) {
                credentials.email = email.trim().to_string();
            }
            if let Some(password) = o.password.as_deref().filter(|s| !s.is_empty()) {
                credentials.password = password.to_string();
            }
        }

        (endpoint, credentials)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("'{}' is not a valid number", value),
    })
}

/// Login credentials for the resume service.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    /// Email or username.
    pub email: String,

    /// Password.
    pub password: String,
}

impl Credentials {
    /// Create credentials.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Per-call credential overrides supplied in a tool's `auth` argument.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialOverride {
    /// Email override.
    #[serde(default)]
    pub email: Option<String>,

    /// Password override.
    #[serde(default)]
    pub password: Option<String>,

    /// Base URL override.
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Resume API endpoint.
#[derive(Debug, Clone)]
pub struct ResumeEndpoint {
    /// Base URL for the API (e.g., "https://rx.example.com/api").
    pub base_url: String,

    /// Public site URL used to build share links.
    pub public_url: Option<String>,
}

impl ResumeEndpoint {
    /// Build a full URL by appending a path to the base URL.
    pub fn url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }

    /// Build a URL for `path` followed by `segment` as a single escaped path segment.
    ///
    /// `/` and `%` inside `segment` are percent-encoded, so an ID can never
    /// address a different endpoint. Empty, `.` and `..` segments are rejected.
    pub fn segment_url(&self, path: &str, segment: &str) -> Result<String, ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: BASE_URL_VARS[0].to_string(),
            message,
        };

        if matches!(segment.trim(), "" | "." | "..") {
            return Err(ConfigError::InvalidValue {
                key: "resume_id".to_string(),
                message: format!("'{}' is not a valid path segment", segment),
            });
        }

        let mut url = Url::parse(&self.url(path)).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid(format!("'{}' cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .push(segment);
        Ok(url.to_string())
    }

    /// Base of public resume links.
    ///
    /// Uses the configured public URL, or the API base without a trailing `/api`.
    pub fn public_base(&self) -> String {
        match self.public_url.as_deref() {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => {
                let base = self.base_url.trim_end_matches('/');
                base.strip_suffix("/api").unwrap_or(base).to_string()
            }
        }
    }
}
