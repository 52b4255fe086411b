//! Resume service client and its configuration.
//!
//! The client logs in once per tool call and holds the session cookies for
//! that call only. Configuration is loaded once at startup and shared.

pub mod config;
pub mod resume;

pub use config::{ConfigError, CredentialOverride, Credentials, ResumeConfig, ResumeEndpoint};
pub use resume::{ApiResult, ResumeApiError, ResumeClient, ResumeSession, UserProfile};
