//! Client-side validation for bulk updates
//!
//! Bulk tools validate their whole payload before touching the network and
//! report every problem at once. Each problem is a short, self-locating
//! message like `experience[1]: startDate '2022/01' is not YYYY, YYYY-MM or YYYY-MM-DD`.

use crate::error::{ResumeError, ResumeResult};
use crate::format::{ensure_scheme, is_present_marker};
use crate::item::{canonicalize, MAX_LEVEL};
use crate::section::SectionKind;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;
use url::Url;

fn date_regex() -> &'static Regex {
    static DATE: OnceLock<Regex> = OnceLock::new();
    DATE.get_or_init(|| {
        Regex::new(r"^\d{4}(-(0[1-9]|1[0-2])(-(0[1-9]|[12]\d|3[01]))?)?$").expect("valid date regex")
    })
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"))
}

/// Whether a date input is `YYYY`, `YYYY-MM` or `YYYY-MM-DD`.
pub fn is_valid_date_input(input: &str) -> bool {
    date_regex().is_match(input.trim())
}

/// Whether a link is an absolute http(s) URL once a scheme is added.
pub fn is_valid_url(input: &str) -> bool {
    let input = input.trim();
    if input.is_empty() {
        return true;
    }
    match Url::parse(&ensure_scheme(input)) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https" | "mailto")
                && (url.scheme() == "mailto" || url.host_str().map(|h| h.contains('.') || h == "localhost").unwrap_or(false))
        }
        Err(_) => false,
    }
}

/// Whether a string looks like an email address.
pub fn is_valid_email(input: &str) -> bool {
    email_regex().is_match(input.trim())
}

/// Accumulates validation problems.
#[derive(Debug, Default)]
pub struct Validator {
    problems: Vec<String>,
}

impl Validator {
    /// Create an empty validator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a problem.
    pub fn push(&mut self, problem: impl Into<String>) {
        self.problems.push(problem.into());
    }

    /// Problems so far.
    pub fn problems(&self) -> &[String] {
        &self.problems
    }

    /// Check the visibility value.
    pub fn check_visibility(&mut self, visibility: &str) {
        if visibility.parse::<crate::Visibility>().is_err() {
            self.push(format!(
                "visibility must be 'public' or 'private', got '{}'",
                visibility
            ));
        }
    }

    /// Check the `basics` object.
    pub fn check_basics(&mut self, basics: &Map<String, Value>) {
        if let Some(email) = basics.get("email").and_then(Value::as_str) {
            if !email.trim().is_empty() && !is_valid_email(email) {
                self.push(format!("basics.email '{}' is not a valid email address", email));
            }
        }
        if let Some(url) = basics.get("url") {
            self.check_url("basics.url", url);
        }
    }

    /// Check one section payload: `{content}` for summary, `{items: [...]}` otherwise.
    pub fn check_section(&mut self, key: &str, payload: &Value) -> Option<SectionKind> {
        let kind = match key.parse::<SectionKind>() {
            Ok(kind) => kind,
            Err(_) => {
                self.push(format!("unknown section '{}'", key));
                return None;
            }
        };

        let Some(payload) = payload.as_object() else {
            self.push(format!("{}: section payload must be an object", key));
            return None;
        };

        if kind.is_free_text() {
            match payload.get("content") {
                Some(Value::String(_)) => {}
                Some(_) => self.push(format!("{}: content must be a string", key)),
                None => self.push(format!("{}: content is required", key)),
            }
            return Some(kind);
        }

        match payload.get("items") {
            Some(Value::Array(items)) => {
                for (index, item) in items.iter().enumerate() {
                    match item.as_object() {
                        Some(item) => self.check_item(kind, index, item),
                        None => self.push(format!("{}[{}]: item must be an object", key, index)),
                    }
                }
            }
            Some(_) => self.push(format!("{}: items must be an array", key)),
            None => self.push(format!("{}: items is required", key)),
        }
        Some(kind)
    }

    /// Check one item.
    ///
    /// Items carrying an `id` may be partial updates of existing items, so
    /// required fields are only enforced on items without one.
    pub fn check_item(&mut self, kind: SectionKind, index: usize, item: &Map<String, Value>) {
        let item = canonicalize(kind, item);
        let at = format!("{}[{}]", kind, index);

        let has_id = item
            .get("id")
            .and_then(Value::as_str)
            .map(|s| !s.trim().is_empty())
            .unwrap_or(false);

        if !has_id {
            for field in kind.required_fields() {
                let present = item
                    .get(field)
                    .and_then(Value::as_str)
                    .map(|s| !s.trim().is_empty())
                    .unwrap_or(false);
                if !present {
                    self.push(format!("{}: {} is required", at, field));
                }
            }
        }

        for (key, is_end) in [("startDate", false), ("endDate", true)] {
            match item.get(key) {
                None | Some(Value::Null) => {}
                Some(Value::String(s)) if s.trim().is_empty() => {}
                Some(Value::String(s)) if is_end && is_present_marker(s) => {}
                Some(Value::String(s)) if is_valid_date_input(s) => {}
                Some(other) => self.push(format!(
                    "{}: {} {} is not YYYY, YYYY-MM or YYYY-MM-DD",
                    at, key, other
                )),
            }
        }

        if let Some(level) = item.get("level") {
            if kind.field("level").is_some() {
                let ok = level
                    .as_i64()
                    .or_else(|| level.as_str().and_then(|s| s.trim().parse().ok()))
                    .map(|l| (0..=MAX_LEVEL).contains(&l))
                    .unwrap_or(level.is_null());
                if !ok {
                    self.push(format!("{}: level must be an integer from 0 to {}", at, MAX_LEVEL));
                }
            }
        }

        if let Some(url) = item.get("url") {
            self.check_url(&format!("{}.url", at), url);
        }
    }

    fn check_url(&mut self, at: &str, url: &Value) {
        let href = match url {
            Value::Null => return,
            Value::String(s) => s.as_str(),
            Value::Object(map) => match map.get("href").or_else(|| map.get("url")) {
                Some(Value::String(s)) => s.as_str(),
                None | Some(Value::Null) => return,
                Some(_) => {
                    self.push(format!("{}: href must be a string", at));
                    return;
                }
            },
            _ => {
                self.push(format!("{}: must be a string or {{label, href}} object", at));
                return;
            }
        };
        if !is_valid_url(href) {
            self.push(format!("{}: '{}' is not a valid URL", at, href));
        }
    }

    /// Fail with every collected problem, or succeed if there were none.
    pub fn finish(self) -> ResumeResult<()> {
        if self.problems.is_empty() {
            Ok(())
        } else {
            Err(ResumeError::Validation(self.problems))
        }
    }
}

/// Check that a normalized item has its required fields filled.
pub fn ensure_required(kind: SectionKind, item: &Map<String, Value>) -> ResumeResult<()> {
    let missing: Vec<String> = kind
        .required_fields()
        .filter(|field| {
            item.get(*field)
                .and_then(Value::as_str)
                .map(|s| s.trim().is_empty())
                .unwrap_or(true)
        })
        .map(|field| format!("{}: {} is required", kind, field))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ResumeError::Validation(missing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_date_inputs() {
        assert!(is_valid_date_input("2022"));
        assert!(is_valid_date_input("2022-01"));
        assert!(is_valid_date_input("2022-01-31"));
        assert!(!is_valid_date_input("2022-13"));
        assert!(!is_valid_date_input("2022/01"));
        assert!(!is_valid_date_input("Jan 2022"));
    }

    #[test]
    fn test_urls() {
        assert!(is_valid_url("example.com"));
        assert!(is_valid_url("https://github.com/user"));
        assert!(is_valid_url(""));
        assert!(!is_valid_url("not a url"));
        assert!(!is_valid_url("ftp://example.com"));
    }

    #[test]
    fn test_validator_aggregates_problems() {
        let mut v = Validator::new();
        v.check_section(
            "experience",
            &json!({ "items": [
                { "position": "Dev", "startDate": "2022/01" },
                { "company": "Acme", "endDate": "present", "url": "acme.io" }
            ]}),
        );
        v.check_section("skills", &json!({ "items": [{ "name": "Go", "level": 7 }] }));
        v.check_section("hobbies", &json!({ "items": [] }));
        v.check_visibility("hidden");

        let problems = v.problems().to_vec();
        assert_eq!(problems.len(), 5, "{:?}", problems);
        assert!(problems.iter().any(|p| p == "experience[0]: company is required"));
        assert!(problems.iter().any(|p| p.starts_with("experience[0]: startDate")));
        assert!(problems.iter().any(|p| p.starts_with("skills[0]: level")));
        assert!(problems.iter().any(|p| p == "unknown section 'hobbies'"));

        let err = v.finish().unwrap_err();
        assert!(err.to_string().starts_with("Validation failed: "));
    }

    #[test]
    fn test_items_with_id_skip_required_check() {
        let mut v = Validator::new();
        v.check_section("skills", &json!({ "items": [{ "id": "s1", "level": 3 }] }));
        assert!(v.finish().is_ok());
    }

    #[test]
    fn test_summary_payload() {
        let mut v = Validator::new();
        assert_eq!(
            v.check_section("summary", &json!({ "content": "Hello" })),
            Some(SectionKind::Summary)
        );
        v.check_section("summary", &json!({ "items": [] }));
        assert_eq!(v.problems(), &["summary: content is required".to_string()]);
    }

    #[test]
    fn test_basics_checks() {
        let mut v = Validator::new();
        let basics = json!({ "email": "nope", "url": { "label": "x", "href": "bad url" } });
        v.check_basics(basics.as_object().unwrap());
        assert_eq!(v.problems().len(), 2);
    }

    #[test]
    fn test_ensure_required() {
        let item = json!({ "network": "GitHub", "username": "" });
        let err = ensure_required(SectionKind::Profiles, item.as_object().unwrap()).unwrap_err();
        assert_eq!(err.to_string(), "Validation failed: profiles: username is required");
    }
}
