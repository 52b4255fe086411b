//! Resume document model
//!
//! The remote service owns the schema, so only the envelope is typed here.
//! Sections and items stay as JSON values and any field this crate does not
//! know about round-trips unchanged through `extra` maps.
//!
//! ```text
//! ResumeDocument
//!   ├─ id, title, slug, visibility, updatedAt
//!   └─ data: ResumeData
//!        ├─ basics   { name, headline, email, url{label,href}, picture, ... }
//!        ├─ sections { summary{content}, skills{items[]}, ... }
//!        └─ metadata (template, layout; passed through)
//! ```

use crate::error::{ResumeError, ResumeResult};
use crate::format::normalize_url;
use crate::section::SectionKind;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;

/// Resume visibility on the public site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Only the owner can see it
    #[default]
    Private,
    /// Published under the owner's public URL
    Public,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Private => f.write_str("private"),
            Visibility::Public => f.write_str("public"),
        }
    }
}

impl FromStr for Visibility {
    type Err = ResumeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "private" => Ok(Visibility::Private),
            "public" => Ok(Visibility::Public),
            other => Err(ResumeError::invalid(format!(
                "visibility must be 'public' or 'private', got '{}'",
                other
            ))),
        }
    }
}

/// A full resume as returned by `GET /resume/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeDocument {
    /// Resume ID
    pub id: String,

    /// Title shown in the dashboard
    #[serde(default)]
    pub title: String,

    /// URL slug
    #[serde(default)]
    pub slug: String,

    /// Visibility
    #[serde(default)]
    pub visibility: Visibility,

    /// Creation timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    /// Last update timestamp, also used as the version token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,

    /// Resume content
    #[serde(default)]
    pub data: ResumeData,

    /// Remaining top-level fields (userId, locked, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResumeDocument {
    /// Whether the resume is published.
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// Version token for lost-update detection.
    pub fn version(&self) -> Option<&str> {
        self.updated_at.as_deref()
    }

    /// Body for `PATCH /resume/{id}`.
    pub fn to_patch(&self) -> ResumePatch<'_> {
        ResumePatch {
            title: &self.title,
            slug: &self.slug,
            visibility: self.visibility,
            data: &self.data,
        }
    }
}

/// Body of `PATCH /resume/{id}`: the whole document minus server-owned fields.
#[derive(Debug, Serialize)]
pub struct ResumePatch<'a> {
    /// Title
    pub title: &'a str,
    /// Slug
    pub slug: &'a str,
    /// Visibility
    pub visibility: Visibility,
    /// Full resume data
    pub data: &'a ResumeData,
}

/// Body of `POST /resume`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewResume {
    /// Title
    pub title: String,
    /// Slug
    pub slug: String,
    /// Visibility
    pub visibility: Visibility,
}

impl NewResume {
    /// Create a request with a slug derived from the title.
    pub fn new(title: impl Into<String>) -> Self {
        let title = title.into();
        let slug = slugify(&title);
        Self {
            title,
            slug,
            visibility: Visibility::Private,
        }
    }

    /// Override the slug.
    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        let slug = slug.into();
        if !slug.trim().is_empty() {
            self.slug = slugify(&slug);
        }
        self
    }

    /// Override visibility.
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }
}

/// Lowercase, hyphen-separated slug. Falls back to `resume` for empty input.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "resume".to_string()
    } else {
        slug
    }
}

/// The `data` object of a resume.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResumeData {
    /// Personal details
    #[serde(default)]
    pub basics: Map<String, Value>,

    /// Sections by key
    #[serde(default)]
    pub sections: Map<String, Value>,

    /// Layout/template metadata
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,

    /// Anything else the service stores under `data`
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Default `basics` object.
pub fn default_basics() -> Map<String, Value> {
    let value = json!({
        "name": "",
        "headline": "",
        "email": "",
        "phone": "",
        "location": "",
        "url": { "label": "", "href": "" },
        "customFields": [],
        "picture": {
            "url": "",
            "size": 64,
            "aspectRatio": 1,
            "borderRadius": 0,
            "effects": { "hidden": false, "border": false, "grayscale": false }
        }
    });
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

impl ResumeData {
    /// Data for a brand new resume: default basics and every section present.
    pub fn blank() -> Self {
        let mut data = Self {
            basics: default_basics(),
            ..Self::default()
        };
        for kind in SectionKind::ALL {
            data.ensure_section(kind);
        }
        data
    }

    /// Fill in any missing `basics` fields with defaults.
    pub fn ensure_basics(&mut self) {
        for (key, value) in default_basics() {
            self.basics.entry(key).or_insert(value);
        }
        if let Some(url) = self.basics.get("url") {
            let normalized = normalize_url(url);
            self.basics.insert("url".to_string(), normalized);
        }
    }

    /// Merge caller-supplied basics. `url` is normalized, `null` values are skipped.
    pub fn merge_basics(&mut self, basics: &Map<String, Value>) {
        self.ensure_basics();
        for (key, value) in basics {
            match (key.as_str(), value) {
                (_, Value::Null) => {}
                ("url", v) => {
                    self.basics.insert(key.clone(), normalize_url(v));
                }
                _ => {
                    self.basics.insert(key.clone(), value.clone());
                }
            }
        }
    }

    /// Get a section, if present.
    pub fn section(&self, kind: SectionKind) -> Option<&Map<String, Value>> {
        self.sections.get(kind.key()).and_then(Value::as_object)
    }

    /// Make sure the section exists and has the shape its kind requires.
    ///
    /// Missing sections are created with defaults. A summary that was stored
    /// with `items` is converted to `content`, and item sections always end
    /// up with an `items` array.
    pub fn ensure_section(&mut self, kind: SectionKind) -> &mut Map<String, Value> {
        let key = kind.key().to_string();
        let slot = self
            .sections
            .entry(key)
            .or_insert_with(|| kind.default_section());
        if !slot.is_object() {
            *slot = kind.default_section();
        }

        let Value::Object(section) = slot else {
            unreachable!("section slot was just set to an object")
        };

        if let Value::Object(defaults) = kind.default_section() {
            for (k, v) in defaults {
                if k == "items" || k == "content" {
                    continue;
                }
                section.entry(k).or_insert(v);
            }
        }

        if kind.is_free_text() {
            section.remove("items");
            if !section.get("content").map(Value::is_string).unwrap_or(false) {
                section.insert("content".to_string(), json!(""));
            }
        } else if !section.get("items").map(Value::is_array).unwrap_or(false) {
            section.insert("items".to_string(), json!([]));
        }

        section
    }

    /// Items of a section. Empty if the section is missing.
    pub fn items(&self, kind: SectionKind) -> &[Value] {
        self.section(kind)
            .and_then(|s| s.get("items"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Mutable items of a section, creating the section if needed.
    pub fn items_mut(&mut self, kind: SectionKind) -> ResumeResult<&mut Vec<Value>> {
        if kind.is_free_text() {
            return Err(ResumeError::UnsupportedOperation {
                section: kind.key().to_string(),
                operation: "items".to_string(),
            });
        }
        self.ensure_section(kind)
            .get_mut("items")
            .and_then(Value::as_array_mut)
            .ok_or_else(|| ResumeError::InvalidDocument(format!("{}.items is not an array", kind)))
    }

    /// Summary text.
    pub fn summary(&self) -> &str {
        self.section(SectionKind::Summary)
            .and_then(|s| s.get("content"))
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    /// Replace the summary text.
    pub fn set_summary(&mut self, content: impl Into<String>) {
        self.ensure_section(SectionKind::Summary)
            .insert("content".to_string(), Value::String(content.into()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResumeDocument {
        serde_json::from_value(json!({
            "id": "res1",
            "title": "My Resume",
            "slug": "my-resume",
            "visibility": "private",
            "updatedAt": "2025-01-01T00:00:00.000Z",
            "userId": "user-1",
            "locked": false,
            "data": {
                "basics": { "name": "Ada" },
                "sections": {
                    "skills": {
                        "id": "skills", "name": "Skills", "visible": true, "columns": 1,
                        "items": [{ "id": "s1", "name": "Rust", "level": 5, "customKey": 1 }]
                    },
                    "summary": { "id": "summary", "name": "Summary", "items": [] }
                },
                "metadata": { "template": "rhyhorn" }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_unknown_fields_round_trip() {
        let doc = sample();
        assert_eq!(doc.extra.get("userId"), Some(&json!("user-1")));

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["userId"], json!("user-1"));
        assert_eq!(value["data"]["metadata"]["template"], json!("rhyhorn"));
        assert_eq!(value["data"]["sections"]["skills"]["items"][0]["customKey"], json!(1));
    }

    #[test]
    fn test_patch_body_excludes_server_fields() {
        let doc = sample();
        let patch = serde_json::to_value(doc.to_patch()).unwrap();
        assert_eq!(patch["title"], json!("My Resume"));
        assert_eq!(patch["visibility"], json!("private"));
        assert!(patch.get("id").is_none());
        assert!(patch.get("updatedAt").is_none());
        assert!(patch["data"]["sections"]["skills"].is_object());
    }

    #[test]
    fn test_ensure_section_creates_missing() {
        let mut doc = sample();
        assert!(doc.data.section(SectionKind::Awards).is_none());
        doc.data.ensure_section(SectionKind::Awards);
        assert_eq!(doc.data.items(SectionKind::Awards).len(), 0);
        assert_eq!(doc.data.section(SectionKind::Awards).unwrap()["name"], json!("Awards"));
    }

    #[test]
    fn test_ensure_section_converts_summary_items() {
        let mut doc = sample();
        let summary = doc.data.ensure_section(SectionKind::Summary);
        assert!(summary.get("items").is_none());
        assert_eq!(summary["content"], json!(""));
    }

    #[test]
    fn test_items_mut_rejects_summary() {
        let mut data = ResumeData::blank();
        assert!(data.items_mut(SectionKind::Summary).is_err());
        assert!(data.items_mut(SectionKind::Skills).unwrap().is_empty());
    }

    #[test]
    fn test_blank_data_has_all_sections() {
        let data = ResumeData::blank();
        for kind in SectionKind::ALL {
            assert!(data.section(kind).is_some(), "missing {}", kind);
        }
        assert_eq!(data.basics["picture"]["size"], json!(64));
    }

    #[test]
    fn test_merge_basics_normalizes_url() {
        let mut data = ResumeData::default();
        let mut basics = Map::new();
        basics.insert("name".to_string(), json!("Grace"));
        basics.insert("url".to_string(), json!("grace.dev"));
        basics.insert("phone".to_string(), Value::Null);
        data.merge_basics(&basics);

        assert_eq!(data.basics["name"], json!("Grace"));
        assert_eq!(data.basics["url"]["href"], json!("https://grace.dev"));
        assert_eq!(data.basics["phone"], json!(""));
    }

    #[test]
    fn test_visibility_parse() {
        assert_eq!("Public".parse::<Visibility>().unwrap(), Visibility::Public);
        assert!("hidden".parse::<Visibility>().is_err());
    }

    #[test]
    fn test_new_resume_slug() {
        let req = NewResume::new("Senior Rust Engineer (2025)");
        assert_eq!(req.slug, "senior-rust-engineer-2025");
        assert_eq!(NewResume::new("!!!").slug, "resume");
        assert_eq!(NewResume::new("x").with_slug("My Slug").slug, "my-slug");
    }
}
