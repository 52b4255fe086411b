//! Read-side projections
//!
//! Condensed views of a resume for read tools: list rows and short
//! per-section summaries an LLM can scan without the full document.

use crate::document::{ResumeDocument, Visibility};
use crate::section::SectionKind;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Characters of summary text kept in condensed views.
pub const EXCERPT_LENGTH: usize = 200;

/// One row of `list_resumes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeListing {
    /// Resume ID
    pub id: String,
    /// Title
    pub title: String,
    /// Slug
    pub slug: String,
    /// Visibility
    pub visibility: Visibility,
    /// Creation timestamp
    pub created_at: Option<String>,
    /// Last update timestamp
    pub updated_at: Option<String>,
    /// Public URL, only for public resumes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
}

impl From<&ResumeDocument> for ResumeListing {
    fn from(doc: &ResumeDocument) -> Self {
        Self {
            id: doc.id.clone(),
            title: doc.title.clone(),
            slug: doc.slug.clone(),
            visibility: doc.visibility,
            created_at: doc.created_at.clone(),
            updated_at: doc.updated_at.clone(),
            public_url: None,
        }
    }
}

/// Public URL of a resume: `<public_base>/<username>/<slug>`.
pub fn public_url(public_base: &str, username: &str, slug: &str) -> String {
    format!("{}/{}/{}", public_base.trim_end_matches('/'), username, slug)
}

/// Shorten text to `max` characters on a char boundary, adding an ellipsis.
pub fn excerpt(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{}…", cut.trim_end())
}

fn text<'a>(item: &'a Map<String, Value>, key: &str) -> &'a str {
    item.get(key).and_then(Value::as_str).unwrap_or("")
}

/// One-line description of an item.
fn describe_item(kind: SectionKind, item: &Map<String, Value>) -> String {
    let joined = |parts: &[&str]| {
        parts
            .iter()
            .filter(|p| !p.trim().is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" · ")
    };

    match kind {
        SectionKind::Experience | SectionKind::Volunteer => {
            let org = if kind == SectionKind::Experience {
                text(item, "company")
            } else {
                text(item, "organization")
            };
            joined(&[text(item, "position"), org, text(item, "date")])
        }
        SectionKind::Education => joined(&[
            text(item, "studyType"),
            text(item, "area"),
            text(item, "institution"),
            text(item, "date"),
        ]),
        SectionKind::Profiles => joined(&[text(item, "network"), text(item, "username")]),
        SectionKind::Awards => joined(&[text(item, "title"), text(item, "awarder"), text(item, "date")]),
        SectionKind::Certifications => joined(&[text(item, "name"), text(item, "issuer"), text(item, "date")]),
        SectionKind::Publications => joined(&[text(item, "name"), text(item, "publisher"), text(item, "date")]),
        SectionKind::Skills | SectionKind::Languages => {
            let level = item.get("level").and_then(Value::as_i64).unwrap_or(0);
            let name = text(item, "name");
            if level > 0 {
                format!("{} ({}/5)", name, level)
            } else {
                name.to_string()
            }
        }
        _ => kind
            .title_field()
            .map(|f| text(item, f).to_string())
            .unwrap_or_default(),
    }
}

/// Condensed view of one section.
pub fn section_summary(doc: &ResumeDocument, kind: SectionKind) -> Value {
    let section = doc.data.section(kind);
    let visible = section
        .and_then(|s| s.get("visible"))
        .and_then(Value::as_bool)
        .unwrap_or(true);
    let name = section
        .and_then(|s| s.get("name"))
        .and_then(Value::as_str)
        .unwrap_or(kind.display_name());

    if kind.is_free_text() {
        let content = doc.data.summary();
        return json!({
            "section": kind.key(),
            "name": name,
            "visible": visible,
            "present": section.is_some(),
            "length": content.chars().count(),
            "excerpt": excerpt(content, EXCERPT_LENGTH),
        });
    }

    let items: Vec<Value> = doc
        .data
        .items(kind)
        .iter()
        .filter_map(Value::as_object)
        .map(|item| {
            json!({
                "id": item.get("id").cloned().unwrap_or(Value::Null),
                "visible": item.get("visible").and_then(Value::as_bool).unwrap_or(true),
                "description": describe_item(kind, item),
            })
        })
        .collect();

    json!({
        "section": kind.key(),
        "name": name,
        "visible": visible,
        "present": section.is_some(),
        "count": items.len(),
        "items": items,
    })
}

/// Condensed view of every section.
pub fn resume_overview(doc: &ResumeDocument) -> Value {
    let sections: Vec<Value> = SectionKind::ALL
        .iter()
        .map(|kind| section_summary(doc, *kind))
        .collect();
    json!({
        "id": doc.id,
        "title": doc.title,
        "name": doc.data.basics.get("name").cloned().unwrap_or(Value::Null),
        "headline": doc.data.basics.get("headline").cloned().unwrap_or(Value::Null),
        "sections": sections,
    })
}
