//! Section schema table
//!
//! Every resume section is described by one [`SectionKind`] row: its JSON
//! key, its default heading, and the fields its items carry with their
//! defaults. Merge, validation and the MCP tool schemas are all driven by
//! this table, so adding a field here is enough to support it everywhere.

use crate::error::ResumeError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

/// Default value for an item field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDefault {
    /// String field
    Text(&'static str),
    /// Proficiency level, an integer in `0..=5`
    Level,
    /// List of strings
    List,
    /// `{label, href}` link
    Url,
}

impl FieldDefault {
    /// The JSON value used when the field is absent.
    pub fn to_value(self) -> Value {
        match self {
            FieldDefault::Text(s) => Value::String(s.to_string()),
            FieldDefault::Level => json!(0),
            FieldDefault::List => json!([]),
            FieldDefault::Url => crate::format::empty_url(),
        }
    }

    /// JSON Schema type name for tool input schemas.
    pub fn schema_type(self) -> &'static str {
        match self {
            FieldDefault::Text(_) | FieldDefault::Url => "string",
            FieldDefault::Level => "integer",
            FieldDefault::List => "array",
        }
    }
}

/// One field of a section item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name as stored in the document (camelCase)
    pub name: &'static str,
    /// Value used when absent
    pub default: FieldDefault,
    /// Whether the remote schema rejects an empty value
    pub required: bool,
}

const fn req(name: &'static str, default: FieldDefault) -> FieldSpec {
    FieldSpec { name, default, required: true }
}

const fn opt(name: &'static str, default: FieldDefault) -> FieldSpec {
    FieldSpec { name, default, required: false }
}

const TEXT: FieldDefault = FieldDefault::Text("");

const AWARD_FIELDS: &[FieldSpec] = &[
    req("title", TEXT),
    opt("awarder", TEXT),
    opt("date", TEXT),
    opt("summary", TEXT),
    opt("url", FieldDefault::Url),
];

const CERTIFICATION_FIELDS: &[FieldSpec] = &[
    req("name", TEXT),
    opt("issuer", TEXT),
    opt("date", TEXT),
    opt("summary", TEXT),
    opt("url", FieldDefault::Url),
];

const EDUCATION_FIELDS: &[FieldSpec] = &[
    req("institution", TEXT),
    opt("studyType", TEXT),
    opt("area", TEXT),
    opt("score", TEXT),
    opt("date", TEXT),
    opt("summary", TEXT),
    opt("url", FieldDefault::Url),
];

const EXPERIENCE_FIELDS: &[FieldSpec] = &[
    req("company", TEXT),
    opt("position", TEXT),
    opt("location", TEXT),
    opt("date", TEXT),
    opt("summary", TEXT),
    opt("url", FieldDefault::Url),
];

const VOLUNTEER_FIELDS: &[FieldSpec] = &[
    req("organization", TEXT),
    opt("position", TEXT),
    opt("location", TEXT),
    opt("date", TEXT),
    opt("summary", TEXT),
    opt("url", FieldDefault::Url),
];

const INTEREST_FIELDS: &[FieldSpec] = &[req("name", TEXT), opt("keywords", FieldDefault::List)];

const LANGUAGE_FIELDS: &[FieldSpec] = &[
    req("name", TEXT),
    opt("description", TEXT),
    opt("level", FieldDefault::Level),
];

const PROFILE_FIELDS: &[FieldSpec] = &[
    req("network", TEXT),
    req("username", TEXT),
    opt("icon", TEXT),
    opt("url", FieldDefault::Url),
];

const PROJECT_FIELDS: &[FieldSpec] = &[
    req("name", TEXT),
    opt("description", TEXT),
    opt("date", TEXT),
    opt("summary", TEXT),
    opt("keywords", FieldDefault::List),
    opt("url", FieldDefault::Url),
];

const PUBLICATION_FIELDS: &[FieldSpec] = &[
    req("name", TEXT),
    opt("publisher", TEXT),
    opt("date", TEXT),
    opt("summary", TEXT),
    opt("url", FieldDefault::Url),
];

const REFERENCE_FIELDS: &[FieldSpec] = &[
    req("name", TEXT),
    opt("description", TEXT),
    opt("summary", TEXT),
    opt("url", FieldDefault::Url),
];

const SKILL_FIELDS: &[FieldSpec] = &[
    req("name", TEXT),
    opt("description", TEXT),
    opt("level", FieldDefault::Level),
    opt("keywords", FieldDefault::List),
];

/// A resume section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    /// Free-text professional summary
    Summary,
    /// Awards and honours
    Awards,
    /// Certifications
    Certifications,
    /// Education history
    Education,
    /// Work experience
    Experience,
    /// Volunteering
    Volunteer,
    /// Interests
    Interests,
    /// Spoken languages
    Languages,
    /// Social/network profiles
    Profiles,
    /// Projects
    Projects,
    /// Publications
    Publications,
    /// References
    References,
    /// Skills
    Skills,
}

impl SectionKind {
    /// All sections in document order.
    pub const ALL: [SectionKind; 13] = [
        SectionKind::Summary,
        SectionKind::Awards,
        SectionKind::Certifications,
        SectionKind::Education,
        SectionKind::Experience,
        SectionKind::Volunteer,
        SectionKind::Interests,
        SectionKind::Languages,
        SectionKind::Profiles,
        SectionKind::Projects,
        SectionKind::Publications,
        SectionKind::References,
        SectionKind::Skills,
    ];

    /// Key under `data.sections`.
    pub fn key(self) -> &'static str {
        match self {
            SectionKind::Summary => "summary",
            SectionKind::Awards => "awards",
            SectionKind::Certifications => "certifications",
            SectionKind::Education => "education",
            SectionKind::Experience => "experience",
            SectionKind::Volunteer => "volunteer",
            SectionKind::Interests => "interests",
            SectionKind::Languages => "languages",
            SectionKind::Profiles => "profiles",
            SectionKind::Projects => "projects",
            SectionKind::Publications => "publications",
            SectionKind::References => "references",
            SectionKind::Skills => "skills",
        }
    }

    /// Default section heading.
    pub fn display_name(self) -> &'static str {
        match self {
            SectionKind::Summary => "Summary",
            SectionKind::Awards => "Awards",
            SectionKind::Certifications => "Certifications",
            SectionKind::Education => "Education",
            SectionKind::Experience => "Experience",
            SectionKind::Volunteer => "Volunteering",
            SectionKind::Interests => "Interests",
            SectionKind::Languages => "Languages",
            SectionKind::Profiles => "Profiles",
            SectionKind::Projects => "Projects",
            SectionKind::Publications => "Publications",
            SectionKind::References => "References",
            SectionKind::Skills => "Skills",
        }
    }

    /// Noun for a single item, used in user-facing messages.
    pub fn item_noun(self) -> &'static str {
        match self {
            SectionKind::Summary => "Summary",
            SectionKind::Awards => "Award",
            SectionKind::Certifications => "Certification",
            SectionKind::Education => "Education entry",
            SectionKind::Experience => "Experience entry",
            SectionKind::Volunteer => "Volunteer entry",
            SectionKind::Interests => "Interest",
            SectionKind::Languages => "Language",
            SectionKind::Profiles => "Profile",
            SectionKind::Projects => "Project",
            SectionKind::Publications => "Publication",
            SectionKind::References => "Reference",
            SectionKind::Skills => "Skill",
        }
    }

    /// Whether the section holds `content` instead of `items`.
    pub fn is_free_text(self) -> bool {
        self == SectionKind::Summary
    }

    /// Item fields, excluding `id` and `visible`.
    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            SectionKind::Summary => &[],
            SectionKind::Awards => AWARD_FIELDS,
            SectionKind::Certifications => CERTIFICATION_FIELDS,
            SectionKind::Education => EDUCATION_FIELDS,
            SectionKind::Experience => EXPERIENCE_FIELDS,
            SectionKind::Volunteer => VOLUNTEER_FIELDS,
            SectionKind::Interests => INTEREST_FIELDS,
            SectionKind::Languages => LANGUAGE_FIELDS,
            SectionKind::Profiles => PROFILE_FIELDS,
            SectionKind::Projects => PROJECT_FIELDS,
            SectionKind::Publications => PUBLICATION_FIELDS,
            SectionKind::References => REFERENCE_FIELDS,
            SectionKind::Skills => SKILL_FIELDS,
        }
    }

    /// Look up one field by its document name.
    pub fn field(self, name: &str) -> Option<&'static FieldSpec> {
        self.fields().iter().find(|f| f.name == name)
    }

    /// Names of fields that must be non-empty.
    pub fn required_fields(self) -> impl Iterator<Item = &'static str> {
        self.fields().iter().filter(|f| f.required).map(|f| f.name)
    }

    /// Whether items carry a display `date` string.
    pub fn has_date(self) -> bool {
        self.field("date").is_some()
    }

    /// The field that best identifies an item in summaries.
    pub fn title_field(self) -> Option<&'static str> {
        self.fields().first().map(|f| f.name)
    }

    /// A fresh, empty section object.
    pub fn default_section(self) -> Value {
        let mut section = json!({
            "id": self.key(),
            "name": self.display_name(),
            "columns": 1,
            "separateLinks": true,
            "visible": true,
        });
        if let Some(map) = section.as_object_mut() {
            if self.is_free_text() {
                map.insert("content".to_string(), json!(""));
            } else {
                map.insert("items".to_string(), json!([]));
            }
        }
        section
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for SectionKind {
    type Err = ResumeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        SectionKind::ALL
            .iter()
            .copied()
            .find(|k| k.key() == needle)
            .ok_or_else(|| ResumeError::UnknownSection(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_roundtrip() {
        for kind in SectionKind::ALL {
            assert_eq!(kind.key().parse::<SectionKind>().unwrap(), kind);
        }
        assert_eq!("Skills".parse::<SectionKind>().unwrap(), SectionKind::Skills);
        assert!("custom".parse::<SectionKind>().is_err());
    }

    #[test]
    fn test_every_item_section_has_required_field() {
        for kind in SectionKind::ALL.iter().filter(|k| !k.is_free_text()) {
            assert!(
                kind.required_fields().count() >= 1,
                "{} has no required field",
                kind
            );
        }
    }

    #[test]
    fn test_default_section_shapes() {
        let summary = SectionKind::Summary.default_section();
        assert_eq!(summary["content"], json!(""));
        assert!(summary.get("items").is_none());

        let skills = SectionKind::Skills.default_section();
        assert_eq!(skills["id"], json!("skills"));
        assert_eq!(skills["name"], json!("Skills"));
        assert_eq!(skills["items"], json!([]));
        assert_eq!(skills["visible"], json!(true));
    }

    #[test]
    fn test_has_date() {
        assert!(SectionKind::Experience.has_date());
        assert!(SectionKind::Awards.has_date());
        assert!(!SectionKind::Skills.has_date());
        assert!(!SectionKind::Profiles.has_date());
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_value(SectionKind::Volunteer).unwrap(), json!("volunteer"));
    }
}
