//! Item normalization
//!
//! Turns loosely typed caller input into items the remote schema accepts:
//! canonical field names, an ID, `visible`, every field filled, dates
//! rendered as a range string and links as `{label, href}`.

use crate::error::{ResumeError, ResumeResult};
use crate::format::{format_date_range, normalize_url, split_date_range};
use crate::id::generate_id;
use crate::section::{FieldDefault, SectionKind};
use serde_json::{Map, Value};

/// Maximum proficiency level.
pub const MAX_LEVEL: i64 = 5;

const START_KEY: &str = "startDate";
const END_KEY: &str = "endDate";

/// Convert `snake_case` to `camelCase`.
pub fn snake_to_camel(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut upper = false;
    for c in input.chars() {
        if c == '_' {
            upper = !out.is_empty();
        } else if upper {
            out.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Prefix callers use for flat item fields, e.g. `skill_` in `skill_name`.
fn field_prefix(kind: SectionKind) -> &'static str {
    match kind {
        SectionKind::Summary => "summary_",
        SectionKind::Awards => "award_",
        SectionKind::Certifications => "certification_",
        SectionKind::Education => "education_",
        SectionKind::Experience => "experience_",
        SectionKind::Volunteer => "volunteer_",
        SectionKind::Interests => "interest_",
        SectionKind::Languages => "language_",
        SectionKind::Profiles => "profile_",
        SectionKind::Projects => "project_",
        SectionKind::Publications => "publication_",
        SectionKind::References => "reference_",
        SectionKind::Skills => "skill_",
    }
}

/// Map a caller-supplied key to the document field name.
///
/// Returns `None` for keys that are not item fields of this section.
pub fn canonical_key(kind: SectionKind, key: &str) -> Option<&'static str> {
    let stripped = key.strip_prefix(field_prefix(kind)).unwrap_or(key);
    let camel = snake_to_camel(stripped);

    match camel.as_str() {
        "id" | "itemId" => return Some("id"),
        "visible" => return Some("visible"),
        "startDate" | "start" => return Some(START_KEY),
        "endDate" | "end" => return Some(END_KEY),
        "degree" if kind == SectionKind::Education => return Some("studyType"),
        "href" | "website" if kind.field("url").is_some() => return Some("url"),
        _ => {}
    }

    kind.fields()
        .iter()
        .find(|f| f.name == camel)
        .map(|f| f.name)
}

/// Rename caller keys to document field names.
///
/// Unknown keys are kept verbatim so fields added to the remote schema
/// later still pass through.
pub fn canonicalize(kind: SectionKind, input: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    for (key, value) in input {
        match canonical_key(kind, key) {
            Some(name) => {
                out.insert(name.to_string(), value.clone());
            }
            None => {
                out.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }
    }
    out
}

fn coerce(default: FieldDefault, value: &Value) -> Value {
    match default {
        FieldDefault::Text(d) => match value {
            Value::String(_) => value.clone(),
            Value::Number(n) => Value::String(n.to_string()),
            Value::Bool(b) => Value::String(b.to_string()),
            _ => Value::String(d.to_string()),
        },
        FieldDefault::Level => {
            let level = match value {
                Value::Number(n) => n.as_f64().map(|f| f.round() as i64),
                Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f.round() as i64),
                _ => None,
            };
            Value::from(level.unwrap_or(0).clamp(0, MAX_LEVEL))
        }
        FieldDefault::List => match value {
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .filter_map(|v| match v {
                        Value::String(s) => Some(s.trim().to_string()),
                        Value::Number(n) => Some(n.to_string()),
                        _ => None,
                    })
                    .filter(|s| !s.is_empty())
                    .map(Value::String)
                    .collect(),
            ),
            Value::String(s) => Value::Array(
                s.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| Value::String(s.to_string()))
                    .collect(),
            ),
            _ => Value::Array(Vec::new()),
        },
        FieldDefault::Url => normalize_url(value),
    }
}

/// Pull `startDate`/`endDate` out of the map and render `date` from them.
fn apply_date_range(kind: SectionKind, fields: &mut Map<String, Value>) {
    let start = fields.remove(START_KEY);
    let end = fields.remove(END_KEY);
    if !kind.has_date() {
        return;
    }
    let start = start.as_ref().and_then(Value::as_str);
    let end = end.as_ref().and_then(Value::as_str);
    if let Some(date) = format_date_range(start, end) {
        fields.insert("date".to_string(), Value::String(date));
    }
}

fn has_text_id(item: &Map<String, Value>) -> bool {
    item.get("id")
        .and_then(Value::as_str)
        .map(|s| !s.trim().is_empty())
        .unwrap_or(false)
}

/// Build a complete item for `kind` from caller input.
///
/// A non-empty `id` is kept, otherwise one is generated.
///
/// # Examples
///
/// ```
/// use resume_core::item::normalize_item;
/// use resume_core::SectionKind;
/// use serde_json::json;
///
/// let input = json!({ "skill_name": "Go", "skill_level": 4 });
/// let item = normalize_item(SectionKind::Skills, input.as_object().unwrap()).unwrap();
/// assert_eq!(item["name"], json!("Go"));
/// assert_eq!(item["level"], json!(4));
/// assert_eq!(item["keywords"], json!([]));
/// assert!(!item["id"].as_str().unwrap().is_empty());
/// ```
pub fn normalize_item(kind: SectionKind, input: &Map<String, Value>) -> ResumeResult<Map<String, Value>> {
    if kind.is_free_text() {
        return Err(ResumeError::UnsupportedOperation {
            section: kind.key().to_string(),
            operation: "add".to_string(),
        });
    }

    let mut fields = canonicalize(kind, input);
    apply_date_range(kind, &mut fields);

    let mut item = Map::new();
    let id = if has_text_id(&fields) {
        fields.remove("id").unwrap_or(Value::Null)
    } else {
        fields.remove("id");
        Value::String(generate_id())
    };
    item.insert("id".to_string(), id);

    let visible = fields.remove("visible").and_then(|v| v.as_bool()).unwrap_or(true);
    item.insert("visible".to_string(), Value::Bool(visible));

    for spec in kind.fields() {
        let value = match fields.remove(spec.name) {
            Some(v) if !v.is_null() => coerce(spec.default, &v),
            _ => spec.default.to_value(),
        };
        item.insert(spec.name.to_string(), value);
    }

    for (key, value) in fields {
        item.insert(key, value);
    }

    Ok(item)
}

/// Merge a partial update into an existing item.
///
/// Only supplied fields change. The item keeps its ID; a different `id` in
/// the patch is ignored. Missing fields are backfilled so older items
/// written by other clients also end up schema-complete.
pub fn merge_item(kind: SectionKind, existing: &mut Map<String, Value>, patch: &Map<String, Value>) {
    let mut fields = canonicalize(kind, patch);
    fields.remove("id");

    let supplied = |fields: &Map<String, Value>, key: &str| fields.get(key).map(|v| !v.is_null()).unwrap_or(false);
    let has_start = supplied(&fields, START_KEY);
    let has_end = supplied(&fields, END_KEY);
    if has_start || has_end {
        // One bound alone keeps the other bound of the stored range
        if has_start != has_end {
            let (start, end) = existing
                .get("date")
                .and_then(Value::as_str)
                .map(split_date_range)
                .unwrap_or_default();
            let kept = if has_start { (END_KEY, end) } else { (START_KEY, start) };
            if let (key, Some(value)) = kept {
                fields.insert(key.to_string(), Value::String(value));
            }
        }
        apply_date_range(kind, &mut fields);
    }

    for (key, value) in fields {
        if value.is_null() {
            continue;
        }
        let value = match kind.field(&key) {
            Some(spec) => coerce(spec.default, &value),
            None if key == "visible" => Value::Bool(value.as_bool().unwrap_or(true)),
            None => value,
        };
        existing.insert(key, value);
    }

    backfill_item(kind, existing);
}

/// Fill missing `id`, `visible` and field defaults on an item in place.
pub fn backfill_item(kind: SectionKind, item: &mut Map<String, Value>) {
    if !has_text_id(item) {
        item.insert("id".to_string(), Value::String(generate_id()));
    }
    if !item.get("visible").map(Value::is_boolean).unwrap_or(false) {
        item.insert("visible".to_string(), Value::Bool(true));
    }
    for spec in kind.fields() {
        let current = item.get(spec.name).cloned().unwrap_or(Value::Null);
        let value = if current.is_null() {
            spec.default.to_value()
        } else {
            coerce(spec.default, &current)
        };
        item.insert(spec.name.to_string(), value);
    }
}

/// The `id` of an item, if it has one.
pub fn item_id(item: &Value) -> Option<&str> {
    item.get("id").and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_snake_to_camel() {
        assert_eq!(snake_to_camel("study_type"), "studyType");
        assert_eq!(snake_to_camel("start_date"), "startDate");
        assert_eq!(snake_to_camel("name"), "name");
        assert_eq!(snake_to_camel("_leading"), "leading");
    }

    #[test]
    fn test_canonical_key_aliases() {
        assert_eq!(canonical_key(SectionKind::Skills, "skill_name"), Some("name"));
        assert_eq!(canonical_key(SectionKind::Skills, "skill_level"), Some("level"));
        assert_eq!(canonical_key(SectionKind::Education, "degree"), Some("studyType"));
        assert_eq!(canonical_key(SectionKind::Education, "study_type"), Some("studyType"));
        assert_eq!(canonical_key(SectionKind::Experience, "start_date"), Some("startDate"));
        assert_eq!(canonical_key(SectionKind::Experience, "item_id"), Some("id"));
        assert_eq!(canonical_key(SectionKind::Skills, "company"), None);
    }

    #[test]
    fn test_normalize_experience_item() {
        let item = normalize_item(
            SectionKind::Experience,
            &obj(json!({
                "company": "Tech Corp",
                "position": "Senior Developer",
                "start_date": "2022-01",
                "end_date": "2024-03",
                "url": "techcorp.com"
            })),
        )
        .unwrap();

        assert_eq!(item["company"], json!("Tech Corp"));
        assert_eq!(item["date"], json!("Jan 2022 – Mar 2024"));
        assert_eq!(item["url"], json!({ "label": "", "href": "https://techcorp.com" }));
        assert_eq!(item["location"], json!(""));
        assert_eq!(item["summary"], json!(""));
        assert_eq!(item["visible"], json!(true));
        assert!(item.get("startDate").is_none());
        assert!(item.values().all(|v| !v.is_null()));
    }

    #[test]
    fn test_normalize_open_ended_date() {
        let item = normalize_item(
            SectionKind::Volunteer,
            &obj(json!({ "organization": "Food Bank", "startDate": "2021-09" })),
        )
        .unwrap();
        assert_eq!(item["date"], json!("Sep 2021 – Present"));
    }

    #[test]
    fn test_normalize_keeps_supplied_id() {
        let item = normalize_item(SectionKind::Skills, &obj(json!({ "id": "abc", "name": "Rust" }))).unwrap();
        assert_eq!(item["id"], json!("abc"));

        let item = normalize_item(SectionKind::Skills, &obj(json!({ "id": "  ", "name": "Rust" }))).unwrap();
        assert_ne!(item["id"], json!("  "));
    }

    #[test]
    fn test_normalize_coerces_types() {
        let item = normalize_item(
            SectionKind::Skills,
            &obj(json!({ "name": "Python", "level": "9", "keywords": "Django, Flask ,," })),
        )
        .unwrap();
        assert_eq!(item["level"], json!(5));
        assert_eq!(item["keywords"], json!(["Django", "Flask"]));
    }

    #[test]
    fn test_normalize_summary_rejected() {
        assert!(normalize_item(SectionKind::Summary, &Map::new()).is_err());
    }

    #[test]
    fn test_merge_item_updates_only_supplied() {
        let mut existing = normalize_item(
            SectionKind::Experience,
            &obj(json!({ "id": "e1", "company": "Old", "position": "Dev", "date": "2020 – 2021" })),
        )
        .unwrap();

        merge_item(
            SectionKind::Experience,
            &mut existing,
            &obj(json!({ "id": "other", "company": "New", "location": null })),
        );

        assert_eq!(existing["id"], json!("e1"));
        assert_eq!(existing["company"], json!("New"));
        assert_eq!(existing["position"], json!("Dev"));
        assert_eq!(existing["date"], json!("2020 – 2021"));
        assert_eq!(existing["location"], json!(""));
    }

    #[test]
    fn test_merge_item_rewrites_dates() {
        let mut existing = obj(json!({ "id": "e1", "company": "Acme", "date": "old" }));
        merge_item(
            SectionKind::Experience,
            &mut existing,
            &obj(json!({ "startDate": "2019-05", "endDate": "present" })),
        );
        assert_eq!(existing["date"], json!("May 2019 – Present"));
        assert_eq!(existing["url"], json!({ "label": "", "href": "" }));
    }

    #[test]
    fn test_merge_item_end_date_only_keeps_start() {
        let mut existing = obj(json!({ "id": "e1", "company": "Acme", "date": "Jan 2022 – Present" }));
        merge_item(SectionKind::Experience, &mut existing, &obj(json!({ "end_date": "2024-03" })));
        assert_eq!(existing["date"], json!("Jan 2022 – Mar 2024"));
    }

    #[test]
    fn test_merge_item_start_date_only_keeps_end() {
        let mut existing = obj(json!({ "id": "e1", "company": "Acme", "date": "Jan 2022 – Mar 2024" }));
        merge_item(SectionKind::Experience, &mut existing, &obj(json!({ "start_date": "2021-05" })));
        assert_eq!(existing["date"], json!("May 2021 – Mar 2024"));

        let mut current = obj(json!({ "id": "e2", "company": "Acme", "date": "Jan 2022 – Present" }));
        merge_item(SectionKind::Experience, &mut current, &obj(json!({ "startDate": "2021-05" })));
        assert_eq!(current["date"], json!("May 2021 – Present"));
    }

    #[test]
    fn test_merge_item_end_date_without_stored_range() {
        let mut existing = obj(json!({ "id": "e1", "company": "Acme" }));
        merge_item(SectionKind::Experience, &mut existing, &obj(json!({ "end_date": "2024-03" })));
        assert_eq!(existing["date"], json!("Mar 2024"));
    }

    #[test]
    fn test_backfill_legacy_item() {
        let mut item = obj(json!({ "name": "Spanish", "level": null }));
        backfill_item(SectionKind::Languages, &mut item);
        assert!(item_id(&Value::Object(item.clone())).is_some());
        assert_eq!(item["level"], json!(0));
        assert_eq!(item["description"], json!(""));
        assert_eq!(item["visible"], json!(true));
    }
}
