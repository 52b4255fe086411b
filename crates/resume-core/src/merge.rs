//! Section merge operations
//!
//! One table-driven implementation of add/update/remove for every section,
//! plus the bulk "match by id, otherwise append" merge used by the
//! resume-level tools. All operations are all-or-nothing: on error the
//! section is left untouched.

use crate::document::ResumeData;
use crate::error::{ResumeError, ResumeResult};
use crate::item::{backfill_item, item_id, merge_item, normalize_item};
use crate::section::SectionKind;
use crate::validate::ensure_required;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Mutation requested by a section tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Append a new item
    Add,
    /// Remove an item by ID
    Remove,
    /// Change fields of an existing item (or the summary text)
    Update,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Add => "add",
            Operation::Remove => "remove",
            Operation::Update => "update",
        })
    }
}

impl FromStr for Operation {
    type Err = ResumeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "add" => Ok(Operation::Add),
            "remove" => Ok(Operation::Remove),
            "update" => Ok(Operation::Update),
            other => Err(ResumeError::invalid(format!(
                "Invalid operation '{}'. Must be one of: add, remove, update",
                other
            ))),
        }
    }
}

/// A change to one section.
#[derive(Debug, Clone)]
pub enum SectionChange {
    /// Append new items
    Add(Vec<Map<String, Value>>),
    /// Patch existing items; each must carry an `id`
    Update(Vec<Map<String, Value>>),
    /// Remove items by ID
    Remove(Vec<String>),
    /// Replace the summary text
    SetContent(String),
}

impl SectionChange {
    /// The operation this change corresponds to.
    pub fn operation(&self) -> Operation {
        match self {
            SectionChange::Add(_) => Operation::Add,
            SectionChange::Remove(_) => Operation::Remove,
            SectionChange::Update(_) | SectionChange::SetContent(_) => Operation::Update,
        }
    }
}

/// What a merge did to a section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Section key
    pub section: String,
    /// IDs of appended items
    pub added: Vec<String>,
    /// IDs of items changed in place
    pub updated: Vec<String>,
    /// IDs of removed items
    pub removed: Vec<String>,
    /// Item count before
    pub before: usize,
    /// Item count after
    pub after: usize,
}

impl MergeOutcome {
    fn new(kind: SectionKind, before: usize) -> Self {
        Self {
            section: kind.key().to_string(),
            before,
            after: before,
            ..Self::default()
        }
    }

    /// The single item ID touched, for single-item tool responses.
    pub fn primary_id(&self) -> Option<&str> {
        self.added
            .first()
            .or_else(|| self.updated.first())
            .or_else(|| self.removed.first())
            .map(String::as_str)
    }
}

fn unsupported(kind: SectionKind, operation: Operation) -> ResumeError {
    ResumeError::UnsupportedOperation {
        section: kind.key().to_string(),
        operation: operation.to_string(),
    }
}

fn not_found(kind: SectionKind, id: &str) -> ResumeError {
    ResumeError::ItemNotFound {
        noun: kind.item_noun().to_string(),
        id: id.to_string(),
    }
}

/// Apply a change to one section of `data`.
///
/// # Examples
///
/// ```
/// use resume_core::merge::{apply, SectionChange};
/// use resume_core::{ResumeData, SectionKind};
/// use serde_json::json;
///
/// let mut data = ResumeData::blank();
/// let item = json!({ "skill_name": "Go", "skill_level": 4 });
/// let outcome = apply(
///     &mut data,
///     SectionKind::Skills,
///     SectionChange::Add(vec![item.as_object().unwrap().clone()]),
/// )
/// .unwrap();
///
/// assert_eq!(outcome.after, outcome.before + 1);
/// assert_eq!(data.items(SectionKind::Skills)[0]["name"], json!("Go"));
/// ```
pub fn apply(data: &mut ResumeData, kind: SectionKind, change: SectionChange) -> ResumeResult<MergeOutcome> {
    if kind.is_free_text() {
        return match change {
            SectionChange::SetContent(content) => {
                data.set_summary(content);
                Ok(MergeOutcome::new(kind, 0))
            }
            other => Err(unsupported(kind, other.operation())),
        };
    }

    let items = data.items_mut(kind)?;
    let mut outcome = MergeOutcome::new(kind, items.len());

    match change {
        SectionChange::SetContent(_) => return Err(unsupported(kind, Operation::Update)),

        SectionChange::Add(inputs) => {
            let mut prepared = Vec::with_capacity(inputs.len());
            for input in &inputs {
                let item = normalize_item(kind, input)?;
                ensure_required(kind, &item)?;
                if let Some(id) = item.get("id").and_then(Value::as_str) {
                    if items.iter().any(|existing| item_id(existing) == Some(id)) {
                        return Err(ResumeError::invalid(format!(
                            "{} with ID '{}' already exists",
                            kind.item_noun(),
                            id
                        )));
                    }
                    outcome.added.push(id.to_string());
                }
                prepared.push(Value::Object(item));
            }
            items.extend(prepared);
        }

        SectionChange::Update(patches) => {
            let mut staged = items.clone();
            for patch in &patches {
                let id = patch
                    .get("id")
                    .or_else(|| patch.get("item_id"))
                    .and_then(Value::as_str)
                    .filter(|s| !s.trim().is_empty())
                    .ok_or_else(|| ResumeError::MissingField("item_id".to_string()))?;

                let target = staged
                    .iter_mut()
                    .find(|existing| item_id(existing) == Some(id))
                    .and_then(Value::as_object_mut)
                    .ok_or_else(|| not_found(kind, id))?;

                merge_item(kind, target, patch);
                outcome.updated.push(id.to_string());
            }
            *items = staged;
        }

        SectionChange::Remove(ids) => {
            if ids.is_empty() {
                return Err(ResumeError::MissingField("item_id".to_string()));
            }
            if let Some(missing) = ids
                .iter()
                .find(|id| !items.iter().any(|existing| item_id(existing) == Some(id.as_str())))
            {
                return Err(not_found(kind, missing));
            }
            // Only the first match of each requested id is removed
            for id in &ids {
                if outcome.removed.contains(id) {
                    continue;
                }
                if let Some(index) = items.iter().position(|existing| item_id(existing) == Some(id.as_str())) {
                    items.remove(index);
                }
                outcome.removed.push(id.clone());
            }
        }
    }

    outcome.after = items.len();
    Ok(outcome)
}

/// Bulk merge: items with a known `id` are patched in place, everything
/// else is normalized and appended.
pub fn merge_items(
    data: &mut ResumeData,
    kind: SectionKind,
    incoming: &[Map<String, Value>],
) -> ResumeResult<MergeOutcome> {
    let items = data.items_mut(kind)?;
    let mut outcome = MergeOutcome::new(kind, items.len());
    let mut staged = items.clone();

    for input in incoming {
        let id = input
            .get("id")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty());

        let position = id.and_then(|id| staged.iter().position(|item| item_id(item) == Some(id)));

        match (position, id) {
            (Some(index), Some(id)) => {
                if let Some(target) = staged[index].as_object_mut() {
                    merge_item(kind, target, input);
                }
                outcome.updated.push(id.to_string());
            }
            _ => {
                let item = normalize_item(kind, input)?;
                ensure_required(kind, &item)?;
                if let Some(id) = item.get("id").and_then(Value::as_str) {
                    outcome.added.push(id.to_string());
                }
                staged.push(Value::Object(item));
            }
        }
    }

    outcome.after = staged.len();
    *items = staged;
    Ok(outcome)
}

/// Apply a bulk `sections` payload: `{ key: {content} | {items: [...]} }`.
pub fn merge_sections(data: &mut ResumeData, sections: &Map<String, Value>) -> ResumeResult<Vec<MergeOutcome>> {
    let mut outcomes = Vec::with_capacity(sections.len());
    for (key, payload) in sections {
        let kind: SectionKind = key.parse()?;
        let payload = payload
            .as_object()
            .ok_or_else(|| ResumeError::invalid(format!("{}: section payload must be an object", key)))?;

        if kind.is_free_text() {
            let content = payload
                .get("content")
                .and_then(Value::as_str)
                .ok_or_else(|| ResumeError::MissingField(format!("{}.content", key)))?;
            outcomes.push(apply(data, kind, SectionChange::SetContent(content.to_string()))?);
            continue;
        }

        let items: Vec<Map<String, Value>> = payload
            .get("items")
            .and_then(Value::as_array)
            .ok_or_else(|| ResumeError::MissingField(format!("{}.items", key)))?
            .iter()
            .filter_map(|item| item.as_object().cloned())
            .collect();
        outcomes.push(merge_items(data, kind, &items)?);
    }
    Ok(outcomes)
}

/// Bring a whole document up to schema before a PATCH: default basics,
/// every section present, and every item backfilled with id and defaults.
pub fn sanitize(data: &mut ResumeData) {
    data.ensure_basics();
    for kind in SectionKind::ALL {
        data.ensure_section(kind);
        if kind.is_free_text() {
            continue;
        }
        if let Ok(items) = data.items_mut(kind) {
            items.retain(Value::is_object);
            for item in items.iter_mut().filter_map(Value::as_object_mut) {
                backfill_item(kind, item);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn data_with_skill() -> ResumeData {
        let mut data = ResumeData::blank();
        apply(
            &mut data,
            SectionKind::Skills,
            SectionChange::Add(vec![obj(json!({ "id": "s1", "name": "Rust", "level": 5 }))]),
        )
        .unwrap();
        data
    }

    #[test]
    fn test_add_grows_by_one() {
        let mut data = data_with_skill();
        let outcome = apply(
            &mut data,
            SectionKind::Skills,
            SectionChange::Add(vec![obj(json!({ "skill_name": "Go", "skill_level": 4 }))]),
        )
        .unwrap();

        assert_eq!(outcome.before, 1);
        assert_eq!(outcome.after, 2);
        let new_id = outcome.primary_id().unwrap();
        assert!(!new_id.is_empty());

        let added = &data.items(SectionKind::Skills)[1];
        assert_eq!(added["name"], json!("Go"));
        assert_eq!(added["level"], json!(4));
        assert_eq!(added["id"], json!(new_id));
    }

    #[test]
    fn test_add_requires_fields() {
        let mut data = ResumeData::blank();
        let err = apply(
            &mut data,
            SectionKind::Experience,
            SectionChange::Add(vec![obj(json!({ "position": "Dev" }))]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("company is required"));
        assert!(data.items(SectionKind::Experience).is_empty());
    }

    #[test]
    fn test_add_rejects_duplicate_id() {
        let mut data = data_with_skill();
        let err = apply(
            &mut data,
            SectionKind::Skills,
            SectionChange::Add(vec![obj(json!({ "id": "s1", "name": "Dup" }))]),
        );
        assert!(err.is_err());
        assert_eq!(data.items(SectionKind::Skills).len(), 1);
    }

    #[test]
    fn test_remove_shrinks_by_one() {
        let mut data = data_with_skill();
        let outcome = apply(&mut data, SectionKind::Skills, SectionChange::Remove(vec!["s1".into()])).unwrap();
        assert_eq!(outcome.before - outcome.after, 1);
        assert!(data.items(SectionKind::Skills).iter().all(|i| item_id(i) != Some("s1")));
    }

    #[test]
    fn test_remove_duplicate_stored_id_drops_one_copy() {
        let mut data = data_with_skill();
        data.items_mut(SectionKind::Skills)
            .unwrap()
            .push(json!({ "id": "s1", "name": "Rust (copy)", "level": 3 }));

        let outcome = apply(&mut data, SectionKind::Skills, SectionChange::Remove(vec!["s1".to_string(), "s1".to_string()])).unwrap();
        assert_eq!(outcome.before, 2);
        assert_eq!(outcome.after, 1);
        assert_eq!(outcome.removed, vec!["s1".to_string()]);
        assert_eq!(data.items(SectionKind::Skills)[0]["name"], json!("Rust (copy)"));
    }

    #[test]
    fn test_remove_missing_is_error() {
        let mut data = data_with_skill();
        let err = apply(
            &mut data,
            SectionKind::Skills,
            SectionChange::Remove(vec!["nonexistent".into()]),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Skill with ID 'nonexistent' not found.");
        assert_eq!(data.items(SectionKind::Skills).len(), 1);
    }

    #[test]
    fn test_remove_is_all_or_nothing() {
        let mut data = data_with_skill();
        let err = apply(
            &mut data,
            SectionKind::Skills,
            SectionChange::Remove(vec!["s1".into(), "ghost".into()]),
        );
        assert!(err.is_err());
        assert_eq!(data.items(SectionKind::Skills).len(), 1);
    }

    #[test]
    fn test_update_in_place() {
        let mut data = data_with_skill();
        let outcome = apply(
            &mut data,
            SectionKind::Skills,
            SectionChange::Update(vec![obj(json!({ "id": "s1", "level": 3, "keywords": ["tokio"] }))]),
        )
        .unwrap();
        assert_eq!(outcome.updated, vec!["s1".to_string()]);
        let item = &data.items(SectionKind::Skills)[0];
        assert_eq!(item["name"], json!("Rust"));
        assert_eq!(item["level"], json!(3));
        assert_eq!(item["keywords"], json!(["tokio"]));
    }

    #[test]
    fn test_update_unknown_id() {
        let mut data = data_with_skill();
        let err = apply(
            &mut data,
            SectionKind::Skills,
            SectionChange::Update(vec![obj(json!({ "id": "nope", "level": 1 }))]),
        )
        .unwrap_err();
        assert!(matches!(err, ResumeError::ItemNotFound { .. }));
    }

    #[test]
    fn test_summary_operations() {
        let mut data = ResumeData::blank();
        apply(&mut data, SectionKind::Summary, SectionChange::SetContent("Hello".into())).unwrap();
        assert_eq!(data.summary(), "Hello");

        let err = apply(&mut data, SectionKind::Summary, SectionChange::Remove(vec!["x".into()]));
        assert!(matches!(err, Err(ResumeError::UnsupportedOperation { .. })));
    }

    #[test]
    fn test_merge_items_updates_and_appends() {
        let mut data = data_with_skill();
        let outcome = merge_items(
            &mut data,
            SectionKind::Skills,
            &[
                obj(json!({ "id": "s1", "description": "Systems" })),
                obj(json!({ "id": "fresh", "name": "Zig" })),
                obj(json!({ "name": "Python" })),
            ],
        )
        .unwrap();

        assert_eq!(outcome.updated, vec!["s1".to_string()]);
        assert_eq!(outcome.added.len(), 2);
        assert_eq!(outcome.added[0], "fresh");
        assert_eq!(outcome.after, 3);
        assert_eq!(data.items(SectionKind::Skills)[0]["description"], json!("Systems"));
    }

    #[test]
    fn test_merge_sections_payload() {
        let mut data = ResumeData::blank();
        let sections = obj(json!({
            "summary": { "content": "Builder of things" },
            "experience": { "items": [{ "company": "Acme", "startDate": "2022-01" }] }
        }));
        let outcomes = merge_sections(&mut data, &sections).unwrap();
        assert_eq!(outcomes.len(), 2);
        assert_eq!(data.summary(), "Builder of things");
        assert_eq!(data.items(SectionKind::Experience)[0]["date"], json!("Jan 2022 – Present"));
    }

    #[test]
    fn test_sanitize_backfills_everything() {
        let mut data: ResumeData = serde_json::from_value(json!({
            "basics": {},
            "sections": {
                "skills": { "items": [{ "name": "Rust" }, "garbage"] },
                "summary": { "items": [] }
            }
        }))
        .unwrap();

        sanitize(&mut data);

        let skills = data.items(SectionKind::Skills);
        assert_eq!(skills.len(), 1);
        assert!(!item_id(&skills[0]).unwrap().is_empty());
        assert_eq!(skills[0]["keywords"], json!([]));
        assert_eq!(data.summary(), "");
        assert!(data.section(SectionKind::Publications).is_some());
        assert_eq!(data.basics["url"], json!({ "label": "", "href": "" }));
    }
}
