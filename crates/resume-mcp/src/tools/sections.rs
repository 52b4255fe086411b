//! Section mutation tools
//!
//! One `update_<section>` tool per section kind, all served by
//! [`SectionTool`], plus the generic `update_resume_section`.

use super::common::{
    args_object, content_fields, finish, mutate_resume, object_schema, parse_args, require_text,
    resume_id_schema, success_body, version_schema, ResumeTarget, ToolError, ToolOutcome,
};
use crate::clients::ResumeClient;
use crate::server::{McpServerResult, Tool, ToolContext};
use crate::types::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use resume_core::item::{item_id, snake_to_camel};
use resume_core::merge::{apply, MergeOutcome, Operation, SectionChange};
use resume_core::{FieldDefault, ResumeError, SectionKind};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, instrument};

fn camel_to_snake(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 4);
    for c in input.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn field_schema(kind: SectionKind, name: &str, default: FieldDefault) -> Value {
    let description = match (kind, name) {
        (_, "date") => "Display date; prefer start_date/end_date".to_string(),
        (_, "url") => "Link, either a URL string or {label, href}".to_string(),
        (_, "level") => "Proficiency from 0 to 5".to_string(),
        (SectionKind::Education, "studyType") => "Degree or study type (alias: degree)".to_string(),
        _ => format!("{} {}", kind.item_noun(), camel_to_snake(name).replace('_', " ")),
    };
    match default {
        FieldDefault::List => json!({
            "type": ["array", "string"],
            "items": { "type": "string" },
            "description": format!("{} (array or comma-separated string)", description),
        }),
        FieldDefault::Url => json!({ "type": ["string", "object"], "description": description }),
        other => json!({ "type": other.schema_type(), "description": description }),
    }
}

/// Input schema of an `update_<section>` tool, derived from the section table.
pub fn section_input_schema(kind: SectionKind) -> Value {
    let mut properties = Map::new();
    properties.insert("resume_id".to_string(), resume_id_schema());

    if kind.is_free_text() {
        properties.insert(
            "operation".to_string(),
            json!({ "type": "string", "enum": ["update"], "default": "update" }),
        );
        properties.insert(
            "content".to_string(),
            json!({ "type": "string", "description": "New summary text (HTML allowed)" }),
        );
        properties.insert("expected_updated_at".to_string(), version_schema());
        return object_schema(properties, &["resume_id", "content"]);
    }

    properties.insert(
        "operation".to_string(),
        json!({ "type": "string", "enum": ["add", "remove", "update"] }),
    );
    properties.insert(
        "item_id".to_string(),
        json!({ "type": "string", "description": format!("ID of the {} to update or remove", kind.item_noun().to_lowercase()) }),
    );
    for field in kind.fields() {
        properties.insert(camel_to_snake(field.name), field_schema(kind, field.name, field.default));
    }
    if kind.has_date() {
        properties.insert(
            "start_date".to_string(),
            json!({ "type": "string", "description": "YYYY, YYYY-MM or YYYY-MM-DD" }),
        );
        properties.insert(
            "end_date".to_string(),
            json!({ "type": "string", "description": "YYYY, YYYY-MM, YYYY-MM-DD, or 'present'" }),
        );
    }
    properties.insert(
        "visible".to_string(),
        json!({ "type": "boolean", "description": "Whether the item is shown" }),
    );
    properties.insert("expected_updated_at".to_string(), version_schema());

    object_schema(properties, &["resume_id", "operation"])
}

#[derive(Debug, Deserialize)]
struct SectionArgs {
    #[serde(flatten)]
    target: ResumeTarget,
    #[serde(default)]
    operation: Option<String>,
    #[serde(default)]
    item_id: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

/// Build the change an `update_<section>` call asks for.
fn section_change(kind: SectionKind, args: &SectionArgs, fields: Map<String, Value>) -> Result<SectionChange, ToolError> {
    let operation: Operation = match args.operation.as_deref() {
        Some(op) => op.parse()?,
        None if kind.is_free_text() => Operation::Update,
        None => return Err(ResumeError::MissingField("operation".to_string()).into()),
    };

    if kind.is_free_text() {
        if operation != Operation::Update {
            return Err(ResumeError::UnsupportedOperation {
                section: kind.key().to_string(),
                operation: operation.to_string(),
            }
            .into());
        }
        let content = args
            .content
            .clone()
            .ok_or_else(|| ResumeError::MissingField("content".to_string()))?;
        return Ok(SectionChange::SetContent(content));
    }

    let item_id = || {
        args.item_id
            .as_deref()
            .map(|id| require_text("item_id", id))
            .unwrap_or_else(|| Err(ResumeError::MissingField("item_id".to_string()).into()))
    };

    Ok(match operation {
        Operation::Add => SectionChange::Add(vec![fields]),
        Operation::Remove => SectionChange::Remove(vec![item_id()?.to_string()]),
        Operation::Update => {
            let mut patch = fields;
            patch.insert("id".to_string(), json!(item_id()?));
            SectionChange::Update(vec![patch])
        }
    })
}

fn change_message(kind: SectionKind, operation: Operation, id: Option<&str>) -> String {
    if kind.is_free_text() {
        return format!("{} updated successfully", kind.display_name());
    }
    let noun = kind.item_noun();
    match (operation, id) {
        (Operation::Add, _) => format!("{} added successfully", noun),
        (Operation::Remove, Some(id)) => format!("{} with ID '{}' removed successfully", noun, id),
        (Operation::Update, Some(id)) => format!("{} with ID '{}' updated successfully", noun, id),
        (op, None) => format!("{} {} completed", noun, op),
    }
}

/// Run one `update_<section>` call.
pub async fn update_section(client: &ResumeClient, kind: SectionKind, args: Value) -> ToolOutcome {
    let raw = args_object(&args)?;
    let parsed: SectionArgs = parse_args(args)?;
    let mut fields = content_fields(&raw);
    fields.remove("content");

    let change = section_change(kind, &parsed, fields)?;
    let operation = change.operation();
    debug!(section = %kind, %operation, "Applying section change");

    let (_, saved, outcome) = mutate_resume(client, &parsed.target, |doc| {
        apply(&mut doc.data, kind, change).map_err(ToolError::from)
    })
    .await?;

    let id = outcome.primary_id().map(str::to_string);
    let mut body = success_body(change_message(kind, operation, id.as_deref()), &saved.id);
    body.insert("operation".to_string(), json!(operation));
    body.insert("section".to_string(), json!(kind.key()));
    if let Some(id) = &id {
        body.insert("item_id".to_string(), json!(id));
        if operation != Operation::Remove {
            if let Some(item) = saved.data.items(kind).iter().find(|i| item_id(i) == Some(id.as_str())) {
                body.insert("item".to_string(), item.clone());
            }
        }
    }
    if !kind.is_free_text() {
        body.insert("item_count".to_string(), json!(saved.data.items(kind).len()));
    }
    if let Some(version) = saved.version() {
        body.insert("updated_at".to_string(), json!(version));
    }
    Ok(Value::Object(body))
}

/// `update_<section>` tool for one section kind.
pub struct SectionTool {
    kind: SectionKind,
    client: Arc<ResumeClient>,
}

impl SectionTool {
    /// Create the tool for `kind`.
    pub fn new(kind: SectionKind, client: Arc<ResumeClient>) -> Self {
        Self { kind, client }
    }

    /// Tool name, e.g. `update_skills`.
    pub fn name(kind: SectionKind) -> String {
        format!("update_{}", kind.key())
    }
}

#[async_trait]
impl Tool for SectionTool {
    fn definition(&self) -> ToolDefinition {
        let description = if self.kind.is_free_text() {
            "Replace the summary text of a resume".to_string()
        } else {
            let noun = self.kind.item_noun().to_lowercase();
            format!(
                "Add, update or remove a {} in the {} section of a resume. \
                 'add' takes the item fields, 'update' takes item_id plus the fields to change, \
                 'remove' takes item_id.",
                noun,
                self.kind.display_name()
            )
        };
        ToolDefinition::new(Self::name(self.kind), description)
            .with_category("sections")
            .with_schema(section_input_schema(self.kind))
    }

    #[instrument(skip(self, args, context), fields(tool = "update_section", section = %self.kind, correlation_id = %context.correlation_id))]
    async fn execute(&self, args: Value, context: &ToolContext) -> McpServerResult<ToolResult> {
        let name = Self::name(self.kind);
        Ok(finish(&name, update_section(&self.client, self.kind, args).await))
    }
}

#[derive(Debug, Deserialize)]
struct GenericSectionArgs {
    #[serde(flatten)]
    target: ResumeTarget,
    #[serde(default)]
    section_name: String,
    #[serde(default)]
    operation: String,
    #[serde(default)]
    data: Value,
}

fn objects(value: Option<&Value>) -> Vec<Map<String, Value>> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(|i| i.as_object().cloned()).collect())
        .unwrap_or_default()
}

/// Build the change an `update_resume_section` call asks for.
fn generic_change(kind: SectionKind, operation: Operation, data: &Value) -> Result<SectionChange, ToolError> {
    let data = data
        .as_object()
        .ok_or_else(|| ResumeError::invalid("data must be an object"))?;

    if kind.is_free_text() {
        return match (operation, data.get("content")) {
            (Operation::Remove, _) => Err(ResumeError::UnsupportedOperation {
                section: kind.key().to_string(),
                operation: operation.to_string(),
            }
            .into()),
            (_, Some(Value::String(content))) => Ok(SectionChange::SetContent(content.clone())),
            _ => Err(ResumeError::MissingField("data.content".to_string()).into()),
        };
    }

    let items = objects(data.get("items"));
    match operation {
        Operation::Add | Operation::Update if items.is_empty() => {
            Err(ResumeError::MissingField("data.items".to_string()).into())
        }
        Operation::Add => Ok(SectionChange::Add(items)),
        Operation::Update => Ok(SectionChange::Update(items)),
        Operation::Remove => {
            let mut ids: Vec<String> = data
                .get("ids")
                .and_then(Value::as_array)
                .map(|ids| ids.iter().filter_map(Value::as_str).map(str::to_string).collect())
                .unwrap_or_default();
            ids.extend(
                items
                    .iter()
                    .filter_map(|item| item.get("id").or_else(|| item.get("item_id")))
                    .filter_map(Value::as_str)
                    .map(str::to_string),
            );
            Ok(SectionChange::Remove(ids))
        }
    }
}

/// Run one `update_resume_section` call.
pub async fn update_resume_section(client: &ResumeClient, args: Value) -> ToolOutcome {
    let args: GenericSectionArgs = parse_args(args)?;
    let kind: SectionKind = require_text("section_name", &args.section_name)?.parse()?;
    let operation: Operation = require_text("operation", &args.operation)?.parse()?;
    let change = generic_change(kind, operation, &args.data)?;

    let (_, saved, outcome): (_, _, MergeOutcome) = mutate_resume(client, &args.target, |doc| {
        apply(&mut doc.data, kind, change).map_err(ToolError::from)
    })
    .await?;

    let verb = match operation {
        Operation::Add => "added to",
        Operation::Remove => "removed from",
        Operation::Update => "updated in",
    };
    let message = if kind.is_free_text() {
        format!("{} updated successfully", kind.display_name())
    } else {
        format!(
            "{} item(s) {} the {} section",
            outcome.added.len() + outcome.updated.len() + outcome.removed.len(),
            verb,
            kind.display_name()
        )
    };
    let mut body = success_body(message, &saved.id);
    body.insert("operation".to_string(), json!(operation));
    body.insert("section".to_string(), json!(kind.key()));
    body.insert("result".to_string(), json!(outcome));
    if let Some(version) = saved.version() {
        body.insert("updated_at".to_string(), json!(version));
    }
    Ok(Value::Object(body))
}

/// `update_resume_section`: apply a batch to any section.
pub struct UpdateResumeSectionTool {
    client: Arc<ResumeClient>,
}

impl UpdateResumeSectionTool {
    /// Create the tool.
    pub fn new(client: Arc<ResumeClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for UpdateResumeSectionTool {
    fn definition(&self) -> ToolDefinition {
        let sections: Vec<&str> = SectionKind::ALL.iter().map(|k| k.key()).collect();
        let mut properties = Map::new();
        properties.insert("resume_id".to_string(), resume_id_schema());
        properties.insert(
            "section_name".to_string(),
            json!({ "type": "string", "enum": sections }),
        );
        properties.insert(
            "operation".to_string(),
            json!({ "type": "string", "enum": ["add", "update", "remove"] }),
        );
        properties.insert(
            "data".to_string(),
            json!({
                "type": "object",
                "description": "{content} for summary; {items: [...]} otherwise. \
                                Update items need an id; remove takes {ids: [...]} or items with ids."
            }),
        );
        properties.insert("expected_updated_at".to_string(), version_schema());

        ToolDefinition::new(
            "update_resume_section",
            "Add, update or remove several items of one resume section in a single write",
        )
        .with_category("sections")
        .with_schema(object_schema(properties, &["resume_id", "section_name", "operation", "data"]))
    }

    #[instrument(skip(self, args, context), fields(tool = "update_resume_section", correlation_id = %context.correlation_id))]
    async fn execute(&self, args: Value, context: &ToolContext) -> McpServerResult<ToolResult> {
        Ok(finish("update_resume_section", update_resume_section(&self.client, args).await))
    }
}

/// All section tools: one per section kind plus `update_resume_section`.
pub fn section_tools(client: Arc<ResumeClient>) -> Vec<Arc<dyn Tool>> {
    let mut tools: Vec<Arc<dyn Tool>> = SectionKind::ALL
        .iter()
        .map(|kind| Arc::new(SectionTool::new(*kind, client.clone())) as Arc<dyn Tool>)
        .collect();
    tools.push(Arc::new(UpdateResumeSectionTool::new(client)));
    tools
}
