//! Resume-level tools
//!
//! Reading, listing, creating, deleting, printing and bulk-updating whole
//! resumes. The bodies are plain async functions so the single-entry
//! `simple_resume_manager` can reuse them.

use super::common::{
    finish, lookup_public_url, mutate_resume, object_schema, parse_args, require_text, resume_id_schema,
    success_body, version_schema, ResumeTarget, ToolError, ToolOutcome,
};
use crate::clients::{CredentialOverride, ResumeClient};
use crate::server::{McpServerResult, Tool, ToolContext};
use crate::types::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use resume_core::merge::merge_sections;
use resume_core::view::{public_url, ResumeListing};
use resume_core::{NewResume, ResumeDocument, Visibility};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Default page size of `list_resumes`.
pub const DEFAULT_PAGE_SIZE: usize = 20;
/// Largest accepted page size.
pub const MAX_PAGE_SIZE: usize = 100;

fn document_body(doc: &ResumeDocument) -> Map<String, Value> {
    let mut body = Map::new();
    body.insert("success".to_string(), json!(true));
    body.insert("id".to_string(), json!(doc.id));
    body.insert("title".to_string(), json!(doc.title));
    body.insert("slug".to_string(), json!(doc.slug));
    body.insert("visibility".to_string(), json!(doc.visibility));
    body.insert("created_at".to_string(), json!(doc.created_at));
    body.insert("updated_at".to_string(), json!(doc.updated_at));
    body.insert("data".to_string(), json!(doc.data));
    body
}

fn parse_visibility(value: Option<&str>) -> Result<Option<Visibility>, ToolError> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| v.parse::<Visibility>().map_err(ToolError::from))
        .transpose()
}

/// `get_resume`: the full document.
pub async fn get_resume(client: &ResumeClient, args: Value) -> ToolOutcome {
    let target: ResumeTarget = parse_args(args)?;
    let resume_id = target.id()?;
    let session = client.login(target.auth.as_ref()).await?;
    let doc = session.get_resume(resume_id).await?;
    Ok(Value::Object(document_body(&doc)))
}

/// Rows to skip before `page` (1-based). Saturates instead of overflowing.
fn page_offset(page: usize, page_size: usize) -> usize {
    page.saturating_sub(1).saturating_mul(page_size)
}

#[derive(Debug, Deserialize)]
struct ListArgs {
    #[serde(default)]
    auth: Option<CredentialOverride>,
    #[serde(default)]
    page: Option<usize>,
    #[serde(default)]
    page_size: Option<usize>,
    #[serde(default)]
    include_public_urls: bool,
}

/// `list_resumes`: one page of resume rows.
pub async fn list_resumes(client: &ResumeClient, args: Value) -> ToolOutcome {
    let args: ListArgs = parse_args(args)?;
    let page = args.page.unwrap_or(1).max(1);
    let page_size = args.page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

    let session = client.login(args.auth.as_ref()).await?;
    let mut docs = session.list_resumes().await?;
    docs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    let total = docs.len();

    let mut rows: Vec<ResumeListing> = docs
        .iter()
        .skip(page_offset(page, page_size))
        .take(page_size)
        .map(ResumeListing::from)
        .collect();

    if args.include_public_urls && rows.iter().any(|r| r.visibility == Visibility::Public) {
        let user = session.get_user().await?;
        if !user.username.is_empty() {
            let base = session.endpoint().public_base();
            for row in rows.iter_mut().filter(|r| r.visibility == Visibility::Public) {
                row.public_url = Some(public_url(&base, &user.username, &row.slug));
            }
        }
    }

    debug!(total, page, page_size, "Listed resumes");
    Ok(json!({
        "success": true,
        "count": rows.len(),
        "total": total,
        "page": page,
        "page_size": page_size,
        "resumes": rows,
    }))
}

#[derive(Debug, Deserialize)]
struct AuthOnlyArgs {
    #[serde(default)]
    auth: Option<CredentialOverride>,
}

/// `get_resume_schema`: the service's resume data schema, passed through.
pub async fn get_resume_schema(client: &ResumeClient, args: Value) -> ToolOutcome {
    let args: AuthOnlyArgs = parse_args(args)?;
    let session = client.login(args.auth.as_ref()).await?;
    let schema = session.get_schema().await?;
    Ok(json!({ "success": true, "schema": schema }))
}

#[derive(Debug, Deserialize)]
struct CreateArgs {
    #[serde(default)]
    auth: Option<CredentialOverride>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    visibility: Option<String>,
}

/// Build the `POST /resume` body from title, slug and visibility arguments.
pub fn new_resume(title: &str, slug: Option<&str>, visibility: Option<&str>) -> Result<NewResume, ToolError> {
    let mut new = NewResume::new(require_text("title", title)?);
    if let Some(slug) = slug {
        new = new.with_slug(slug);
    }
    if let Some(visibility) = parse_visibility(visibility)? {
        new = new.with_visibility(visibility);
    }
    Ok(new)
}

/// `create_resume`: POST a bare resume, then read it back.
pub async fn create_resume(client: &ResumeClient, args: Value) -> ToolOutcome {
    let args: CreateArgs = parse_args(args)?;
    let new = new_resume(&args.title, args.slug.as_deref(), args.visibility.as_deref())?;

    let session = client.login(args.auth.as_ref()).await?;
    let created = session.create_resume(&new).await?;
    let doc = session.get_resume(&created.id).await?;
    info!(resume_id = %doc.id, "Resume created");

    let mut body = success_body("Resume created successfully", &doc.id);
    body.insert("title".to_string(), json!(doc.title));
    body.insert("slug".to_string(), json!(doc.slug));
    body.insert("visibility".to_string(), json!(doc.visibility));
    body.insert("updated_at".to_string(), json!(doc.updated_at));
    if let Some(url) = lookup_public_url(&session, &doc).await {
        body.insert("public_url".to_string(), json!(url));
    }
    Ok(Value::Object(body))
}

/// `delete_resume`.
pub async fn delete_resume(client: &ResumeClient, args: Value) -> ToolOutcome {
    let target: ResumeTarget = parse_args(args)?;
    let resume_id = target.id()?;
    let session = client.login(target.auth.as_ref()).await?;
    session.delete_resume(resume_id).await?;
    info!(resume_id, "Resume deleted");
    Ok(Value::Object(success_body("Resume deleted successfully", resume_id)))
}

/// `print_resume`: render to PDF and return the download URL.
pub async fn print_resume(client: &ResumeClient, args: Value) -> ToolOutcome {
    let target: ResumeTarget = parse_args(args)?;
    let resume_id = target.id()?;
    let session = client.login(target.auth.as_ref()).await?;
    let url = session.print_resume(resume_id).await?;

    let mut body = success_body("Resume PDF generated", resume_id);
    body.insert("url".to_string(), json!(url));
    Ok(Value::Object(body))
}

/// Arguments of `update_resume`.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateArgs {
    #[serde(flatten)]
    pub(crate) target: ResumeTarget,
    #[serde(default)]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) slug: Option<String>,
    #[serde(default)]
    pub(crate) visibility: Option<String>,
    #[serde(default)]
    pub(crate) basics: Option<Map<String, Value>>,
    #[serde(default)]
    pub(crate) sections: Option<Map<String, Value>>,
}

impl UpdateArgs {
    /// Apply the metadata, basics and sections of these arguments to a document.
    pub fn apply_to(&self, doc: &mut ResumeDocument) -> Result<Vec<resume_core::MergeOutcome>, ToolError> {
        let visibility = parse_visibility(self.visibility.as_deref())?;

        if let Some(title) = self.title.as_deref().filter(|t| !t.trim().is_empty()) {
            doc.title = title.trim().to_string();
        }
        if let Some(slug) = self.slug.as_deref().filter(|s| !s.trim().is_empty()) {
            doc.slug = resume_core::document::slugify(slug);
        }
        if let Some(visibility) = visibility {
            doc.visibility = visibility;
        }
        if let Some(basics) = &self.basics {
            doc.data.merge_basics(basics);
        }
        match &self.sections {
            Some(sections) => Ok(merge_sections(&mut doc.data, sections)?),
            None => Ok(Vec::new()),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.slug.is_none()
            && self.visibility.is_none()
            && self.basics.is_none()
            && self.sections.is_none()
    }
}

/// Shape of a saved resume for `update_resume` style responses.
pub async fn saved_body(
    session: &crate::clients::ResumeSession,
    doc: &ResumeDocument,
    message: &str,
    outcomes: &[resume_core::MergeOutcome],
) -> Map<String, Value> {
    let mut body = success_body(message, &doc.id);
    body.insert("title".to_string(), json!(doc.title));
    body.insert("slug".to_string(), json!(doc.slug));
    body.insert("visibility".to_string(), json!(doc.visibility));
    body.insert("updated_at".to_string(), json!(doc.updated_at));
    body.insert("sections".to_string(), json!(outcomes));
    if let Some(url) = lookup_public_url(session, doc).await {
        body.insert("public_url".to_string(), json!(url));
    }
    body
}

/// `update_resume`: merge metadata, basics and sections by id, PATCH once.
pub async fn update_resume(client: &ResumeClient, args: Value) -> ToolOutcome {
    let args: UpdateArgs = parse_args(args)?;
    args.target.id()?;
    if args.is_empty() {
        return Err(ToolError::InvalidArguments(
            "nothing to update: pass title, slug, visibility, basics or sections".to_string(),
        ));
    }

    let (session, saved, outcomes) = mutate_resume(client, &args.target, |doc| args.apply_to(doc)).await?;
    Ok(Value::Object(
        saved_body(&session, &saved, "Resume updated successfully", &outcomes).await,
    ))
}

macro_rules! resume_tool {
    ($tool:ident, $name:literal, $body:path) => {
        #[doc = concat!("`", $name, "` tool.")]
        pub struct $tool {
            client: Arc<ResumeClient>,
        }

        impl $tool {
            /// Create the tool.
            pub fn new(client: Arc<ResumeClient>) -> Self {
                Self { client }
            }
        }

        #[async_trait]
        impl Tool for $tool {
            fn definition(&self) -> ToolDefinition {
                definition($name)
            }

            #[instrument(skip(self, args, context), fields(tool = $name, correlation_id = %context.correlation_id))]
            async fn execute(&self, args: Value, context: &ToolContext) -> McpServerResult<ToolResult> {
                Ok(finish($name, $body(&self.client, args).await))
            }
        }
    };
}

resume_tool!(GetResumeTool, "get_resume", get_resume);
resume_tool!(ListResumesTool, "list_resumes", list_resumes);
resume_tool!(GetResumeSchemaTool, "get_resume_schema", get_resume_schema);
resume_tool!(CreateResumeTool, "create_resume", create_resume);
resume_tool!(DeleteResumeTool, "delete_resume", delete_resume);
resume_tool!(PrintResumeTool, "print_resume", print_resume);
resume_tool!(UpdateResumeTool, "update_resume", update_resume);

fn props(entries: &[(&str, Value)]) -> Map<String, Value> {
    entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

/// JSON Schema of a bulk `sections` argument.
pub(crate) fn sections_schema() -> Value {
    json!({
        "type": "object",
        "description": "Sections keyed by name: {summary: {content}, skills: {items: [...]}, ...}. \
                        Items with a known id are updated in place, others are appended."
    })
}

fn definition(name: &str) -> ToolDefinition {
    let visibility = json!({ "type": "string", "enum": ["private", "public"] });
    match name {
        "get_resume" => ToolDefinition::new(name, "Fetch the full content of a resume")
            .with_category("resumes")
            .read_only()
            .with_schema(object_schema(props(&[("resume_id", resume_id_schema())]), &["resume_id"])),
        "list_resumes" => ToolDefinition::new(name, "List resumes of the authenticated user, newest first")
            .with_category("resumes")
            .read_only()
            .with_schema(object_schema(
                props(&[
                    ("page", json!({ "type": "integer", "minimum": 1, "default": 1 })),
                    (
                        "page_size",
                        json!({ "type": "integer", "minimum": 1, "maximum": MAX_PAGE_SIZE, "default": DEFAULT_PAGE_SIZE }),
                    ),
                    (
                        "include_public_urls",
                        json!({ "type": "boolean", "default": false, "description": "Add public_url to public resumes" }),
                    ),
                ]),
                &[],
            )),
        "get_resume_schema" => ToolDefinition::new(name, "Fetch the JSON schema of resume data")
            .with_category("resumes")
            .read_only()
            .with_schema(object_schema(Map::new(), &[])),
        "create_resume" => ToolDefinition::new(name, "Create an empty resume")
            .with_category("resumes")
            .with_schema(object_schema(
                props(&[
                    ("title", json!({ "type": "string" })),
                    ("slug", json!({ "type": "string", "description": "Defaults to the slugified title" })),
                    ("visibility", visibility),
                ]),
                &["title"],
            )),
        "delete_resume" => ToolDefinition::new(name, "Delete a resume permanently")
            .with_category("resumes")
            .destructive()
            .with_schema(object_schema(props(&[("resume_id", resume_id_schema())]), &["resume_id"])),
        "print_resume" => ToolDefinition::new(name, "Render a resume to PDF and return its download URL")
            .with_category("resumes")
            .read_only()
            .with_schema(object_schema(props(&[("resume_id", resume_id_schema())]), &["resume_id"])),
        _ => ToolDefinition::new(
            name,
            "Update title, slug, visibility, basics and sections of a resume in one write",
        )
        .with_category("resumes")
        .with_schema(object_schema(
            props(&[
                ("resume_id", resume_id_schema()),
                ("title", json!({ "type": "string" })),
                ("slug", json!({ "type": "string" })),
                ("visibility", visibility),
                ("basics", json!({ "type": "object", "description": "Personal details to merge" })),
                ("sections", sections_schema()),
                ("expected_updated_at", version_schema()),
            ]),
            &["resume_id"],
        )),
    }
}

/// Resume-level tools.
pub fn resume_tools(client: Arc<ResumeClient>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(GetResumeTool::new(client.clone())),
        Arc::new(ListResumesTool::new(client.clone())),
        Arc::new(GetResumeSchemaTool::new(client.clone())),
        Arc::new(CreateResumeTool::new(client.clone())),
        Arc::new(DeleteResumeTool::new(client.clone())),
        Arc::new(PrintResumeTool::new(client.clone())),
        Arc::new(UpdateResumeTool::new(client)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::ResumeConfig;
    use resume_core::SectionKind;

    fn client() -> Arc<ResumeClient> {
        Arc::new(ResumeClient::new(Arc::new(ResumeConfig::new("http://localhost/api", "a", "b"))))
    }

    #[test]
    fn test_resume_tool_definitions() {
        let tools = resume_tools(client());
        assert_eq!(tools.len(), 7);
        let delete = tools.iter().map(|t| t.definition()).find(|d| d.name == "delete_resume").unwrap();
        assert!(delete.annotations.unwrap().destructive_hint);
        let update = tools.iter().map(|t| t.definition()).find(|d| d.name == "update_resume").unwrap();
        assert_eq!(update.input_schema["required"], json!(["resume_id"]));
    }

    #[test]
    fn test_page_offset() {
        assert_eq!(page_offset(1, 20), 0);
        assert_eq!(page_offset(3, 20), 40);
        assert_eq!(page_offset(0, 20), 0);
        assert_eq!(page_offset(usize::MAX / 2, MAX_PAGE_SIZE), usize::MAX);
    }

    #[test]
    fn test_new_resume_args() {
        let new = new_resume("My CV", None, Some("public")).unwrap();
        assert_eq!(new.slug, "my-cv");
        assert_eq!(new.visibility, Visibility::Public);

        assert!(new_resume("  ", None, None).is_err());
        assert!(new_resume("CV", None, Some("secret")).is_err());
    }

    #[test]
    fn test_update_args_apply() {
        let args: UpdateArgs = serde_json::from_value(json!({
            "resume_id": "r1",
            "title": "New title",
            "visibility": "public",
            "basics": { "name": "Ada", "url": "ada.dev" },
            "sections": { "skills": { "items": [{ "name": "Rust" }] } }
        }))
        .unwrap();

        let mut doc: ResumeDocument =
            serde_json::from_value(json!({ "id": "r1", "title": "Old", "slug": "old", "data": {} })).unwrap();
        let outcomes = args.apply_to(&mut doc).unwrap();

        assert_eq!(doc.title, "New title");
        assert!(doc.is_public());
        assert_eq!(doc.data.basics["url"]["href"], json!("https://ada.dev"));
        assert_eq!(outcomes[0].added.len(), 1);
        assert_eq!(doc.data.items(SectionKind::Skills)[0]["name"], json!("Rust"));
    }

    #[test]
    fn test_empty_update_is_rejected() {
        let args: UpdateArgs = serde_json::from_value(json!({ "resume_id": "r1" })).unwrap();
        assert!(args.is_empty());
    }
}
