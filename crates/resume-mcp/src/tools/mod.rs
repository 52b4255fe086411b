//! Resume MCP tools
//!
//! Every tool holds the shared [`ResumeClient`] and runs one
//! login-fetch-change-write cycle per call.

pub mod bulk;
pub mod common;
pub mod read;
pub mod resumes;
pub mod sections;

pub use bulk::bulk_tools;
pub use read::read_tools;
pub use resumes::resume_tools;
pub use sections::{section_tools, SectionTool};

use crate::clients::ResumeClient;
use crate::server::Tool;
use std::sync::Arc;

/// Get all resume tools.
///
/// - Sections: one `update_<section>` per section plus `update_resume_section`
/// - Resumes: get, list, schema, create, delete, print, update
/// - Read: `read_resume_section`
/// - Bulk: `create_and_update_resume`, `simple_resume_manager`
///
/// # Example
///
/// ```rust,no_run
/// use resume_mcp::clients::{ResumeClient, ResumeConfig};
/// use resume_mcp::tools::all_tools;
/// use std::sync::Arc;
///
/// let config = ResumeConfig::from_env().unwrap();
/// let tools = all_tools(Arc::new(ResumeClient::new(Arc::new(config))));
/// println!("Available tools: {}", tools.len());
/// ```
pub fn all_tools(client: Arc<ResumeClient>) -> Vec<Arc<dyn Tool>> {
    let mut tools = Vec::new();
    tools.extend(section_tools(client.clone()));
    tools.extend(resume_tools(client.clone()));
    tools.extend(read_tools(client.clone()));
    tools.extend(bulk_tools(client));
    tools
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::ResumeConfig;

    fn client() -> Arc<ResumeClient> {
        Arc::new(ResumeClient::new(Arc::new(ResumeConfig::new("http://localhost/api", "a", "b"))))
    }

    #[test]
    fn test_all_tools_count() {
        // 13 section + 1 generic section + 7 resume + 1 read + 2 bulk
        assert_eq!(all_tools(client()).len(), 24);
    }

    #[test]
    fn test_all_tools_unique_names() {
        let mut names = std::collections::HashSet::new();
        for tool in all_tools(client()) {
            let def = tool.definition();
            assert!(names.insert(def.name.clone()), "Duplicate tool name: {}", def.name);
        }
    }

    #[test]
    fn test_every_schema_is_an_object_with_auth() {
        for tool in all_tools(client()) {
            let def = tool.definition();
            assert_eq!(def.input_schema["type"], "object", "{}", def.name);
            assert!(def.input_schema["properties"].get("auth").is_some(), "{}", def.name);
        }
    }
}
