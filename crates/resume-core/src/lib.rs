//! # Resume Core
//!
//! Document model and merge rules for resumes held by a Reactive Resume
//! style service. This crate does no I/O: it takes a fetched document, applies
//! a change, and hands back a document the remote schema will accept.
//!
//! ## Overview
//!
//! - **Document**: typed envelope, loosely typed sections ([`document`])
//! - **Sections**: the table of section kinds and item fields ([`section`])
//! - **Items**: normalization of caller input into schema-complete items ([`item`])
//! - **Merge**: add/update/remove and bulk merge by id ([`merge`])
//! - **Validation**: aggregated client-side checks for bulk input ([`validate`])
//! - **Views**: condensed projections for read tools ([`view`])
//!
//! ## Invariants
//!
//! After any merge operation:
//! - every item has a non-empty `id`
//! - every link is `{label, href}`
//! - dates are display strings like `Jan 2022 – Present`
//! - no item field is missing or `null`
//!
//! ## Usage
//!
//! ```rust
//! use resume_core::merge::{apply, SectionChange};
//! use resume_core::{ResumeData, SectionKind};
//! use serde_json::json;
//!
//! let mut data = ResumeData::blank();
//! let input = json!({
//!     "company": "Acme",
//!     "position": "Engineer",
//!     "start_date": "2022-01",
//!     "end_date": "2024-03",
//! });
//!
//! apply(
//!     &mut data,
//!     SectionKind::Experience,
//!     SectionChange::Add(vec![input.as_object().unwrap().clone()]),
//! )
//! .unwrap();
//!
//! let item = &data.items(SectionKind::Experience)[0];
//! assert_eq!(item["date"], json!("Jan 2022 – Mar 2024"));
//! ```

pub mod document;
pub mod error;
pub mod format;
pub mod id;
pub mod item;
pub mod merge;
pub mod section;
pub mod validate;
pub mod view;

// Re-export main types for convenience
pub use document::{NewResume, ResumeData, ResumeDocument, ResumePatch, Visibility};
pub use error::{ResumeError, ResumeResult};
pub use merge::{MergeOutcome, Operation, SectionChange};
pub use section::{FieldDefault, FieldSpec, SectionKind};
pub use validate::Validator;
pub use view::ResumeListing;
