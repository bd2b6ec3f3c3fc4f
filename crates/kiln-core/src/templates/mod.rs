//! Template catalog, project info, copying and rendering
//!
//! This module provides:
//! - Template catalog types and fetching from remote URLs or local files
//! - Project name/version validation and slug derivation
//! - Template copying and in-place variable rendering
//! - Version normalization and update notices

pub mod catalog;
pub mod copier;
pub mod project;
pub mod render;
pub mod version;

pub use catalog::{
    parse_catalog, CatalogFetcher, CatalogSource, TemplateCatalog, TemplateDescriptor,
    TemplateKind,
};
pub use copier::copy_template;
pub use project::{slugify, validate_project_name, ProjectInfo, ScaffoldKind};
pub use render::{render_tree, RENDER_IGNORE};
pub use version::{normalize_version, update_notice};
