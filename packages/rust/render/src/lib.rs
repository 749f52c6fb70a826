//! Page rendering for leadpages: slugs, templates, and template selection.
//!
//! - [`slug`] — URL-safe identifiers from company names
//! - [`template`] — placeholder substitution with asset-base aware output
//! - [`registry`] — tag → file table, cached loading, per-row selection

pub mod registry;
pub mod slug;
pub mod template;

pub use registry::{TemplateRegistry, TemplateSelector};
pub use slug::{row_slug, slugify};
pub use template::{AssetBase, NESTED_ASSET_PREFIX, ROOT_ASSET_PREFIX, Template};
