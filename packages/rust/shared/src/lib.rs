//! Shared types, error model, and configuration for leadpages.
//!
//! This crate is the foundation depended on by all other leadpages crates.
//! It provides:
//! - [`LeadPagesError`] — the unified error type
//! - Domain types ([`Row`], [`LeadList`], [`TemplateTag`])
//! - Configuration ([`AppConfig`], [`ResolvedPaths`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CONFIG_FILE_NAME, InputEntry, PathsConfig, ResolvedPaths, SiteConfig,
    TemplatesConfig, config_dir, init_config, load_config, load_config_from, user_config_path,
};
pub use error::{LeadPagesError, Result};
pub use types::{
    COMPANY_NAME_COLUMN, COMPANY_SLUG_COLUMN, Delimiter, ERROR_MARKER, LANDING_PAGE_URL_COLUMN,
    LeadList, Row, TemplateTag, USE_CASE_COLUMNS,
};
