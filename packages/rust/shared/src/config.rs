//! Application configuration for leadpages.
//!
//! A project config lives at `<root>/leadpages.toml`; a user-wide fallback at
//! `~/.leadpages/leadpages.toml`. CLI flags override config file values, which
//! override defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LeadPagesError, Result};
use crate::types::TemplateTag;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "leadpages.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".leadpages";

// ---------------------------------------------------------------------------
// Config structs (matching leadpages.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory layout.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Publication settings.
    #[serde(default)]
    pub site: SiteConfig,

    /// Template table.
    #[serde(default)]
    pub templates: TemplatesConfig,

    /// Input files processed when no explicit file is given.
    #[serde(default = "default_inputs")]
    pub inputs: Vec<InputEntry>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            site: SiteConfig::default(),
            templates: TemplatesConfig::default(),
            inputs: default_inputs(),
        }
    }
}

/// `[paths]` section. Relative paths resolve against the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_templates_dir")]
    pub templates_dir: PathBuf,

    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Where dated lead-list copies are kept.
    #[serde(default = "default_archive_dir")]
    pub archive_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            templates_dir: default_templates_dir(),
            assets_dir: default_assets_dir(),
            output_dir: default_output_dir(),
            archive_dir: default_archive_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    "data".into()
}
fn default_templates_dir() -> PathBuf {
    "templates".into()
}
fn default_assets_dir() -> PathBuf {
    "assets".into()
}
fn default_output_dir() -> PathBuf {
    "output".into()
}
fn default_archive_dir() -> PathBuf {
    "final_lead_lists".into()
}

/// `[site]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Public URL the output directory is served under.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Rewrite each input file in place with a `landing_page_url` column.
    #[serde(default = "default_true")]
    pub annotate_source: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            annotate_source: true,
        }
    }
}

fn default_base_url() -> String {
    "https://landing.example.com".into()
}
fn default_true() -> bool {
    true
}

/// `[templates]` section: tag → file name table plus the fallback tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplatesConfig {
    /// Tag used when neither the row nor the source file picks one.
    #[serde(default = "default_template_tag")]
    pub default: String,

    /// Template file per tag, relative to `paths.templates_dir`.
    #[serde(default = "default_template_files")]
    pub files: BTreeMap<String, String>,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            default: default_template_tag(),
            files: default_template_files(),
        }
    }
}

fn default_template_tag() -> String {
    "website-simple".into()
}
fn default_template_files() -> BTreeMap<String, String> {
    BTreeMap::from([
        (
            "website-simple".to_string(),
            "website-simple-landing-page.html".to_string(),
        ),
        (
            "website-full".to_string(),
            "website-full-landing-page.html".to_string(),
        ),
        ("abm".to_string(), "abm-landing-page.html".to_string()),
    ])
}

/// `[[inputs]]` entry — one lead list and the template its rows default to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputEntry {
    /// File name under `paths.data_dir`.
    pub file: String,
    /// Template tag for rows of this file.
    pub template: String,
    /// Human-readable list name used for archive copies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

fn default_inputs() -> Vec<InputEntry> {
    vec![
        InputEntry {
            file: "websites-simple.csv".into(),
            template: "website-simple".into(),
            label: Some("Website Simple".into()),
        },
        InputEntry {
            file: "websites-full.csv".into(),
            template: "website-full".into(),
            label: Some("Website Full".into()),
        },
        InputEntry {
            file: "abm.csv".into(),
            template: "abm".into(),
            label: Some("ABM".into()),
        },
    ]
}

impl AppConfig {
    /// Check that every referenced template tag exists in the table.
    pub fn validate(&self) -> Result<()> {
        if self.templates.files.is_empty() {
            return Err(LeadPagesError::config("[templates.files] is empty"));
        }

        let known = self.template_table();
        let default = TemplateTag::new(&self.templates.default);
        if !known.contains_key(&default) {
            return Err(LeadPagesError::config(format!(
                "default template '{default}' is not listed in [templates.files]"
            )));
        }

        for input in &self.inputs {
            let tag = TemplateTag::new(&input.template);
            if !known.contains_key(&tag) {
                return Err(LeadPagesError::config(format!(
                    "input '{}' uses unknown template '{tag}'",
                    input.file
                )));
            }
        }

        Ok(())
    }

    /// Template table keyed by normalized tag.
    pub fn template_table(&self) -> BTreeMap<TemplateTag, String> {
        self.templates
            .files
            .iter()
            .map(|(tag, file)| (TemplateTag::new(tag), file.clone()))
            .collect()
    }

    /// Resolve `[paths]` against a project root.
    pub fn resolve_paths(&self, root: &Path) -> ResolvedPaths {
        let resolve = |p: &Path| {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                root.join(p)
            }
        };
        ResolvedPaths {
            data_dir: resolve(&self.paths.data_dir),
            templates_dir: resolve(&self.paths.templates_dir),
            assets_dir: resolve(&self.paths.assets_dir),
            output_dir: resolve(&self.paths.output_dir),
            archive_dir: resolve(&self.paths.archive_dir),
        }
    }
}

// ---------------------------------------------------------------------------
// Resolved paths (runtime)
// ---------------------------------------------------------------------------

/// Absolute directory layout for one run.
#[derive(Debug, Clone)]
pub struct ResolvedPaths {
    pub data_dir: PathBuf,
    pub templates_dir: PathBuf,
    pub assets_dir: PathBuf,
    pub output_dir: PathBuf,
    pub archive_dir: PathBuf,
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the user config directory (`~/.leadpages/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| LeadPagesError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the user config file (`~/.leadpages/leadpages.toml`).
pub fn user_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load config for a project: `<root>/leadpages.toml`, then the user file,
/// then built-in defaults.
pub fn load_config(root: &Path) -> Result<AppConfig> {
    let project = root.join(CONFIG_FILE_NAME);
    if project.exists() {
        return load_config_from(&project);
    }

    match user_config_path() {
        Ok(path) if path.exists() => load_config_from(&path),
        _ => {
            tracing::debug!(root = %root.display(), "no config file found, using defaults");
            Ok(AppConfig::default())
        }
    }
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| LeadPagesError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        LeadPagesError::config(format!("failed to parse {}: {e}", path.display()))
    })?;

    config.validate()?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}

/// Write a default config file to `path`, refusing to overwrite.
pub fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Err(LeadPagesError::config(format!(
            "{} already exists",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| LeadPagesError::io(parent, e))?;
    }

    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| LeadPagesError::config(e.to_string()))?;
    std::fs::write(path, content).map_err(|e| LeadPagesError::io(path, e))?;
    tracing::info!(path = %path.display(), "created default config file");

    Ok(())
}
