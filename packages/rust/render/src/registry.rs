//! Template table: tag → file lookup, loading, and per-row selection.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use leadpages_shared::{LeadPagesError, Result, Row, TemplateTag, USE_CASE_COLUMNS};

use crate::template::Template;

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Loads templates named by the configured table and caches them per tag.
#[derive(Debug)]
pub struct TemplateRegistry {
    dir: PathBuf,
    table: BTreeMap<TemplateTag, String>,
    cache: HashMap<TemplateTag, Template>,
}

impl TemplateRegistry {
    pub fn new(dir: impl Into<PathBuf>, table: BTreeMap<TemplateTag, String>) -> Self {
        Self {
            dir: dir.into(),
            table,
            cache: HashMap::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Table entries as `(tag, absolute file path)`.
    pub fn entries(&self) -> impl Iterator<Item = (&TemplateTag, PathBuf)> {
        self.table.iter().map(|(tag, file)| (tag, self.dir.join(file)))
    }

    /// File backing `tag`.
    pub fn path_for(&self, tag: &TemplateTag) -> Result<PathBuf> {
        self.table
            .get(tag)
            .map(|file| self.dir.join(file))
            .ok_or_else(|| LeadPagesError::template(format!("no template registered for '{tag}'")))
    }

    /// Load `tag` eagerly; used for the default template during setup.
    pub async fn preload(&mut self, tag: &TemplateTag) -> Result<()> {
        self.load(tag).await.map(|_| ())
    }

    /// Parsed template for `tag`, read from disk on first use.
    pub async fn load(&mut self, tag: &TemplateTag) -> Result<&Template> {
        if !self.cache.contains_key(tag) {
            let path = self.path_for(tag)?;
            let source = tokio::fs::read_to_string(&path).await.map_err(|e| {
                LeadPagesError::template(format!("cannot read {}: {e}", path.display()))
            })?;

            let template = Template::parse(&source);
            info!(%tag, path = %path.display(), placeholders = template.placeholders().len(), "loaded template");
            self.cache.insert(tag.clone(), template);
        }

        self.cache
            .get(tag)
            .ok_or_else(|| LeadPagesError::template(format!("template '{tag}' not cached")))
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Picks the template tag for a row.
///
/// Priority: the row's `use_case` / `Use Case` value if it names a known tag,
/// then the tag configured for the source file, then the default.
#[derive(Debug, Clone)]
pub struct TemplateSelector {
    known: Vec<TemplateTag>,
    by_file: HashMap<String, TemplateTag>,
    default: TemplateTag,
}

impl TemplateSelector {
    pub fn new(
        known: impl IntoIterator<Item = TemplateTag>,
        by_file: HashMap<String, TemplateTag>,
        default: TemplateTag,
    ) -> Self {
        Self {
            known: known.into_iter().collect(),
            by_file,
            default,
        }
    }

    pub fn select(&self, row: &Row, source_file: &str) -> TemplateTag {
        if let Some(use_case) = row.get_any(USE_CASE_COLUMNS) {
            let tag = TemplateTag::new(use_case);
            if self.known.contains(&tag) {
                return tag;
            }
            debug!(%tag, "use case does not name a template, ignoring");
        }

        if let Some(tag) = self.by_file.get(source_file) {
            return tag.clone();
        }

        self.default.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selector() -> TemplateSelector {
        let by_file = HashMap::from([
            ("websites-simple.csv".to_string(), TemplateTag::new("website-simple")),
            ("abm.csv".to_string(), TemplateTag::new("abm")),
        ]);
        TemplateSelector::new(
            ["website-simple", "website-full", "abm"].map(TemplateTag::new),
            by_file,
            TemplateTag::new("website-simple"),
        )
    }

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("lp-registry-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn use_case_column_wins() {
        let row = Row::from_iter([("use_case", "ABM")]);
        assert_eq!(selector().select(&row, "websites-simple.csv").as_str(), "abm");

        let row = Row::from_iter([("Use Case", "website-full")]);
        assert_eq!(selector().select(&row, "abm.csv").as_str(), "website-full");
    }

    #[test]
    fn unknown_use_case_falls_back_to_file() {
        let row = Row::from_iter([("use_case", "Outbound")]);
        assert_eq!(selector().select(&row, "abm.csv").as_str(), "abm");
    }

    #[test]
    fn unknown_file_uses_default() {
        let row = Row::from_iter([("company_name", "Acme")]);
        assert_eq!(selector().select(&row, "adhoc.csv").as_str(), "website-simple");
    }

    #[tokio::test]
    async fn load_reads_and_caches() {
        let dir = temp_dir();
        std::fs::write(dir.join("abm.html"), "<h1>{{company_name}}</h1>").unwrap();
        let table = BTreeMap::from([(TemplateTag::new("abm"), "abm.html".to_string())]);
        let mut registry = TemplateRegistry::new(&dir, table);
        let tag = TemplateTag::new("abm");

        registry.preload(&tag).await.expect("preload");
        std::fs::remove_file(dir.join("abm.html")).unwrap();

        let row = Row::from_iter([("company_name", "Acme")]);
        let template = registry.load(&tag).await.expect("cached after preload");
        assert_eq!(
            template.render(&row, "acme", crate::AssetBase::Nested),
            "<h1>Acme</h1>"
        );

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn missing_file_and_unknown_tag_are_errors() {
        let dir = temp_dir();
        let table = BTreeMap::from([(TemplateTag::new("abm"), "abm.html".to_string())]);
        let mut registry = TemplateRegistry::new(&dir, table);

        let err = registry.load(&TemplateTag::new("abm")).await.unwrap_err();
        assert!(err.to_string().contains("cannot read"));

        let err = registry.load(&TemplateTag::new("promo")).await.unwrap_err();
        assert!(err.to_string().contains("no template registered for 'promo'"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
