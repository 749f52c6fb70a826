//! End-to-end `generate` pipeline: lead lists → pages → back-annotation → archive.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use leadpages_render::{TemplateRegistry, TemplateSelector, row_slug};
use leadpages_shared::{
    AppConfig, ERROR_MARKER, InputEntry, LeadList, LeadPagesError, ResolvedPaths, Result, Row,
    TemplateTag,
};

use crate::archive::{self, ArchivedList};
use crate::assembler;

/// Configuration for one `generate` run. Nothing is read from process globals.
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    /// Directory layout.
    pub paths: ResolvedPaths,
    /// Single file to process instead of the configured input set.
    pub input: Option<PathBuf>,
    /// Public URL prefix for `landing_page_url`.
    pub base_url: String,
    /// Rewrite each input file with the `landing_page_url` column.
    pub annotate_source: bool,
    /// Tag → template file name.
    pub templates: BTreeMap<TemplateTag, String>,
    /// Configured input files, in processing order.
    pub inputs: Vec<InputEntry>,
    /// Tag used when nothing else selects one.
    pub default_template: TemplateTag,
    /// Date stamped on archive copies.
    pub run_date: NaiveDate,
}

impl GenerateConfig {
    /// Build from an app config and a project root. Run date is today (local).
    pub fn from_app(config: &AppConfig, root: &Path) -> Self {
        Self {
            paths: config.resolve_paths(root),
            input: None,
            base_url: config.site.base_url.clone(),
            annotate_source: config.site.annotate_source,
            templates: config.template_table(),
            inputs: config.inputs.clone(),
            default_template: TemplateTag::new(&config.templates.default),
            run_date: chrono::Local::now().date_naive(),
        }
    }

    fn selector(&self) -> TemplateSelector {
        let by_file = self
            .inputs
            .iter()
            .map(|i| (i.file.clone(), TemplateTag::new(&i.template)))
            .collect();
        TemplateSelector::new(
            self.templates.keys().cloned(),
            by_file,
            self.default_template.clone(),
        )
    }
}

/// Outcome of one input file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub file: String,
    pub label: String,
    pub rows: usize,
    pub generated: usize,
    pub failed: usize,
    /// Source file was rewritten with `landing_page_url`.
    pub annotated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive: Option<ArchivedList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_error: Option<String>,
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationReport {
    pub output_dir: PathBuf,
    pub assets_copied: usize,
    pub files: Vec<FileReport>,
    /// Pages generated per template tag.
    pub template_usage: BTreeMap<String, usize>,
    pub generated: usize,
    pub failed: usize,
    pub elapsed_ms: u64,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when a file has been read.
    fn file_started(&self, file: &str, rows: usize);
    /// Called after a row's pages are written.
    fn row_generated(&self, slug: &str, tag: &TemplateTag, current: usize, total: usize);
    /// Called when a row fails.
    fn row_failed(&self, identifier: &str, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, report: &GenerationReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn file_started(&self, _file: &str, _rows: usize) {}
    fn row_generated(&self, _slug: &str, _tag: &TemplateTag, _current: usize, _total: usize) {}
    fn row_failed(&self, _identifier: &str, _current: usize, _total: usize) {}
    fn done(&self, _report: &GenerationReport) {}
}

/// Run the full `generate` pipeline.
///
/// 1. Setup: validate directories, load the default template, copy assets
/// 2. For each input file: read rows, write a page per row
/// 3. Back-annotate the source file and archive a dated copy
///
/// Setup failures return `Err`. Row and archive failures are logged and
/// recorded in the report.
#[instrument(skip_all, fields(output = %config.paths.output_dir.display()))]
pub async fn generate(
    config: &GenerateConfig,
    progress: &dyn ProgressReporter,
) -> Result<GenerationReport> {
    let start = Instant::now();

    // --- Phase 1: Setup ---
    progress.phase("Checking inputs");
    let files = resolve_inputs(config).await?;

    let mut registry = TemplateRegistry::new(&config.paths.templates_dir, config.templates.clone());
    registry.preload(&config.default_template).await?;
    let selector = config.selector();

    assembler::ensure_dir(&config.paths.output_dir).await?;

    progress.phase("Copying assets");
    let assets_copied =
        assembler::copy_assets(&config.paths.assets_dir, &config.paths.output_dir).await?;

    let names: Vec<String> = files.iter().map(|f| display_name(f)).collect();
    info!(count = files.len(), files = ?names, "processing lead lists");

    let mut report = GenerationReport {
        output_dir: config.paths.output_dir.clone(),
        assets_copied,
        ..Default::default()
    };
    let mut seen_slugs = HashSet::new();

    // --- Phase 2: Pages, annotation, archive per file ---
    for path in &files {
        progress.phase(&format!("Processing {}", display_name(path)));
        let mut list = leadpages_ingest::read_lead_list(path).await?;
        let file_report = process_list(
            config,
            &mut list,
            &mut registry,
            &selector,
            &mut seen_slugs,
            &mut report.template_usage,
            progress,
        )
        .await;

        report.generated += file_report.generated;
        report.failed += file_report.failed;
        report.files.push(file_report);
    }

    report.elapsed_ms = start.elapsed().as_millis() as u64;
    progress.done(&report);

    info!(
        generated = report.generated,
        failed = report.failed,
        usage = ?report.template_usage,
        elapsed_ms = report.elapsed_ms,
        "generation complete"
    );

    Ok(report)
}

/// Generate every row of one list, then annotate and archive it.
async fn process_list(
    config: &GenerateConfig,
    list: &mut LeadList,
    registry: &mut TemplateRegistry,
    selector: &TemplateSelector,
    seen_slugs: &mut HashSet<String>,
    usage: &mut BTreeMap<String, usize>,
    progress: &dyn ProgressReporter,
) -> FileReport {
    let file_name = list.file_name();
    let total = list.rows.len();
    progress.file_started(&file_name, total);
    info!(file = %file_name, rows = total, "generating pages");

    let mut urls = Vec::with_capacity(total);
    let mut generated = 0;

    for (i, row) in list.rows.iter().enumerate() {
        let tag = selector.select(row, &file_name);
        let slug = row_slug(row);

        match generate_row(registry, &config.paths.output_dir, &tag, &slug, row).await {
            Ok(()) => {
                if !seen_slugs.insert(slug.clone()) {
                    warn!(%slug, file = %file_name, "slug already generated in this run, page overwritten");
                }
                *usage.entry(tag.to_string()).or_default() += 1;
                generated += 1;
                urls.push(archive::landing_page_url(&config.base_url, &slug));
                progress.row_generated(&slug, &tag, i + 1, total);
                info!(%slug, %tag, file = %file_name, "generated /{slug}/index.html");
            }
            Err(e) => {
                error!(row = %row.identifier(), file = %file_name, error = %e, "page generation failed");
                urls.push(ERROR_MARKER.to_string());
                progress.row_failed(row.identifier(), i + 1, total);
            }
        }
    }

    archive::annotate(list, &urls);

    let annotated = if config.annotate_source && list.decoded_lossily {
        warn!(file = %file_name, "source is not valid UTF-8, leaving it untouched");
        false
    } else if config.annotate_source {
        match leadpages_ingest::write_lead_list(&list.source, list).await {
            Ok(()) => true,
            Err(e) => {
                error!(file = %file_name, error = %e, "failed to update source lead list");
                false
            }
        }
    } else {
        false
    };

    let label = archive::list_label(&file_name, &config.inputs);
    let (archive, archive_error) = match archive::archive_lead_list(
        list,
        &label,
        config.run_date,
        &config.paths.archive_dir,
        &config.paths.output_dir,
    )
    .await
    {
        Ok(archived) => (Some(archived), None),
        Err(e) => {
            error!(file = %file_name, error = %e, "failed to archive lead list");
            (None, Some(e.to_string()))
        }
    };

    FileReport {
        file: file_name,
        label,
        rows: total,
        generated,
        failed: total - generated,
        annotated,
        archive,
        archive_error,
    }
}

/// Load the selected template and write both copies of the page.
async fn generate_row(
    registry: &mut TemplateRegistry,
    output_dir: &Path,
    tag: &TemplateTag,
    slug: &str,
    row: &Row,
) -> Result<()> {
    let template = registry.load(tag).await?;

    let unresolved = template.unresolved(row);
    if !unresolved.is_empty() {
        debug!(%slug, ?unresolved, "placeholders left unresolved");
    }

    assembler::write_page(output_dir, slug, template, row).await?;
    Ok(())
}

/// Files to process: the explicit input, or configured inputs present on disk.
async fn resolve_inputs(config: &GenerateConfig) -> Result<Vec<PathBuf>> {
    let data_dir = &config.paths.data_dir;
    if !exists(data_dir).await {
        return Err(LeadPagesError::validation(format!(
            "data directory not found: {}",
            data_dir.display()
        )));
    }

    if let Some(input) = &config.input {
        let path = if input.is_absolute() {
            input.clone()
        } else {
            data_dir.join(input)
        };
        if !exists(&path).await {
            return Err(LeadPagesError::validation(format!(
                "input file not found: {}",
                path.display()
            )));
        }
        return Ok(vec![path]);
    }

    let mut files = Vec::new();
    for entry in &config.inputs {
        let path = data_dir.join(&entry.file);
        if exists(&path).await {
            files.push(path);
        } else {
            debug!(file = %entry.file, "configured input not present, skipping");
        }
    }

    if files.is_empty() {
        warn!(data_dir = %data_dir.display(), "no configured input files found");
    }
    Ok(files)
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURES: &str = "../../../fixtures";

    fn temp_project() -> PathBuf {
        let root = std::env::temp_dir().join(format!("lp-pipeline-test-{}", uuid::Uuid::now_v7()));
        for dir in ["data", "templates", "assets"] {
            copy_fixture(&Path::new(FIXTURES).join(dir), &root.join(dir));
        }
        root
    }

    fn copy_fixture(src: &Path, dst: &Path) {
        std::fs::create_dir_all(dst).unwrap();
        for entry in std::fs::read_dir(src).unwrap() {
            let entry = entry.unwrap();
            let to = dst.join(entry.file_name());
            if entry.file_type().unwrap().is_dir() {
                copy_fixture(&entry.path(), &to);
            } else {
                std::fs::copy(entry.path(), to).unwrap();
            }
        }
    }

    fn config_for(root: &Path) -> GenerateConfig {
        let mut config = GenerateConfig::from_app(&AppConfig::default(), root);
        config.base_url = "https://pages.example.com".into();
        config.run_date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        config
    }

    fn read(path: impl AsRef<Path>) -> String {
        std::fs::read_to_string(path).unwrap()
    }

    #[tokio::test]
    async fn two_row_csv_produces_two_pages() {
        let root = temp_project();
        let mut config = config_for(&root);
        config.input = Some("websites-simple.csv".into());

        let report = generate(&config, &SilentProgress).await.expect("generate");
        let out = &config.paths.output_dir;

        assert_eq!(report.generated, 2);
        assert_eq!(report.failed, 0);
        for slug in ["acme-corp", "globex"] {
            assert!(out.join(slug).join("index.html").is_file(), "{slug}/index.html");
            assert!(out.join(format!("{slug}.html")).is_file(), "{slug}.html");
        }
        let page_dirs = std::fs::read_dir(out)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().join("index.html").is_file())
            .count();
        assert_eq!(page_dirs, 2);
        assert!(out.join("assets").join("css").join("site.css").is_file());

        std::fs::remove_dir_all(&root).ok();
    }

    #[tokio::test]
    async fn pages_are_populated_and_rebased() {
        let root = temp_project();
        let mut config = config_for(&root);
        config.input = Some("websites-simple.csv".into());
        generate(&config, &SilentProgress).await.expect("generate");
        let out = &config.paths.output_dir;

        let nested = read(out.join("acme-corp").join("index.html"));
        assert!(nested.contains("Acme Corp"));
        assert!(nested.contains("../assets/css/site.css"));
        assert!(nested.contains("{{testimonial}}"), "unknown placeholder survives");

        let flat = read(out.join("acme-corp.html"));
        assert!(flat.contains("\"assets/css/site.css\""));
        assert!(!flat.contains("../assets/"));

        std::fs::remove_dir_all(&root).ok();
    }

    #[tokio::test]
    async fn explicit_slug_column_wins() {
        let root = temp_project();
        let mut config = config_for(&root);
        config.input = Some("abm.csv".into());
        generate(&config, &SilentProgress).await.expect("generate");

        let out = &config.paths.output_dir;
        assert!(out.join("initech-2").join("index.html").is_file());
        assert!(!out.join("initech").exists());

        std::fs::remove_dir_all(&root).ok();
    }

    #[tokio::test]
    async fn source_is_annotated_and_archived() {
        let root = temp_project();
        let mut config = config_for(&root);
        config.input = Some("abm.csv".into());
        let report = generate(&config, &SilentProgress).await.expect("generate");

        let source = read(root.join("data").join("abm.csv"));
        assert!(source.lines().next().unwrap().ends_with(",landing_page_url"));
        assert!(source.contains("https://pages.example.com/initech-2"));
        assert!(!source.contains('\t'), "rewritten as comma-delimited");

        let name = "ABM - 2026-10-19.csv";
        assert!(root.join("final_lead_lists").join(name).is_file());
        assert!(config.paths.output_dir.join("final_lead_lists").join(name).is_file());
        assert!(report.files[0].annotated);
        assert!(report.files[0].archive.is_some());

        std::fs::remove_dir_all(&root).ok();
    }

    #[tokio::test]
    async fn rerun_is_idempotent_for_pages() {
        let root = temp_project();
        let mut config = config_for(&root);
        config.input = Some("websites-simple.csv".into());

        generate(&config, &SilentProgress).await.expect("first run");
        let index = config.paths.output_dir.join("globex").join("index.html");
        let first_page = std::fs::read(&index).unwrap();
        let first_csv = read(root.join("data").join("websites-simple.csv"));

        generate(&config, &SilentProgress).await.expect("second run");
        assert_eq!(std::fs::read(&index).unwrap(), first_page);

        let second_csv = read(root.join("data").join("websites-simple.csv"));
        assert_eq!(first_csv, second_csv, "column refreshed, not duplicated");
        assert_eq!(second_csv.matches("landing_page_url").count(), 1);

        std::fs::remove_dir_all(&root).ok();
    }

    #[tokio::test]
    async fn failing_row_does_not_stop_batch() {
        let root = temp_project();
        // Second row selects a template whose file is missing; third has no name.
        std::fs::write(
            root.join("data").join("mixed.csv"),
            "company_name,use_case\nAcme,website-simple\nGlobex,website-full\n!!!,\nUmbrella,\n",
        )
        .unwrap();
        std::fs::remove_file(root.join("templates").join("website-full-landing-page.html")).ok();

        let mut config = config_for(&root);
        config.input = Some("mixed.csv".into());
        let report = generate(&config, &SilentProgress).await.expect("generate");

        assert_eq!(report.generated, 2);
        assert_eq!(report.failed, 2);
        assert!(config.paths.output_dir.join("umbrella").join("index.html").is_file());

        let list = leadpages_ingest::read_lead_list(&root.join("data").join("mixed.csv"))
            .await
            .unwrap();
        let urls: Vec<_> = list
            .rows
            .iter()
            .map(|r| r.get("landing_page_url").unwrap_or_default())
            .collect();
        assert_eq!(
            urls,
            vec![
                "https://pages.example.com/acme",
                "ERROR",
                "ERROR",
                "https://pages.example.com/umbrella",
            ]
        );

        std::fs::remove_dir_all(&root).ok();
    }

    #[tokio::test]
    async fn default_input_set_uses_file_templates() {
        let root = temp_project();
        let config = config_for(&root);
        let report = generate(&config, &SilentProgress).await.expect("generate");

        let files: Vec<_> = report.files.iter().map(|f| f.file.as_str()).collect();
        assert_eq!(files, vec!["websites-simple.csv", "abm.csv"]);
        assert_eq!(report.template_usage.get("website-simple"), Some(&2));
        assert_eq!(report.template_usage.get("abm"), Some(&1));
        // Row with use_case=website-full in abm.csv overrides the file's template.
        assert_eq!(report.template_usage.get("website-full"), Some(&1));

        let abm_page = read(config.paths.output_dir.join("initech-2").join("index.html"));
        assert!(abm_page.contains("data-template=\"abm\""));

        std::fs::remove_dir_all(&root).ok();
    }

    #[tokio::test]
    async fn annotate_source_can_be_disabled() {
        let root = temp_project();
        let original = read(root.join("data").join("websites-simple.csv"));
        let mut config = config_for(&root);
        config.input = Some("websites-simple.csv".into());
        config.annotate_source = false;

        let report = generate(&config, &SilentProgress).await.expect("generate");
        assert_eq!(read(root.join("data").join("websites-simple.csv")), original);
        assert!(!report.files[0].annotated);
        assert!(report.files[0].archive.is_some());

        std::fs::remove_dir_all(&root).ok();
    }

    #[tokio::test]
    async fn non_utf8_source_is_left_byte_identical() {
        let root = temp_project();
        let source = root.join("data").join("latin1.csv");
        let bytes = b"company_name,notes\nCaf\xe9 Ltd,caf\xe9\n".to_vec();
        std::fs::write(&source, &bytes).unwrap();
        let mut config = config_for(&root);
        config.input = Some("latin1.csv".into());

        let report = generate(&config, &SilentProgress).await.expect("generate");
        assert_eq!(report.generated, 1);
        assert!(!report.files[0].annotated);
        assert_eq!(std::fs::read(&source).unwrap(), bytes);

        std::fs::remove_dir_all(&root).ok();
    }

    #[tokio::test]
    async fn repeated_headers_survive_annotation() {
        let root = temp_project();
        let source = root.join("data").join("notes.csv");
        std::fs::write(&source, "company_name,notes,notes\nAcme,first,second\n").unwrap();
        let mut config = config_for(&root);
        config.input = Some("notes.csv".into());

        generate(&config, &SilentProgress).await.expect("generate");
        assert_eq!(
            read(&source),
            "company_name,notes,notes,landing_page_url\n\
             Acme,first,second,https://pages.example.com/acme\n"
        );

        std::fs::remove_dir_all(&root).ok();
    }

    #[tokio::test]
    async fn missing_default_template_is_fatal() {
        let root = temp_project();
        std::fs::remove_file(root.join("templates").join("website-simple-landing-page.html"))
            .unwrap();
        let config = config_for(&root);

        let err = generate(&config, &SilentProgress).await.unwrap_err();
        assert!(matches!(err, LeadPagesError::Template { .. }));
        assert!(!config.paths.output_dir.exists());

        std::fs::remove_dir_all(&root).ok();
    }

    #[tokio::test]
    async fn missing_inputs_are_fatal() {
        let root = temp_project();
        let mut config = config_for(&root);
        config.input = Some("nope.csv".into());
        assert!(generate(&config, &SilentProgress).await.is_err());

        std::fs::remove_dir_all(root.join("data")).unwrap();
        config.input = None;
        let err = generate(&config, &SilentProgress).await.unwrap_err();
        assert!(err.to_string().contains("data directory not found"));

        std::fs::remove_dir_all(&root).ok();
    }

    #[tokio::test]
    async fn report_serializes() {
        let root = temp_project();
        let mut config = config_for(&root);
        config.input = Some("websites-simple.csv".into());
        let report = generate(&config, &SilentProgress).await.expect("generate");

        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["generated"], 2);
        assert_eq!(json["files"][0]["label"], "Website Simple");

        std::fs::remove_dir_all(&root).ok();
    }
}
