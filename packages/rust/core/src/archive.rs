//! Back-annotation of lead lists and dated archive copies.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{info, instrument};

use leadpages_shared::{InputEntry, LANDING_PAGE_URL_COLUMN, LeadList, LeadPagesError, Result};

use crate::assembler::ensure_dir;

/// Directory under the output root that mirrors the archive.
pub const OUTPUT_ARCHIVE_DIR: &str = "final_lead_lists";

/// Public URL of a generated page: `<base_url>/<slug>`.
pub fn landing_page_url(base_url: &str, slug: &str) -> String {
    format!("{}/{slug}", base_url.trim_end_matches('/'))
}

/// Set `landing_page_url` on every row, appending the column if needed.
pub fn annotate(list: &mut LeadList, urls: &[String]) {
    list.set_column(LANDING_PAGE_URL_COLUMN, urls);
}

/// Human-readable name of a lead list.
///
/// Uses the configured label for the file, else the title-cased file stem
/// (`websites-full.csv` → `Websites Full`).
pub fn list_label(file_name: &str, inputs: &[InputEntry]) -> String {
    if let Some(label) = inputs
        .iter()
        .find(|i| i.file == file_name)
        .and_then(|i| i.label.as_deref())
    {
        return label.to_string();
    }

    let stem = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    stem.split(['-', '_', ' '])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// `<Label> - YYYY-MM-DD.csv`
pub fn archive_file_name(label: &str, date: NaiveDate) -> String {
    format!("{label} - {}.csv", date.format("%Y-%m-%d"))
}

/// Locations of one archived list.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ArchivedList {
    /// Copy under the archive directory.
    pub archive_path: PathBuf,
    /// Copy under `<output>/final_lead_lists/`.
    pub published_path: PathBuf,
}

/// Write the dated archive copy and mirror it into the output tree.
#[instrument(skip(list), fields(file = %list.file_name()))]
pub async fn archive_lead_list(
    list: &LeadList,
    label: &str,
    date: NaiveDate,
    archive_dir: &Path,
    output_dir: &Path,
) -> Result<ArchivedList> {
    let name = archive_file_name(label, date);

    ensure_dir(archive_dir).await?;
    let archive_path = archive_dir.join(&name);
    leadpages_ingest::write_lead_list(&archive_path, list).await?;

    let published_dir = output_dir.join(OUTPUT_ARCHIVE_DIR);
    ensure_dir(&published_dir).await?;
    let published_path = published_dir.join(&name);
    tokio::fs::copy(&archive_path, &published_path)
        .await
        .map_err(|e| LeadPagesError::io(&published_path, e))?;

    info!(
        archive = %archive_path.display(),
        published = %published_path.display(),
        "lead list archived"
    );

    Ok(ArchivedList {
        archive_path,
        published_path,
    })
}
