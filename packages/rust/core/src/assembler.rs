//! Output tree assembler.
//!
//! Writes rendered pages and copies static assets into the output directory:
//! ```text
//! <output>/
//! ├── assets/            (copied verbatim, overwriting)
//! ├── <slug>/index.html  (asset refs as ../assets/)
//! ├── <slug>.html        (asset refs as assets/)
//! └── final_lead_lists/  (archive mirror, see `archive`)
//! ```

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use leadpages_render::{AssetBase, Template};
use leadpages_shared::{LeadPagesError, Result, Row};

/// Name of the copied assets directory under the output root.
pub const ASSETS_DIR_NAME: &str = "assets";

/// Both files written for one row.
#[derive(Debug, Clone)]
pub struct PagePaths {
    /// `<output>/<slug>/index.html`
    pub index: PathBuf,
    /// `<output>/<slug>.html`
    pub flat: PathBuf,
}

/// Render `template` for `row` and write the nested and flat copies.
///
/// Fails on an empty slug; the page would otherwise land on the output root.
#[instrument(skip(template, row), fields(output = %output_dir.display()))]
pub async fn write_page(
    output_dir: &Path,
    slug: &str,
    template: &Template,
    row: &Row,
) -> Result<PagePaths> {
    if slug.is_empty() {
        return Err(LeadPagesError::validation(format!(
            "row '{}' has no usable company_slug or company_name",
            row.identifier()
        )));
    }

    let page_dir = output_dir.join(slug);
    ensure_dir(&page_dir).await?;

    let index = page_dir.join("index.html");
    write_file(&index, &template.render(row, slug, AssetBase::Nested)).await?;

    let flat = output_dir.join(format!("{slug}.html"));
    write_file(&flat, &template.render(row, slug, AssetBase::Root)).await?;

    debug!(index = %index.display(), flat = %flat.display(), "wrote page");
    Ok(PagePaths { index, flat })
}

/// Copy the assets tree into `<output>/assets`, overwriting existing files.
///
/// A missing source directory is not an error. Returns the number of files copied.
#[instrument(skip_all, fields(src = %src.display()))]
pub async fn copy_assets(src: &Path, output_dir: &Path) -> Result<usize> {
    if !tokio::fs::try_exists(src).await.unwrap_or(false) {
        warn!(src = %src.display(), "assets directory not found, skipping copy");
        return Ok(0);
    }

    let dst = output_dir.join(ASSETS_DIR_NAME);
    let copied = copy_tree(src, &dst).await?;
    info!(copied, dst = %dst.display(), "assets copied");
    Ok(copied)
}

/// Recursive directory copy.
pub async fn copy_tree(src: &Path, dst: &Path) -> Result<usize> {
    let mut copied = 0;
    let mut pending = vec![(src.to_path_buf(), dst.to_path_buf())];

    while let Some((from_dir, to_dir)) = pending.pop() {
        ensure_dir(&to_dir).await?;

        let mut entries = tokio::fs::read_dir(&from_dir)
            .await
            .map_err(|e| LeadPagesError::io(&from_dir, e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| LeadPagesError::io(&from_dir, e))?
        {
            let from = entry.path();
            let to = to_dir.join(entry.file_name());
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| LeadPagesError::io(&from, e))?;

            if file_type.is_dir() {
                pending.push((from, to));
            } else {
                tokio::fs::copy(&from, &to)
                    .await
                    .map_err(|e| LeadPagesError::io(&to, e))?;
                copied += 1;
            }
        }
    }

    Ok(copied)
}

pub(crate) async fn ensure_dir(dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| LeadPagesError::io(dir, e))
}

async fn write_file(path: &Path, content: &str) -> Result<()> {
    tokio::fs::write(path, content)
        .await
        .map_err(|e| LeadPagesError::io(path, e))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
