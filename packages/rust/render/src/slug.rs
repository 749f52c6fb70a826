//! URL-safe slugs derived from company names.

use std::sync::LazyLock;

use regex::Regex;

use leadpages_shared::{COMPANY_NAME_COLUMN, COMPANY_SLUG_COLUMN, Row};

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\s_-]").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static HYPHENS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").expect("valid regex"));

/// Lowercase `name`, keep `[a-z0-9_-]`, turn whitespace runs into single
/// hyphens, and trim separators from both ends.
///
/// ```
/// assert_eq!(leadpages_render::slugify("Acme Corp!!"), "acme-corp");
/// ```
pub fn slugify(name: &str) -> String {
    let lower = name.to_lowercase();
    let kept = DISALLOWED.replace_all(&lower, "");
    let hyphenated = WHITESPACE.replace_all(&kept, "-");
    let collapsed = HYPHENS.replace_all(&hyphenated, "-");
    collapsed.trim_matches(['-', '_']).to_string()
}

/// Slug for a row: explicit `company_slug` when non-blank, else `company_name`.
pub fn row_slug(row: &Row) -> String {
    match row.get(COMPANY_SLUG_COLUMN).map(str::trim) {
        Some(provided) if !provided.is_empty() => slugify(provided),
        _ => slugify(row.get(COMPANY_NAME_COLUMN).unwrap_or("")),
    }
}
