//! Core domain types: rows, lead lists, and template tags.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Column holding an explicit slug, preferred over the company name.
pub const COMPANY_SLUG_COLUMN: &str = "company_slug";

/// Column holding the company name slugs fall back to.
pub const COMPANY_NAME_COLUMN: &str = "company_name";

/// Column appended to every processed lead list.
pub const LANDING_PAGE_URL_COLUMN: &str = "landing_page_url";

/// Column names that may carry an explicit template choice, in lookup order.
pub const USE_CASE_COLUMNS: &[&str] = &["use_case", "Use Case"];

/// Value written in place of a URL for rows that failed to generate.
pub const ERROR_MARKER: &str = "ERROR";

// ---------------------------------------------------------------------------
// Row
// ---------------------------------------------------------------------------

/// One record of a lead list: `(header, value)` pairs in column order.
///
/// Pairs are kept by position so a list with repeated headers writes back
/// every original value. Lookups by name see the last column of that name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    fields: Vec<(String, String)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of `key`, if the column exists for this row.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First non-blank value among several alternative column names.
    pub fn get_any(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .filter_map(|k| self.get(k))
            .find(|v| !v.trim().is_empty())
    }

    /// Append a column value, keeping any earlier column of the same name.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.push((key.into(), value.into()));
    }

    /// Replace the value of `key` (its last occurrence), or append it.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        match self.fields.iter_mut().rev().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value.into(),
            None => self.fields.push((key, value.into())),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.iter().any(|(k, _)| k == key)
    }

    /// Value in column `index` when that column is named `key`.
    fn positional(&self, index: usize, key: &str) -> Option<&str> {
        self.fields
            .get(index)
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Best human-readable identifier for log lines.
    pub fn identifier(&self) -> &str {
        self.get_any(&[COMPANY_NAME_COLUMN, COMPANY_SLUG_COLUMN])
            .unwrap_or("<unnamed row>")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.push(k, v);
        }
        row
    }
}

// ---------------------------------------------------------------------------
// LeadList
// ---------------------------------------------------------------------------

/// Field separator of a delimited file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    Comma,
    Tab,
}

impl Delimiter {
    pub fn as_byte(self) -> u8 {
        match self {
            Self::Comma => b',',
            Self::Tab => b'\t',
        }
    }
}

/// All rows of one input file, in source order.
#[derive(Debug, Clone)]
pub struct LeadList {
    /// File the rows were read from.
    pub source: PathBuf,
    /// Delimiter detected on read.
    pub delimiter: Delimiter,
    /// Trimmed headers in source order.
    pub headers: Vec<String>,
    /// Rows in source order.
    pub rows: Vec<Row>,
    /// Some bytes were not valid UTF-8 and were replaced on read. Such a list
    /// must not be written back over its source.
    pub decoded_lossily: bool,
}

impl LeadList {
    /// File name of the source, e.g. `abm.csv`.
    pub fn file_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Set `column` on every row, appending the header if absent.
    ///
    /// `values` pairs up with `rows` by position; surplus rows get an empty value.
    pub fn set_column(&mut self, column: &str, values: &[String]) {
        if !self.headers.iter().any(|h| h == column) {
            self.headers.push(column.to_string());
        }
        for (i, row) in self.rows.iter_mut().enumerate() {
            let value = values.get(i).cloned().unwrap_or_default();
            row.insert(column, value);
        }
    }

    /// Row values laid out in header order, blank where a row lacks a column.
    ///
    /// Columns read from the source are taken by position; columns added later
    /// (and short records) fall back to lookup by name.
    pub fn records(&self) -> impl Iterator<Item = Vec<&str>> {
        self.rows.iter().map(|row| {
            self.headers
                .iter()
                .enumerate()
                .map(|(i, h)| row.positional(i, h).or_else(|| row.get(h)).unwrap_or(""))
                .collect()
        })
    }
}

// ---------------------------------------------------------------------------
// TemplateTag
// ---------------------------------------------------------------------------

/// Name of a template variant, e.g. `website-simple` or `abm`.
///
/// Tags are compared case-insensitively; the stored form is lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateTag(String);

impl TemplateTag {
    pub fn new(tag: &str) -> Self {
        Self(tag.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TemplateTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TemplateTag {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_list() -> LeadList {
        LeadList {
            source: PathBuf::from("data/websites.csv"),
            delimiter: Delimiter::Comma,
            headers: vec!["company_name".into(), "headline".into()],
            rows: vec![
                Row::from_iter([("company_name", "Acme"), ("headline", "Hi")]),
                Row::from_iter([("company_name", "Globex")]),
            ],
            decoded_lossily: false,
        }
    }

    #[test]
    fn get_any_skips_blank_values() {
        let row = Row::from_iter([("use_case", "  "), ("Use Case", "abm")]);
        assert_eq!(row.get_any(USE_CASE_COLUMNS), Some("abm"));
    }

    #[test]
    fn identifier_prefers_company_name() {
        let row = Row::from_iter([("company_slug", "acme-2"), ("company_name", "Acme")]);
        assert_eq!(row.identifier(), "Acme");
        assert_eq!(Row::new().identifier(), "<unnamed row>");
    }

    #[test]
    fn set_column_appends_header_once() {
        let mut list = sample_list();
        list.set_column("landing_page_url", &["a".into(), "b".into()]);
        list.set_column("landing_page_url", &["c".into(), "d".into()]);

        assert_eq!(list.headers.len(), 3);
        assert_eq!(list.rows[0].get("landing_page_url"), Some("c"));
        assert_eq!(list.rows[1].get("landing_page_url"), Some("d"));
    }

    #[test]
    fn records_fill_missing_columns() {
        let list = sample_list();
        let records: Vec<_> = list.records().collect();
        assert_eq!(records[0], vec!["Acme", "Hi"]);
        assert_eq!(records[1], vec!["Globex", ""]);
    }

    #[test]
    fn repeated_headers_keep_every_value() {
        let mut list = LeadList {
            source: PathBuf::from("data/notes.csv"),
            delimiter: Delimiter::Comma,
            headers: vec!["company_name".into(), "notes".into(), "notes".into()],
            rows: vec![Row::from_iter([
                ("company_name", "Acme"),
                ("notes", "first"),
                ("notes", "second"),
            ])],
            decoded_lossily: false,
        };
        assert_eq!(list.rows[0].get("notes"), Some("second"));

        list.set_column("landing_page_url", &["https://x/acme".into()]);
        let records: Vec<_> = list.records().collect();
        assert_eq!(
            records[0],
            vec!["Acme", "first", "second", "https://x/acme"]
        );
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut row = Row::from_iter([("a", "1"), ("b", "2")]);
        row.insert("a", "3");
        row.insert("c", "4");
        assert_eq!(row.get("a"), Some("3"));
        assert_eq!(row.get("c"), Some("4"));
        assert_eq!(row.positional(0, "a"), Some("3"));
    }

    #[test]
    fn template_tag_normalizes_case() {
        assert_eq!(TemplateTag::new(" ABM "), TemplateTag::new("abm"));
        assert_eq!(TemplateTag::from("Website-Full").as_str(), "website-full");
    }
}
