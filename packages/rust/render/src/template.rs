//! Template parsing and rendering.
//!
//! A template is split once into literal text, `{{key}}` placeholders, and
//! relative asset prefixes (`../assets/` inside `src=`, `href=`, or `url(...)`).
//! Rendering walks the segments and emits the asset prefix for the requested
//! [`AssetBase`], so the nested and flat copies of a page come from the same pass.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use leadpages_shared::{COMPANY_SLUG_COLUMN, Row};

/// Asset prefix as written in templates (pages live one level below the root).
pub const NESTED_ASSET_PREFIX: &str = "../assets/";

/// Asset prefix for pages written at the output root.
pub const ROOT_ASSET_PREFIX: &str = "assets/";

/// Placeholders and asset references, whichever comes first.
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\{\{(?P<key>[^{}]+)\}\}|(?P<lead>\b(?:src|href)\s*=\s*["']|url\(\s*["']?)\.\./assets/"#,
    )
    .expect("valid regex")
});

/// Asset references alone, used on substituted values.
static ASSET_REF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?P<lead>\b(?:src|href)\s*=\s*["']|url\(\s*["']?)\.\./assets/"#)
        .expect("valid regex")
});

/// Text right before a placeholder that makes it a URL position.
static URL_CONTEXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:\b(?:src|href)\s*=\s*["']|url\(\s*["']?)$"#).expect("valid regex")
});

/// Where a rendered page sits relative to the `assets/` directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetBase {
    /// `<output>/<slug>/index.html`
    Nested,
    /// `<output>/<slug>.html`
    Root,
}

impl AssetBase {
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Nested => NESTED_ASSET_PREFIX,
            Self::Root => ROOT_ASSET_PREFIX,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Placeholder {
        key: String,
        /// Placeholder is the start of a `src`/`href`/`url()` value.
        in_url: bool,
    },
    AssetPrefix,
}

/// A parsed HTML template.
#[derive(Debug, Clone)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str) -> Self {
        let mut segments = Vec::new();
        let mut last = 0;

        for caps in TOKEN_RE.captures_iter(source) {
            let Some(whole) = caps.get(0) else { continue };
            let mut text = source[last..whole.start()].to_string();

            if let Some(key) = caps.name("key") {
                let in_url = URL_CONTEXT_RE.is_match(&text);
                push_text(&mut segments, std::mem::take(&mut text));
                segments.push(Segment::Placeholder {
                    key: key.as_str().to_string(),
                    in_url,
                });
            } else if let Some(lead) = caps.name("lead") {
                text.push_str(lead.as_str());
                push_text(&mut segments, text);
                segments.push(Segment::AssetPrefix);
            }

            last = whole.end();
        }
        push_text(&mut segments, source[last..].to_string());

        Self { segments }
    }

    /// Render for one row.
    ///
    /// Placeholders without a matching column stay as literal `{{key}}` text.
    /// `{{company_slug}}` always renders the computed `slug`, never the raw
    /// column value, so the page agrees with its URL.
    pub fn render(&self, row: &Row, slug: &str, base: AssetBase) -> String {
        let mut out = String::new();

        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::AssetPrefix => out.push_str(base.prefix()),
                Segment::Placeholder { key, .. } if key == COMPANY_SLUG_COLUMN => {
                    out.push_str(slug)
                }
                Segment::Placeholder { key, in_url } => match row.get(key) {
                    Some(value) => {
                        if *in_url && value.starts_with(NESTED_ASSET_PREFIX) {
                            out.push_str(base.prefix());
                            out.push_str(&value[NESTED_ASSET_PREFIX.len()..]);
                        } else {
                            out.push_str(&rebase_fragment(value, base));
                        }
                    }
                    None => {
                        out.push_str("{{");
                        out.push_str(key);
                        out.push_str("}}");
                    }
                },
            }
        }

        out
    }

    /// Every placeholder key in the template, deduplicated.
    pub fn placeholders(&self) -> BTreeSet<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Placeholder { key, .. } => Some(key.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Placeholders this row leaves unresolved.
    pub fn unresolved<'a>(&'a self, row: &Row) -> Vec<&'a str> {
        self.placeholders()
            .into_iter()
            .filter(|k| *k != COMPANY_SLUG_COLUMN && !row.contains_key(k))
            .collect()
    }
}

/// Rebase asset references inside a substituted value (e.g. an HTML snippet).
fn rebase_fragment(value: &str, base: AssetBase) -> Cow<'_, str> {
    if base == AssetBase::Nested {
        return Cow::Borrowed(value);
    }
    ASSET_REF_RE.replace_all(value, |caps: &Captures| {
        format!("{}{}", &caps["lead"], base.prefix())
    })
}

fn push_text(segments: &mut Vec<Segment>, text: String) {
    if !text.is_empty() {
        segments.push(Segment::Text(text));
    }
}
