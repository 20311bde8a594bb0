//! Allow-list policy: which tags, attributes and URL schemes survive cleaning.

use std::collections::BTreeSet;

/// Built-in tag allow-list: rich text, structure, tables and media.
pub const DEFAULT_ALLOWED_TAGS: &[&str] = &[
    // rich text
    "a", "abbr", "b", "blockquote", "br", "cite", "code", "del", "em", "hr", "i", "ins", "kbd",
    "mark", "p", "pre", "q", "s", "small", "span", "strong", "sub", "sup", "u",
    // structure
    "article", "dd", "details", "div", "dl", "dt", "figcaption", "figure", "footer", "h1", "h2",
    "h3", "h4", "h5", "h6", "header", "li", "ol", "section", "summary", "ul",
    // tables
    "caption", "col", "colgroup", "table", "tbody", "td", "tfoot", "th", "thead", "tr",
    // media
    "audio", "img", "picture", "source", "track", "video",
];

/// Attributes allowed on every tag. Event handlers (`on*`) are never listed.
pub const GENERIC_ATTRIBUTES: &[&str] = &["class", "dir", "lang", "role", "title", "aria-label"];

/// Per-tag attribute allowances.
pub const TAG_ATTRIBUTES: &[(&str, &[&str])] = &[
    ("a", &["href", "name", "target"]),
    ("img", &["alt", "height", "loading", "src", "width"]),
    ("audio", &["controls", "loop", "muted", "preload", "src"]),
    ("video", &["controls", "height", "loop", "muted", "preload", "src", "width"]),
    ("source", &["media", "src", "type"]),
    ("track", &["default", "kind", "label", "src", "srclang"]),
    ("ol", &["reversed", "start", "type"]),
    ("td", &["align", "colspan", "rowspan"]),
    ("th", &["align", "colspan", "rowspan", "scope"]),
    ("col", &["span"]),
    ("colgroup", &["span"]),
    ("details", &["open"]),
];

/// URL schemes allowed in `href`/`src`. `javascript:`, `data:` and
/// `vbscript:` are absent on purpose.
pub const URL_SCHEMES: &[&str] = &["http", "https", "mailto", "tel"];

/// Tags removed together with everything inside them.
pub const CONTENT_STRIPPED_TAGS: &[&str] = &["script", "style"];

/// The tag allow-list in effect for one cleaning pass. Tag names are
/// normalized to lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    tags: BTreeSet<String>,
}

impl AllowList {
    pub fn builtin() -> Self {
        Self::replacing(DEFAULT_ALLOWED_TAGS)
    }

    /// An allow-list made of exactly `tags`; the built-in list is not merged in.
    pub fn replacing<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tags = tags
            .into_iter()
            .map(|t| t.as_ref().trim().to_ascii_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        Self { tags }
    }

    /// The built-in list, unless `allowed_tags_override` replaces it.
    pub fn resolve(allowed_tags_override: Option<&BTreeSet<String>>) -> Self {
        match allowed_tags_override {
            Some(tags) => Self::replacing(tags),
            None => Self::builtin(),
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains(&tag.to_ascii_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Allowed tags that the cleaner strips with their content.
    pub fn conflicts(&self) -> Vec<String> {
        CONTENT_STRIPPED_TAGS
            .iter()
            .filter(|tag| self.tags.contains(**tag))
            .map(|tag| (*tag).to_owned())
            .collect()
    }
}

impl Default for AllowList {
    fn default() -> Self {
        Self::builtin()
    }
}
