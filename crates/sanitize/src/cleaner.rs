//! HTML cleaning backends.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::{
    error::Result,
    policy::{AllowList, CONTENT_STRIPPED_TAGS, GENERIC_ATTRIBUTES, TAG_ATTRIBUTES, URL_SCHEMES},
};

/// Parses and cleans an HTML fragment under an allow-list.
pub trait HtmlCleaner: Send + Sync {
    fn clean(&self, raw: &str, allow: &AllowList) -> Result<String>;
}

/// Cleaner backed by `ammonia` (html5ever parser).
#[derive(Debug, Clone, Copy, Default)]
pub struct AmmoniaCleaner;

impl HtmlCleaner for AmmoniaCleaner {
    fn clean(&self, raw: &str, allow: &AllowList) -> Result<String> {
        // ammonia asserts `tags` and `clean_content_tags` are disjoint.
        let conflicts = allow.conflicts();
        if !conflicts.is_empty() {
            warn!(tags = ?conflicts, "allow-list names content-stripped tags, ignoring them");
        }
        let tags = allow
            .iter()
            .filter(|tag| !CONTENT_STRIPPED_TAGS.contains(tag))
            .collect();

        let tag_attributes: HashMap<&str, HashSet<&str>> = TAG_ATTRIBUTES
            .iter()
            .map(|(tag, attrs)| (*tag, attrs.iter().copied().collect()))
            .collect();

        let mut builder = ammonia::Builder::default();
        builder
            .tags(tags)
            .generic_attributes(GENERIC_ATTRIBUTES.iter().copied().collect())
            .tag_attributes(tag_attributes)
            .url_schemes(URL_SCHEMES.iter().copied().collect())
            .clean_content_tags(CONTENT_STRIPPED_TAGS.iter().copied().collect())
            .strip_comments(true);

        Ok(builder.clean(raw).to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn strips_comments() {
        let out = AmmoniaCleaner
            .clean("a<!-- secret -->b", &AllowList::builtin())
            .unwrap();
        assert_eq!(out, "ab");
    }

    #[test]
    fn disallowed_tags_keep_their_text() {
        let out = AmmoniaCleaner
            .clean("<marquee>hi</marquee>", &AllowList::builtin())
            .unwrap();
        assert_eq!(out, "hi");
    }

    #[test]
    fn content_stripped_tags_in_allow_list_are_still_stripped() {
        let out = AmmoniaCleaner
            .clean(
                "<p>x</p><style>p{}</style><script>y()</script>",
                &AllowList::replacing(["p", "style", "script"]),
            )
            .unwrap();
        assert_eq!(out, "<p>x</p>");
    }
}
