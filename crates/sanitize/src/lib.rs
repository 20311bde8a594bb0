//! HTML sanitization policy for message text.
//!
//! Parsing and cleaning are delegated to an [`HtmlCleaner`] (ammonia by
//! default); this crate decides what is allowed and what happens on failure.
//! A failing cleaner never reaches the caller: the failure is logged and the
//! original text is returned.

pub mod cleaner;
pub mod error;
pub mod policy;

use std::{
    collections::BTreeSet,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::Arc,
};

pub use {
    cleaner::{AmmoniaCleaner, HtmlCleaner},
    error::{Error, Result},
    policy::{AllowList, DEFAULT_ALLOWED_TAGS},
};
use {convo_config::SanitizationConfig, tracing::error};

#[cfg(feature = "metrics")]
use convo_metrics::{counter, labels, sanitize as sanitize_metrics};

/// Sanitize `raw_html` with the built-in policy, or with
/// `allowed_tags_override` replacing the built-in tag list.
pub fn sanitize(raw_html: &str, allowed_tags_override: Option<&BTreeSet<String>>) -> String {
    Sanitizer::default().sanitize_with(raw_html, allowed_tags_override)
}

/// Sanitizer bound to a configuration snapshot.
#[derive(Clone)]
pub struct Sanitizer {
    enabled: bool,
    allow: AllowList,
    cleaner: Arc<dyn HtmlCleaner>,
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new(&SanitizationConfig::default())
    }
}

impl std::fmt::Debug for Sanitizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sanitizer")
            .field("enabled", &self.enabled)
            .field("allow", &self.allow)
            .finish_non_exhaustive()
    }
}

impl Sanitizer {
    pub fn new(config: &SanitizationConfig) -> Self {
        Self::with_cleaner(config, Arc::new(AmmoniaCleaner))
    }

    pub fn with_cleaner(config: &SanitizationConfig, cleaner: Arc<dyn HtmlCleaner>) -> Self {
        Self {
            enabled: config.enabled,
            allow: AllowList::resolve(config.allowed_tags.as_ref()),
            cleaner,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.allow
    }

    /// Sanitize under the configured allow-list.
    pub fn sanitize(&self, raw_html: &str) -> String {
        self.sanitize_with(raw_html, None)
    }

    /// Sanitize with an optional per-call allow-list that replaces the
    /// configured one. A disabled sanitizer returns the input unchanged.
    pub fn sanitize_with(
        &self,
        raw_html: &str,
        allowed_tags_override: Option<&BTreeSet<String>>,
    ) -> String {
        if !self.enabled {
            return raw_html.to_owned();
        }

        let replaced;
        let allow = match allowed_tags_override {
            Some(tags) => {
                replaced = AllowList::replacing(tags);
                &replaced
            },
            None => &self.allow,
        };

        let outcome = catch_unwind(AssertUnwindSafe(|| self.cleaner.clean(raw_html, allow)))
            .unwrap_or_else(|panic| {
                Err(Error::CleanerPanicked {
                    message: panic_message(panic.as_ref()),
                })
            });

        match outcome {
            Ok(clean) => clean,
            Err(e) => {
                error!(error = %e, len = raw_html.len(), "html sanitization failed, returning original text");
                #[cfg(feature = "metrics")]
                counter!(sanitize_metrics::FAILURES_TOTAL, labels::REASON => failure_reason(&e))
                    .increment(1);
                raw_html.to_owned()
            },
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}

#[cfg(feature = "metrics")]
fn failure_reason(e: &Error) -> &'static str {
    match e {
        Error::CleanerPanicked { .. } => "panic",
        Error::Backend { .. } => "backend",
    }
}
