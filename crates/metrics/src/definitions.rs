//! Metric name and label definitions.
//!
//! Centralizing these keeps names consistent across crates.

/// Channel resolver metrics
pub mod channels {
    /// Payload resolutions, labeled by winning namespace ("none" when absent)
    pub const RESOLUTIONS_TOTAL: &str = "convo_channel_resolutions_total";
}

/// Match engine metrics
pub mod routing {
    /// Renderer identifiers produced, labeled by rule
    pub const RULE_MATCHES_TOTAL: &str = "convo_rule_matches_total";
    /// Predicates that returned an error or panicked, labeled by rule
    pub const RULE_FAILURES_TOTAL: &str = "convo_rule_failures_total";
    /// Messages that matched no rule at all
    pub const UNMATCHED_TOTAL: &str = "convo_unmatched_messages_total";
}

/// Stream collator metrics
pub mod collate {
    /// Messages folded into a preceding entry
    pub const MERGED_TOTAL: &str = "convo_collate_merged_total";
}

/// Sanitizer metrics
pub mod sanitize {
    /// Cleaning failures that fell back to the original text
    pub const FAILURES_TOTAL: &str = "convo_sanitize_failures_total";
}

/// Common label keys
pub mod labels {
    pub const NAMESPACE: &str = "namespace";
    pub const RULE: &str = "rule";
    pub const REASON: &str = "reason";
}
