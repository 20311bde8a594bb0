use std::{
    fmt,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::Arc,
};

use {
    convo_common::Message,
    convo_config::ConvoConfig,
    serde::{Serialize, Serializer},
    tracing::warn,
};

#[cfg(feature = "metrics")]
use convo_metrics::{counter, labels, routing as routing_metrics};

use crate::builtins::Renderer;

/// Plugin predicate. Errors and panics are treated as a non-match.
pub type Predicate = Arc<dyn Fn(&Message, &ConvoConfig) -> anyhow::Result<bool> + Send + Sync>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuleOptions {
    /// Keep scanning after this rule matches.
    pub passthrough: bool,
}

/// Identifier contributed by a matching rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RuleRef {
    Builtin(Renderer),
    Plugin(String),
}

impl RuleRef {
    pub fn name(&self) -> &str {
        match self {
            Self::Builtin(renderer) => renderer.as_str(),
            Self::Plugin(id) => id,
        }
    }
}

impl fmt::Display for RuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for RuleRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl PartialEq<&str> for RuleRef {
    fn eq(&self, other: &&str) -> bool {
        self.name() == *other
    }
}

impl From<Renderer> for RuleRef {
    fn from(renderer: Renderer) -> Self {
        Self::Builtin(renderer)
    }
}

/// A consumer-supplied classification rule.
///
/// ```rust,ignore
/// let vip = MatchRule::when("VIP", |m, _| m.data_field("vip") == Some(&json!(true)));
/// let tagger = MatchRule::when("tagger", |m, _| m.has_text()).passthrough();
/// ```
#[derive(Clone)]
pub struct MatchRule {
    name: String,
    identifier: RuleRef,
    predicate: Predicate,
    options: RuleOptions,
}

impl fmt::Debug for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchRule")
            .field("name", &self.name)
            .field("identifier", &self.identifier)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl MatchRule {
    /// Rule with a fallible predicate. The identifier defaults to the name.
    pub fn new<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Message, &ConvoConfig) -> anyhow::Result<bool> + Send + Sync + 'static,
    {
        let name = name.into();
        Self {
            identifier: RuleRef::Plugin(name.clone()),
            name,
            predicate: Arc::new(predicate),
            options: RuleOptions::default(),
        }
    }

    pub fn when<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Message, &ConvoConfig) -> bool + Send + Sync + 'static,
    {
        Self::new(name, move |message, config| Ok(predicate(message, config)))
    }

    #[must_use]
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = RuleRef::Plugin(identifier.into());
        self
    }

    #[must_use]
    pub fn passthrough(mut self) -> Self {
        self.options.passthrough = true;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: RuleOptions) -> Self {
        self.options = options;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn identifier(&self) -> &RuleRef {
        &self.identifier
    }

    pub fn options(&self) -> RuleOptions {
        self.options
    }

    /// Run the predicate, isolating errors and panics to this rule.
    pub(crate) fn evaluate(&self, message: &Message, config: &ConvoConfig) -> bool {
        let outcome = catch_unwind(AssertUnwindSafe(|| (self.predicate)(message, config)));
        let failure = match outcome {
            Ok(Ok(matched)) => return matched,
            Ok(Err(e)) => format!("{e:#}"),
            Err(panic) => match panic.downcast_ref::<&str>() {
                Some(s) => format!("panicked: {s}"),
                None => match panic.downcast_ref::<String>() {
                    Some(s) => format!("panicked: {s}"),
                    None => "panicked".to_owned(),
                },
            },
        };

        warn!(rule = %self.name, message_id = %message.id, error = %failure, "match rule failed, skipping");
        #[cfg(feature = "metrics")]
        counter!(routing_metrics::RULE_FAILURES_TOTAL, labels::RULE => self.name.clone())
            .increment(1);
        false
    }
}

#[cfg(test)]
mod tests {
    use {super::*, convo_common::Source};

    #[test]
    fn identifier_defaults_to_name() {
        let rule = MatchRule::when("vip", |_, _| true);
        assert_eq!(rule.identifier(), &"vip");
        assert!(!rule.options().passthrough);

        let rule = rule.with_identifier("VipCard").passthrough();
        assert_eq!(rule.name(), "vip");
        assert_eq!(rule.identifier().to_string(), "VipCard");
        assert!(rule.options().passthrough);
    }

    #[test]
    fn evaluate_isolates_failures() {
        let msg = Message::new("m-1", Source::Bot);
        let config = ConvoConfig::default();

        let ok = MatchRule::new("ok", |_, _| Ok(true));
        let err = MatchRule::new("err", |_, _| anyhow::bail!("lookup failed"));
        let boom = MatchRule::when("boom", |_, _| panic!("plugin bug"));

        assert!(ok.evaluate(&msg, &config));
        assert!(!err.evaluate(&msg, &config));
        assert!(!boom.evaluate(&msg, &config));
    }

    #[test]
    fn rule_ref_serializes_as_plain_string() {
        let refs = vec![
            RuleRef::Builtin(Renderer::QuickReplies),
            RuleRef::Plugin("VIP".into()),
        ];
        assert_eq!(
            serde_json::to_value(&refs).ok(),
            Some(serde_json::json!(["quick_replies", "VIP"]))
        );
    }
}
