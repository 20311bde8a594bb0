use std::collections::HashSet;

use {
    convo_common::Message,
    convo_config::ConvoConfig,
    tracing::debug,
};

#[cfg(feature = "metrics")]
use convo_metrics::{counter, labels, routing as routing_metrics};

use crate::{
    Error, Result,
    builtins::{MessageView, Renderer},
    rule::{MatchRule, RuleRef},
};

/// Classify `message` against `plugins` followed by the enabled built-ins.
///
/// Returns the identifiers of matching rules in rule order. Scanning stops at
/// the first match whose rule is not passthrough. The result is empty only
/// when the `text` fallback is disabled and nothing else matched.
pub fn match_message(
    message: &Message,
    config: &ConvoConfig,
    plugins: &[MatchRule],
) -> Vec<RuleRef> {
    let matched = scan(message, config, plugins);

    if matched.is_empty() {
        debug!(message_id = %message.id, "no match rule applied");
    } else {
        debug!(message_id = %message.id, rules = ?matched, "matched rules");
    }
    #[cfg(feature = "metrics")]
    record_matches(&matched);

    matched
}

#[cfg(feature = "metrics")]
fn record_matches(matched: &[RuleRef]) {
    if matched.is_empty() {
        counter!(routing_metrics::UNMATCHED_TOTAL).increment(1);
    }
    for rule in matched {
        counter!(routing_metrics::RULE_MATCHES_TOTAL, labels::RULE => rule.name().to_owned())
            .increment(1);
    }
}

fn scan(message: &Message, config: &ConvoConfig, plugins: &[MatchRule]) -> Vec<RuleRef> {
    let mut matched = Vec::new();

    for rule in plugins {
        if !rule.evaluate(message, config) {
            continue;
        }
        matched.push(rule.identifier().clone());
        if !rule.options().passthrough {
            return matched;
        }
    }

    let view = MessageView::new(message, &config.channels);
    let enabled = Renderer::ALL
        .into_iter()
        .filter(|r| !config.renderers.is_disabled(r.as_str()));
    for renderer in enabled {
        if !renderer.matches(&view) {
            continue;
        }
        matched.push(RuleRef::Builtin(renderer));
        if !renderer.passthrough() {
            break;
        }
    }

    matched
}

/// A validated plugin list, reusable across messages.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    plugins: Vec<MatchRule>,
}

impl RuleSet {
    /// Plugin names must be unique and must not shadow a built-in.
    pub fn new(plugins: Vec<MatchRule>) -> Result<Self> {
        {
            let mut seen = HashSet::new();
            for rule in &plugins {
                let name = rule.name();
                if Renderer::from_name(name).is_some() || !seen.insert(name) {
                    return Err(Error::DuplicateRule {
                        name: name.to_owned(),
                    });
                }
            }
        }
        Ok(Self { plugins })
    }

    pub fn plugins(&self) -> &[MatchRule] {
        &self.plugins
    }

    pub fn match_message(&self, message: &Message, config: &ConvoConfig) -> Vec<RuleRef> {
        match_message(message, config, &self.plugins)
    }
}
