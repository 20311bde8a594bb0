//! Message processing pipeline: the glue between the raw message list and the
//! renderers.
//!
//! Flow: raw messages → collate streamed fragments → resolve the active
//! channel payload → classify into renderer identifiers → sanitize text.

pub mod error;

pub use error::{Error, Result};
use {
    convo_channels::{Namespace, resolve_payload},
    convo_collate::collate,
    convo_common::{CollatedMessage, Message},
    convo_config::ConvoConfig,
    convo_routing::{MatchRule, RuleRef, RuleSet},
    convo_sanitize::Sanitizer,
    serde::Serialize,
    tracing::{debug, info},
};

/// Everything a renderer needs to display one entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderPlan {
    pub message: CollatedMessage,
    /// Namespace the payload was read from, if any.
    pub namespace: Option<Namespace>,
    /// Matching renderer identifiers, in rule order.
    pub renderers: Vec<RuleRef>,
    /// Sanitized message text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

impl RenderPlan {
    pub fn primary_renderer(&self) -> Option<&RuleRef> {
        self.renderers.first()
    }
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    config: ConvoConfig,
    rules: RuleSet,
    sanitizer: Sanitizer,
}

impl Pipeline {
    pub fn new(config: ConvoConfig, plugins: Vec<MatchRule>) -> Result<Self> {
        let rules = RuleSet::new(plugins)?;
        let sanitizer = Sanitizer::new(&config.sanitization);
        Ok(Self {
            config,
            rules,
            sanitizer,
        })
    }

    pub fn config(&self) -> &ConvoConfig {
        &self.config
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn sanitizer(&self) -> &Sanitizer {
        &self.sanitizer
    }

    /// Build render plans for the full message list.
    pub fn process(&self, messages: &[Message]) -> Vec<RenderPlan> {
        let entries = collate(messages, &self.config);
        let plans: Vec<RenderPlan> = entries.into_iter().map(|e| self.plan(e)).collect();

        info!(
            messages = messages.len(),
            entries = plans.len(),
            collated = plans.iter().filter(|p| p.message.is_collated()).count(),
            "processed message list"
        );
        plans
    }

    /// Plan a single entry, skipping collation.
    pub fn plan(&self, entry: CollatedMessage) -> RenderPlan {
        let namespace = resolve_payload(&entry.message, &self.config.channels).map(|p| p.namespace);
        let renderers = self.rules.match_message(&entry.message, &self.config);
        let html = entry
            .message
            .text_str()
            .map(|text| self.sanitizer.sanitize(&text));

        debug!(
            message_id = %entry.message.id,
            namespace = namespace.map_or("none", Namespace::as_str),
            renderers = ?renderers.iter().map(RuleRef::name).collect::<Vec<_>>(),
            "planned entry"
        );

        RenderPlan {
            message: entry,
            namespace,
            renderers,
            html,
        }
    }
}
