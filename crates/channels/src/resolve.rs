use {
    convo_common::Message,
    convo_config::{ChannelsConfig, NamespaceKeys, PrecedenceStep},
    serde::Serialize,
    serde_json::Value,
    tracing::trace,
};

#[cfg(feature = "metrics")]
use convo_metrics::{channels as ch_metrics, counter, labels};

/// One of the parallel encodings a message may carry under `data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    DefaultPreview,
    Primary,
    Secondary,
}

impl Namespace {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DefaultPreview => "default_preview",
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        }
    }

    /// Key under `data` holding this namespace.
    pub fn key(self, keys: &NamespaceKeys) -> &str {
        match self {
            Self::DefaultPreview => &keys.default_preview,
            Self::Primary => &keys.primary,
            Self::Secondary => &keys.secondary,
        }
    }
}

impl From<PrecedenceStep> for Namespace {
    fn from(step: PrecedenceStep) -> Self {
        match step {
            PrecedenceStep::DefaultPreview => Self::DefaultPreview,
            PrecedenceStep::Primary => Self::Primary,
            PrecedenceStep::SyncedSecondary | PrecedenceStep::Secondary => Self::Secondary,
        }
    }
}

/// The active payload of a message: a borrowed view into its `data`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelPayload<'a> {
    pub namespace: Namespace,
    pub value: &'a Value,
}

impl<'a> ChannelPayload<'a> {
    /// The payload's `type` discriminator.
    pub fn kind(&self) -> Option<&'a str> {
        self.value.get("type").and_then(Value::as_str)
    }

    pub fn is_kind(&self, kind: &str) -> bool {
        self.kind().is_some_and(|k| k.eq_ignore_ascii_case(kind))
    }

    /// Non-null field lookup; non-object payloads have no fields.
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.value.get(key).filter(|v| !v.is_null())
    }

    /// Non-empty string field.
    pub fn str_field(&self, key: &str) -> Option<&'a str> {
        self.get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Non-empty array field.
    pub fn non_empty_array(&self, key: &str) -> Option<&'a [Value]> {
        self.get(key)
            .and_then(Value::as_array)
            .filter(|items| !items.is_empty())
            .map(Vec::as_slice)
    }

    /// True when the payload carries anything besides plain text.
    ///
    /// A bare string, or an object holding only `text` and `type: "text"`,
    /// is plain.
    pub fn is_rich(&self) -> bool {
        match self.value {
            Value::Null | Value::String(_) => false,
            Value::Object(map) => !map.iter().all(|(key, value)| match key.as_str() {
                "text" => true,
                "type" => value.as_str() == Some("text"),
                _ => false,
            }),
            Value::Bool(_) | Value::Number(_) | Value::Array(_) => true,
        }
    }
}

/// Pick the active payload namespace of `message`.
///
/// Walks the configured precedence, skipping steps whose gate is closed, and
/// returns the first namespace present in `data`. Missing or malformed
/// `data` resolves to `None`.
pub fn resolve_payload<'a>(
    message: &'a Message,
    config: &ChannelsConfig,
) -> Option<ChannelPayload<'a>> {
    let resolved = config
        .effective_precedence()
        .iter()
        .copied()
        .filter(|step| config.gate_open(*step))
        .find_map(|step| {
            let namespace = Namespace::from(step);
            message
                .data_field(namespace.key(&config.namespaces))
                .map(|value| ChannelPayload { namespace, value })
        });

    let winner = resolved.map_or("none", |p| p.namespace.as_str());
    trace!(message_id = %message.id, namespace = winner, "resolved channel payload");

    #[cfg(feature = "metrics")]
    counter!(ch_metrics::RESOLUTIONS_TOTAL, labels::NAMESPACE => winner).increment(1);

    resolved
}
