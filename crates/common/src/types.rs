//! Chat message model shared by the resolver, the match engine and the collator.
//!
//! Messages are immutable once received: every stage borrows them and derives
//! new values instead of mutating.

use std::borrow::Cow;

use {
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    serde_json::Value,
};

/// Keys under `data` that carry file or media attachments.
pub const ATTACHMENT_KEYS: &[&str] = &["files", "attachments", "media"];

/// Key under `data` that carries plugin-specific data.
pub const PLUGIN_DATA_KEY: &str = "plugins";

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Bot,
    User,
    Agent,
    /// Engagement events (agent joined, conversation transferred, ...).
    Engagement,
}

/// Message text: a single string or an ordered sequence of fragments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageText {
    Single(String),
    Parts(Vec<String>),
}

impl MessageText {
    /// The text as one string, fragments joined by newlines.
    pub fn joined(&self) -> Cow<'_, str> {
        match self {
            Self::Single(text) => Cow::Borrowed(text.as_str()),
            Self::Parts(parts) => Cow::Owned(parts.join("\n")),
        }
    }

    /// Whitespace-only text counts as empty.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Single(text) => text.trim().is_empty(),
            Self::Parts(parts) => parts.iter().all(|p| p.trim().is_empty()),
        }
    }
}

impl From<&str> for MessageText {
    fn from(text: &str) -> Self {
        Self::Single(text.to_owned())
    }
}

impl From<String> for MessageText {
    fn from(text: String) -> Self {
        Self::Single(text)
    }
}

/// A chat message as delivered by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(alias = "traceId", alias = "trace_id")]
    pub id: String,
    pub source: Source,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<MessageText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Opaque nested payload. Channel namespaces, attachments and plugin
    /// data all live here.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
}

impl Message {
    pub fn new(id: impl Into<String>, source: Source) -> Self {
        Self {
            id: id.into(),
            source,
            text: None,
            timestamp: None,
            data: Value::Null,
        }
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<MessageText>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Joined text, if any.
    pub fn text_str(&self) -> Option<Cow<'_, str>> {
        self.text.as_ref().map(MessageText::joined)
    }

    /// True when the message has text that is not blank.
    pub fn has_text(&self) -> bool {
        self.text.as_ref().is_some_and(|t| !t.is_blank())
    }

    /// Look up a non-null field of `data`. Non-object data has no fields.
    pub fn data_field(&self, key: &str) -> Option<&Value> {
        self.data.get(key).filter(|v| !v.is_null())
    }

    /// True when any attachment key holds a non-empty value.
    pub fn has_attachments(&self) -> bool {
        ATTACHMENT_KEYS
            .iter()
            .filter_map(|key| self.data_field(key))
            .any(is_non_empty)
    }

    pub fn has_plugin_data(&self) -> bool {
        self.data_field(PLUGIN_DATA_KEY).is_some()
    }
}

fn is_non_empty(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(_) => true,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// A display entry: either a message passed through as-is, or a composite of
/// several consecutive messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollatedMessage {
    #[serde(flatten)]
    pub message: Message,
    /// Originals in arrival order. Only set on composites.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collated_from: Option<Vec<Message>>,
}

impl CollatedMessage {
    pub fn is_collated(&self) -> bool {
        self.collated_from.is_some()
    }

    /// The raw messages this entry stands for. A pass-through entry stands
    /// for itself.
    pub fn originals(&self) -> &[Message] {
        match &self.collated_from {
            Some(originals) => originals,
            None => std::slice::from_ref(&self.message),
        }
    }
}

impl From<Message> for CollatedMessage {
    fn from(message: Message) -> Self {
        Self {
            message,
            collated_from: None,
        }
    }
}
