//! Built-in renderer rules.

use std::cell::OnceCell;

use {
    convo_channels::{ChannelPayload, resolve_payload},
    convo_common::{Message, Source},
    convo_config::ChannelsConfig,
    serde::Serialize,
    serde_json::Value,
};

/// Built-in renderers, one per built-in rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Renderer {
    EngagementEvent,
    TypingIndicator,
    FileAttachment,
    Carousel,
    List,
    Form,
    Image,
    Video,
    Html,
    Buttons,
    QuickReplies,
    Text,
}

impl Renderer {
    /// Evaluation order of the built-in rules.
    pub const ALL: [Self; 12] = [
        Self::EngagementEvent,
        Self::TypingIndicator,
        Self::FileAttachment,
        Self::Carousel,
        Self::List,
        Self::Form,
        Self::Image,
        Self::Video,
        Self::Html,
        Self::Buttons,
        Self::QuickReplies,
        Self::Text,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::EngagementEvent => "engagement_event",
            Self::TypingIndicator => "typing_indicator",
            Self::FileAttachment => "file_attachment",
            Self::Carousel => "carousel",
            Self::List => "list",
            Self::Form => "form",
            Self::Image => "image",
            Self::Video => "video",
            Self::Html => "html",
            Self::Buttons => "buttons",
            Self::QuickReplies => "quick_replies",
            Self::Text => "text",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == name)
    }

    /// Rules that decorate rather than own the message.
    pub fn passthrough(self) -> bool {
        matches!(self, Self::FileAttachment | Self::Buttons | Self::QuickReplies)
    }

    pub(crate) fn matches(self, view: &MessageView<'_>) -> bool {
        let message = view.message;
        match self {
            Self::EngagementEvent => message.source == Source::Engagement,
            Self::TypingIndicator => message.data_field("typing").and_then(Value::as_bool) == Some(true),
            Self::FileAttachment => message.has_attachments(),
            Self::Carousel => view.payload_has("carousel", |p| p.non_empty_array("cards").is_some()),
            Self::List => view.payload_has("list", |p| p.non_empty_array("items").is_some()),
            Self::Form => view.payload_has("form", |p| p.non_empty_array("fields").is_some()),
            Self::Image => view.payload_has("image", |p| p.str_field("image_url").is_some()),
            Self::Video => view.payload_has("video", |p| p.str_field("video_url").is_some()),
            Self::Html => view.payload_has("html", |p| p.str_field("html").is_some()),
            Self::Buttons => view
                .payload()
                .is_some_and(|p| p.non_empty_array("buttons").is_some()),
            Self::QuickReplies => view
                .payload()
                .is_some_and(|p| p.non_empty_array("quick_replies").is_some()),
            Self::Text => true,
        }
    }
}

/// Built-in rule names in evaluation order.
pub fn builtin_names() -> Vec<&'static str> {
    Renderer::ALL.into_iter().map(Renderer::as_str).collect()
}

/// A message under classification; the payload is resolved at most once.
pub(crate) struct MessageView<'a> {
    message: &'a Message,
    channels: &'a ChannelsConfig,
    payload: OnceCell<Option<ChannelPayload<'a>>>,
}

impl<'a> MessageView<'a> {
    pub(crate) fn new(message: &'a Message, channels: &'a ChannelsConfig) -> Self {
        Self {
            message,
            channels,
            payload: OnceCell::new(),
        }
    }

    fn payload(&self) -> Option<ChannelPayload<'a>> {
        *self
            .payload
            .get_or_init(|| resolve_payload(self.message, self.channels))
    }

    /// Payload declares `kind` as its type, or satisfies `shape`.
    fn payload_has(&self, kind: &str, shape: impl Fn(&ChannelPayload<'a>) -> bool) -> bool {
        self.payload()
            .is_some_and(|p| p.is_kind(kind) || shape(&p))
    }
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest, serde_json::json};

    fn classify(data: Value) -> Vec<Renderer> {
        let message = Message::new("m-1", Source::Bot).with_text("hi").with_data(data);
        let channels = ChannelsConfig::default();
        let view = MessageView::new(&message, &channels);
        Renderer::ALL
            .into_iter()
            .filter(|r| r.matches(&view))
            .collect()
    }

    #[test]
    fn names_round_trip() {
        for renderer in Renderer::ALL {
            assert_eq!(Renderer::from_name(renderer.as_str()), Some(renderer));
        }
        assert_eq!(Renderer::from_name("VIP"), None);
        assert_eq!(builtin_names().first(), Some(&"engagement_event"));
        assert_eq!(builtin_names().last(), Some(&"text"));
    }

    #[rstest]
    #[case(json!({ "widget": { "type": "carousel" } }), Renderer::Carousel)]
    #[case(json!({ "widget": { "cards": [{ "title": "a" }] } }), Renderer::Carousel)]
    #[case(json!({ "widget": { "type": "LIST" } }), Renderer::List)]
    #[case(json!({ "widget": { "items": [1] } }), Renderer::List)]
    #[case(json!({ "widget": { "fields": [{ "name": "email" }] } }), Renderer::Form)]
    #[case(json!({ "widget": { "image_url": "https://x/y.png" } }), Renderer::Image)]
    #[case(json!({ "widget": { "type": "video" } }), Renderer::Video)]
    #[case(json!({ "legacy": { "html": "<b>x</b>" } }), Renderer::Html)]
    #[case(json!({ "widget": { "buttons": [{ "title": "A" }] } }), Renderer::Buttons)]
    #[case(json!({ "widget": { "quick_replies": ["yes"] } }), Renderer::QuickReplies)]
    #[case(json!({ "files": [{ "name": "a.pdf" }] }), Renderer::FileAttachment)]
    #[case(json!({ "typing": true }), Renderer::TypingIndicator)]
    fn payload_shapes(#[case] data: Value, #[case] expected: Renderer) {
        assert!(classify(data).contains(&expected));
    }

    #[rstest]
    #[case(json!({ "widget": { "cards": [] } }))]
    #[case(json!({ "widget": { "image_url": "" } }))]
    #[case(json!({ "typing": "yes" }))]
    #[case(json!({ "unknown": { "type": "carousel" } }))]
    fn empty_or_foreign_shapes_fall_to_text(#[case] data: Value) {
        assert_eq!(classify(data), vec![Renderer::Text]);
    }

    #[test]
    fn engagement_source_matches_regardless_of_data() {
        let message = Message::new("e-1", Source::Engagement);
        let channels = ChannelsConfig::default();
        let view = MessageView::new(&message, &channels);
        assert!(Renderer::EngagementEvent.matches(&view));
    }
}
