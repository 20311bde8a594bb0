#![allow(clippy::unwrap_used, clippy::expect_used)]
use {
    convo_channels::Namespace,
    convo_common::{Message, MessageText, Source},
    convo_config::{ConvoConfig, parse_config_str},
    convo_pipeline::{Pipeline, RenderPlan},
    convo_routing::MatchRule,
    rstest::rstest,
    serde_json::{Value, json},
};

fn names(plan: &RenderPlan) -> Vec<&str> {
    plan.renderers.iter().map(|r| r.name()).collect()
}

fn streaming_config() -> ConvoConfig {
    let mut config = ConvoConfig::default();
    config.collation.collate_streamed_outputs = true;
    config
}

#[test]
fn streamed_fragments_render_as_one_text_entry() {
    let pipeline = Pipeline::new(streaming_config(), Vec::new()).unwrap();
    let messages = vec![
        Message::new("1", Source::Bot).with_text("Hi"),
        Message::new("2", Source::Bot).with_text("there"),
        Message::new("3", Source::Bot).with_text("friend"),
    ];

    let plans = pipeline.process(&messages);
    assert_eq!(plans.len(), 1);
    assert_eq!(names(&plans[0]), ["text"]);
    assert_eq!(plans[0].html.as_deref(), Some("Hi\nthere\nfriend"));
    assert_eq!(plans[0].message.originals().len(), 3);
}

#[test]
fn conversation_with_rich_and_user_messages() {
    let pipeline = Pipeline::new(streaming_config(), Vec::new()).unwrap();
    let messages = vec![
        Message::new("1", Source::User).with_text("show me shoes"),
        Message::new("2", Source::Bot).with_text("Here you go"),
        Message::new("3", Source::Bot)
            .with_text("Shoes")
            .with_data(json!({ "widget": { "type": "carousel", "cards": [{ "title": "Runner" }] } })),
        Message::new("4", Source::Bot)
            .with_text("Anything else?")
            .with_data(json!({ "widget": { "text": "Anything else?", "quick_replies": ["No"] } })),
    ];

    let plans = pipeline.process(&messages);
    let rendered: Vec<Vec<&str>> = plans.iter().map(names).collect();
    assert_eq!(rendered, vec![
        vec!["text"],
        vec!["text"],
        vec!["carousel"],
        vec!["quick_replies", "text"],
    ]);
    assert_eq!(plans[2].namespace, Some(Namespace::Primary));
    assert!(plans.iter().all(|p| !p.message.is_collated()));
}

#[test]
fn vip_plugin_overrides_builtins() {
    let vip = MatchRule::when("VIP", |m, _| {
        m.data_field("vip").and_then(Value::as_bool) == Some(true)
    });
    let pipeline = Pipeline::new(ConvoConfig::default(), vec![vip]).unwrap();
    let messages = vec![
        Message::new("1", Source::Bot)
            .with_text("Welcome back")
            .with_data(json!({ "vip": true, "widget": { "type": "image" } })),
    ];

    let plans = pipeline.process(&messages);
    assert_eq!(names(&plans[0]), ["VIP"]);
}

#[test]
fn failing_plugin_does_not_break_classification() {
    let broken = MatchRule::new("broken", |_, _| anyhow::bail!("lookup failed"));
    let pipeline = Pipeline::new(ConvoConfig::default(), vec![broken]).unwrap();
    let plans = pipeline.process(&[Message::new("1", Source::Bot).with_text("hi")]);
    assert_eq!(names(&plans[0]), ["text"]);
}

#[rstest]
#[case("<script>alert(1)</script>Hello", "alert(1)")]
#[case("<img src=x onerror=alert(1)>", "onerror")]
#[case(r#"<a href="javascript:steal()">x</a>"#, "javascript:")]
fn hostile_text_is_sanitized_in_plan(#[case] raw: &str, #[case] forbidden: &str) {
    let pipeline = Pipeline::new(ConvoConfig::default(), Vec::new()).unwrap();
    let plans = pipeline.process(&[Message::new("1", Source::Bot).with_text(raw)]);
    let html = plans[0].html.as_deref().unwrap();
    assert!(!html.contains(forbidden), "{raw} -> {html}");
}

#[rstest]
#[case(&["p", "style"])]
#[case(&["p", "script"])]
fn allow_list_naming_stripped_tags_still_sanitizes(#[case] allowed: &[&str]) {
    let mut config = ConvoConfig::default();
    config.sanitization.allowed_tags = Some(allowed.iter().map(|t| (*t).to_owned()).collect());
    let pipeline = Pipeline::new(config, Vec::new()).unwrap();
    let raw = r#"<p onclick="steal()">hi</p><script>alert(2)</script>"#;
    let plans = pipeline.process(&[Message::new("1", Source::Bot).with_text(raw)]);
    assert_eq!(plans[0].html.as_deref(), Some("<p>hi</p>"));
}

#[test]
fn config_file_drives_every_stage() {
    let raw = r#"
[channels]
enable_default_preview = true

[collation]
collate_streamed_outputs = true

[sanitization]
allowed_tags = ["b"]

[renderers]
disabled = ["image"]
"#;
    let config = parse_config_str(raw, "toml").unwrap();
    let pipeline = Pipeline::new(config, Vec::new()).unwrap();

    let messages = vec![
        Message::new("1", Source::Bot).with_text("<b>bold</b> <i>plain</i>"),
        Message::new("2", Source::Bot)
            .with_text("preview")
            .with_data(json!({
                "defaultPreview": { "type": "carousel", "cards": [{}] },
                "widget": { "type": "image" }
            })),
        Message::new("3", Source::Bot)
            .with_text("img")
            .with_data(json!({ "widget": { "type": "image" } })),
    ];

    let plans = pipeline.process(&messages);
    assert_eq!(plans.len(), 3);
    assert_eq!(plans[0].html.as_deref(), Some("<b>bold</b> plain"));
    assert_eq!(plans[1].namespace, Some(Namespace::DefaultPreview));
    assert_eq!(names(&plans[1]), ["carousel"]);
    assert_eq!(names(&plans[2]), ["text"]);
}

#[test]
fn disabled_sanitization_passes_text_through() {
    let mut config = ConvoConfig::default();
    config.sanitization.enabled = false;
    let pipeline = Pipeline::new(config, Vec::new()).unwrap();
    let raw = "<script>x()</script>";
    let plans = pipeline.process(&[Message::new("1", Source::Bot).with_text(raw)]);
    assert_eq!(plans[0].html.as_deref(), Some(raw));
}

#[test]
fn processing_is_repeatable() {
    let pipeline = Pipeline::new(streaming_config(), Vec::new()).unwrap();
    let messages: Vec<Message> = serde_json::from_value(json!([
        { "traceId": "a", "source": "bot", "text": ["one", "two"] },
        { "id": "b", "source": "bot", "text": "three" },
        { "id": "c", "source": "engagement", "data": { "event": "rated" } }
    ]))
    .unwrap();

    let first = pipeline.process(&messages);
    assert_eq!(first, pipeline.process(&messages));
    assert_eq!(first.len(), 2);
    assert_eq!(
        first[0].message.message.text,
        Some(MessageText::Single("one\ntwo\nthree".into()))
    );
    assert_eq!(names(&first[1]), ["engagement_event"]);
}

#[test]
fn render_plan_serializes_for_renderers() {
    let pipeline = Pipeline::new(ConvoConfig::default(), Vec::new()).unwrap();
    let plans = pipeline.process(&[Message::new("1", Source::Bot)
        .with_text("hi")
        .with_data(json!({ "widget": { "buttons": [{ "title": "A" }] } }))]);

    let value = serde_json::to_value(&plans[0]).unwrap();
    assert_eq!(value["renderers"], json!(["buttons", "text"]));
    assert_eq!(value["namespace"], json!("primary"));
    assert_eq!(value["message"]["id"], json!("1"));
    assert_eq!(value["html"], json!("hi"));
}
