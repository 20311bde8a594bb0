//! `render` and `sanitize` commands.

use std::{
    collections::BTreeSet,
    io::Read,
    path::Path,
};

use {
    anyhow::{Context, Result},
    convo_common::Message,
    convo_config::{ConvoConfig, LoadedConfig},
    convo_pipeline::Pipeline,
    convo_sanitize::Sanitizer,
    tracing::info,
};

/// Explicit `--config`, otherwise discovery with defaults as fallback.
pub fn load_config(path: Option<&Path>) -> Result<ConvoConfig> {
    load_with_source(path).map(|loaded| loaded.config)
}

pub fn load_with_source(path: Option<&Path>) -> Result<LoadedConfig> {
    match path {
        Some(path) => {
            let config = convo_config::load_config(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?;
            Ok(LoadedConfig {
                config,
                source: Some(path.to_path_buf()),
            })
        },
        None => Ok(convo_config::discover()),
    }
}

/// Read `-` as stdin; anything else through `fallback`.
fn read_arg(arg: &str, fallback: impl FnOnce(&str) -> Result<String>) -> Result<String> {
    if arg == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        Ok(buf)
    } else {
        fallback(arg)
    }
}

pub fn parse_messages(raw: &str) -> Result<Vec<Message>> {
    serde_json::from_str(raw).context("expected a JSON array of messages")
}

pub fn render(config_path: Option<&Path>, input: &str, compact: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let raw = read_arg(input, |path| {
        std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))
    })?;
    let messages = parse_messages(&raw)?;

    let pipeline = Pipeline::new(config, Vec::new())?;
    let plans = pipeline.process(&messages);
    info!(messages = messages.len(), plans = plans.len(), "rendered");

    let out = if compact {
        serde_json::to_string(&plans)?
    } else {
        serde_json::to_string_pretty(&plans)?
    };
    println!("{out}");
    Ok(())
}

pub fn sanitize(config_path: Option<&Path>, html: &str, allow: &[String]) -> Result<()> {
    let config = load_config(config_path)?;
    let raw = read_arg(html, |literal| Ok(literal.to_owned()))?;

    let sanitizer = Sanitizer::new(&config.sanitization);
    let allow: BTreeSet<String> = allow.iter().cloned().collect();
    let override_tags = (!allow.is_empty()).then_some(&allow);

    println!("{}", sanitizer.sanitize_with(&raw, override_tags));
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, std::io::Write};

    #[test]
    fn parses_message_log() {
        let messages = parse_messages(
            r#"[{"id":"1","source":"bot","text":"hi"},{"traceId":"2","source":"user"}]"#,
        )
        .unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].id, "2");
    }

    #[test]
    fn rejects_non_array_input() {
        assert!(parse_messages(r#"{"id":"1"}"#).is_err());
    }

    #[test]
    fn explicit_config_path_is_loaded() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[collation]\ncollate_streamed_outputs = true").unwrap();
        let config = load_config(Some(file.path())).unwrap();
        assert!(config.collation.collate_streamed_outputs);
    }

    #[test]
    fn explicit_config_path_is_reported_as_source() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[sanitization]\nenabled = false").unwrap();
        let loaded = load_with_source(Some(file.path())).unwrap();
        assert_eq!(loaded.source.as_deref(), Some(file.path()));
        assert!(!loaded.config.sanitization.enabled);
    }

    #[test]
    fn missing_config_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("nope.toml"));
    }

    #[test]
    fn literal_argument_is_used_verbatim() {
        let got = read_arg("<b>x</b>", |s| Ok(s.to_owned())).unwrap();
        assert_eq!(got, "<b>x</b>");
    }
}
