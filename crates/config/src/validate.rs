//! Configuration validation engine.
//!
//! Validates configuration documents against the known schema, detects
//! unknown/misspelled fields, and reports security and policy warnings.

use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
};

use serde_json::Value;

use crate::{
    env_subst::substitute_env,
    loader::parse_config_str,
    schema::{ConvoConfig, PrecedenceStep},
};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "syntax", "unknown-field", "type-error", "security",
    /// "semantic", "file-ref"
    pub category: &'static str,
    /// Dotted path, e.g. "channels.precedence"
    pub path: String,
    pub message: String,
}

/// Result of validating a configuration file.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

/// Tags the sanitizer removes together with their content. Allowing them
/// makes every sanitize call fail and fall back to the raw text.
const CONTENT_STRIPPED_TAGS: &[&str] = &["script", "style"];

/// Tags that embed foreign documents or plugins.
const EMBEDDING_TAGS: &[&str] = &["iframe", "object", "embed"];

// ── Schema tree for unknown-field detection ─────────────────────────────────

/// Expected shape of the configuration schema.
enum KnownKeys {
    /// A struct with fixed field names.
    Struct(HashMap<&'static str, KnownKeys>),
    /// Scalar or list value: stop recursion.
    Leaf,
}

/// Build the schema map mirroring every field in `schema.rs`, camelCase
/// aliases included.
fn build_schema_map() -> KnownKeys {
    use KnownKeys::{Leaf, Struct};

    let namespaces = Struct(HashMap::from([
        ("primary", Leaf),
        ("default_preview", Leaf),
        ("defaultPreview", Leaf),
        ("secondary", Leaf),
    ]));

    let channels = Struct(HashMap::from([
        ("enable_default_preview", Leaf),
        ("enableDefaultPreview", Leaf),
        ("strict_channel_sync", Leaf),
        ("strictChannelSync", Leaf),
        ("sync_with_secondary_channel", Leaf),
        ("syncWithSecondaryChannel", Leaf),
        ("precedence", Leaf),
        ("namespaces", namespaces),
    ]));

    let collation = Struct(HashMap::from([
        ("collate_streamed_outputs", Leaf),
        ("collateStreamedOutputs", Leaf),
    ]));

    let sanitization = Struct(HashMap::from([
        ("enabled", Leaf),
        ("allowed_tags", Leaf),
        ("allowedTags", Leaf),
    ]));

    let renderers = Struct(HashMap::from([("disabled", Leaf)]));

    Struct(HashMap::from([
        ("channels", channels),
        ("collation", collation),
        ("sanitization", sanitization),
        ("renderers", renderers),
    ]))
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_chars.len()]
}

fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    let mut best: Option<(&'a str, usize)> = None;
    for &candidate in candidates {
        let d = levenshtein(needle, candidate);
        if d > 0 && d <= max_distance && best.as_ref().is_none_or(|(_, bd)| d < *bd) {
            best = Some((candidate, d));
        }
    }
    best.map(|(s, _)| s)
}

/// Validate a config file. With no path, the standard locations are searched.
pub fn validate(path: Option<&Path>, known_renderers: &[&str]) -> ValidationResult {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => crate::loader::find_config_file(),
    };

    let Some(ref actual_path) = config_path else {
        return ValidationResult {
            diagnostics: vec![Diagnostic {
                severity: Severity::Info,
                category: "file-ref",
                path: String::new(),
                message: "no config file found; using defaults".into(),
            }],
            config_path: None,
        };
    };

    match std::fs::read_to_string(actual_path) {
        Ok(content) => {
            let ext = actual_path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("toml");
            let mut result = validate_str(&substitute_env(&content), ext, known_renderers);
            result.config_path = Some(actual_path.clone());
            result
        },
        Err(e) => ValidationResult {
            diagnostics: vec![Diagnostic {
                severity: Severity::Error,
                category: "syntax",
                path: String::new(),
                message: format!("failed to read config file: {e}"),
            }],
            config_path: Some(actual_path.clone()),
        },
    }
}

/// Validate a TOML document.
pub fn validate_toml_str(toml_str: &str, known_renderers: &[&str]) -> ValidationResult {
    validate_str(toml_str, "toml", known_renderers)
}

/// Validate a document in any supported format.
pub fn validate_str(raw: &str, ext: &str, known_renderers: &[&str]) -> ValidationResult {
    let mut diagnostics = Vec::new();

    // 1. Syntax: parse into a generic tree
    let tree = match parse_tree(raw, ext) {
        Ok(v) => v,
        Err(message) => {
            diagnostics.push(Diagnostic {
                severity: Severity::Error,
                category: "syntax",
                path: String::new(),
                message,
            });
            return ValidationResult {
                diagnostics,
                config_path: None,
            };
        },
    };

    // 2. Unknown fields: walk the tree against KnownKeys
    check_unknown_fields(&tree, &build_schema_map(), "", &mut diagnostics);

    // 3. Type check + semantic warnings on the typed config
    match parse_config_str(raw, ext) {
        Ok(config) => {
            check_security(&config, &mut diagnostics);
            check_semantics(&config, known_renderers, &mut diagnostics);
        },
        Err(e) => diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "type-error",
            path: String::new(),
            message: format!("type error: {e}"),
        }),
    }

    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

fn parse_tree(raw: &str, ext: &str) -> Result<Value, String> {
    match ext {
        "toml" => {
            let v: toml::Value = toml::from_str(raw).map_err(|e| format!("TOML syntax error: {e}"))?;
            serde_json::to_value(v).map_err(|e| format!("TOML syntax error: {e}"))
        },
        "yaml" | "yml" => {
            serde_yaml::from_str(raw).map_err(|e| format!("YAML syntax error: {e}"))
        },
        "json" => serde_json::from_str(raw).map_err(|e| format!("JSON syntax error: {e}")),
        _ => Err(format!("unsupported config format: .{ext}")),
    }
}

fn check_unknown_fields(
    value: &Value,
    schema: &KnownKeys,
    prefix: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let (Value::Object(table), KnownKeys::Struct(fields)) = (value, schema) else {
        // Leaf or type mismatch: type errors are caught later
        return;
    };

    let known_keys: Vec<&str> = fields.keys().copied().collect();
    for (key, child_value) in table {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        if let Some(child_schema) = fields.get(key.as_str()) {
            check_unknown_fields(child_value, child_schema, &path, diagnostics);
            continue;
        }

        let level = if prefix.is_empty() {
            " at top level"
        } else {
            ""
        };
        let message = match suggest(key, &known_keys, 3) {
            Some(s) => format!("unknown field{level} (did you mean \"{s}\"?)"),
            None => format!("unknown field{level}"),
        };
        diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "unknown-field",
            path,
            message,
        });
    }
}

fn check_security(config: &ConvoConfig, diagnostics: &mut Vec<Diagnostic>) {
    let sanitization = &config.sanitization;
    if !sanitization.enabled {
        diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            category: "security",
            path: "sanitization.enabled".into(),
            message: "sanitization is disabled; message markup reaches the renderer unchanged"
                .into(),
        });
    }

    let Some(tags) = &sanitization.allowed_tags else {
        return;
    };

    if tags.is_empty() {
        diagnostics.push(Diagnostic {
            severity: Severity::Info,
            category: "security",
            path: "sanitization.allowed_tags".into(),
            message: "empty allow-list; all markup is stripped to text".into(),
        });
    }

    for tag in tags {
        let lower = tag.to_ascii_lowercase();
        if CONTENT_STRIPPED_TAGS.contains(&lower.as_str()) {
            diagnostics.push(Diagnostic {
                severity: Severity::Warning,
                category: "security",
                path: "sanitization.allowed_tags".into(),
                message: format!(
                    "<{lower}> is always removed with its content; this entry is ignored"
                ),
            });
        } else if EMBEDDING_TAGS.contains(&lower.as_str()) {
            diagnostics.push(Diagnostic {
                severity: Severity::Warning,
                category: "security",
                path: "sanitization.allowed_tags".into(),
                message: format!("<{lower}> embeds foreign content"),
            });
        }
    }
}

fn check_semantics(
    config: &ConvoConfig,
    known_renderers: &[&str],
    diagnostics: &mut Vec<Diagnostic>,
) {
    let channels = &config.channels;

    let mut seen: HashSet<PrecedenceStep> = HashSet::new();
    for step in &channels.precedence {
        if !seen.insert(*step) {
            diagnostics.push(Diagnostic {
                severity: Severity::Error,
                category: "semantic",
                path: "channels.precedence".into(),
                message: format!("step \"{}\" is listed more than once", step.as_str()),
            });
        }
    }

    if channels.sync_with_secondary_channel && !channels.strict_channel_sync {
        diagnostics.push(Diagnostic {
            severity: Severity::Info,
            category: "semantic",
            path: "channels.sync_with_secondary_channel".into(),
            message: "has no effect unless strict_channel_sync is also set".into(),
        });
    }

    let ns = &channels.namespaces;
    let keys = [
        ("primary", &ns.primary),
        ("default_preview", &ns.default_preview),
        ("secondary", &ns.secondary),
    ];
    for (name, key) in keys {
        if key.trim().is_empty() {
            diagnostics.push(Diagnostic {
                severity: Severity::Error,
                category: "semantic",
                path: format!("channels.namespaces.{name}"),
                message: "namespace key must not be empty".into(),
            });
        }
    }
    for (i, (name, key)) in keys.iter().enumerate() {
        if let Some((other, _)) = keys[..i].iter().find(|(_, k)| k == key) {
            diagnostics.push(Diagnostic {
                severity: Severity::Error,
                category: "semantic",
                path: format!("channels.namespaces.{name}"),
                message: format!("namespace key \"{key}\" is also used by {other}"),
            });
        }
    }

    for name in &config.renderers.disabled {
        if known_renderers.contains(&name.as_str()) {
            continue;
        }
        let message = match suggest(name, known_renderers, 3) {
            Some(s) => format!("unknown renderer \"{name}\" (did you mean \"{s}\"?)"),
            None => format!("unknown renderer \"{name}\""),
        };
        diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            category: "semantic",
            path: "renderers.disabled".into(),
            message,
        });
    }

    if config.renderers.is_disabled("text") {
        diagnostics.push(Diagnostic {
            severity: Severity::Info,
            category: "semantic",
            path: "renderers.disabled".into(),
            message: "plain-text fallback disabled; unmatched messages render nothing".into(),
        });
    }
}
