/// Config schema types (channels, collation, sanitization, renderers).
///
/// Field names are snake_case; the camelCase names hosts use in their
/// configuration snapshots are accepted as aliases.
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvoConfig {
    pub channels: ChannelsConfig,
    pub collation: CollationConfig,
    pub sanitization: SanitizationConfig,
    pub renderers: RenderersConfig,
}

/// One step of the channel precedence walk. Each step carries its own gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrecedenceStep {
    /// Default-preview namespace, gated on `enable_default_preview`.
    DefaultPreview,
    /// Secondary namespace, gated on `strict_channel_sync` and
    /// `sync_with_secondary_channel`.
    SyncedSecondary,
    /// Primary namespace, ungated.
    Primary,
    /// Secondary namespace as last-resort fallback, ungated.
    Secondary,
}

impl PrecedenceStep {
    pub const DEFAULT_ORDER: &'static [Self] = &[
        Self::DefaultPreview,
        Self::SyncedSecondary,
        Self::Primary,
        Self::Secondary,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::DefaultPreview => "default_preview",
            Self::SyncedSecondary => "synced_secondary",
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        }
    }
}

/// Channel namespace resolution settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelsConfig {
    /// Prefer the default-preview namespace when present. Defaults to false.
    #[serde(alias = "enableDefaultPreview")]
    pub enable_default_preview: bool,
    /// Together with `sync_with_secondary_channel`, prefer the secondary
    /// namespace over the primary one. Defaults to false.
    #[serde(alias = "strictChannelSync")]
    pub strict_channel_sync: bool,
    #[serde(alias = "syncWithSecondaryChannel")]
    pub sync_with_secondary_channel: bool,
    /// Order in which namespaces are tried. Empty means the default order.
    pub precedence: Vec<PrecedenceStep>,
    /// Keys under `data` holding each namespace.
    pub namespaces: NamespaceKeys,
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        Self {
            enable_default_preview: false,
            strict_channel_sync: false,
            sync_with_secondary_channel: false,
            precedence: PrecedenceStep::DEFAULT_ORDER.to_vec(),
            namespaces: NamespaceKeys::default(),
        }
    }
}

impl ChannelsConfig {
    /// The precedence walk actually used; an empty list means the default.
    pub fn effective_precedence(&self) -> &[PrecedenceStep] {
        if self.precedence.is_empty() {
            PrecedenceStep::DEFAULT_ORDER
        } else {
            &self.precedence
        }
    }

    /// Whether the gate guarding `step` is open under these flags.
    pub fn gate_open(&self, step: PrecedenceStep) -> bool {
        match step {
            PrecedenceStep::DefaultPreview => self.enable_default_preview,
            PrecedenceStep::SyncedSecondary => {
                self.strict_channel_sync && self.sync_with_secondary_channel
            },
            PrecedenceStep::Primary | PrecedenceStep::Secondary => true,
        }
    }
}

/// Keys under a message's `data` for each channel namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamespaceKeys {
    pub primary: String,
    #[serde(alias = "defaultPreview")]
    pub default_preview: String,
    pub secondary: String,
}

impl Default for NamespaceKeys {
    fn default() -> Self {
        Self {
            primary: "widget".into(),
            default_preview: "defaultPreview".into(),
            secondary: "legacy".into(),
        }
    }
}

/// Stream collation settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollationConfig {
    /// Merge consecutive plain bot-text messages. Defaults to false.
    #[serde(alias = "collateStreamedOutputs")]
    pub collate_streamed_outputs: bool,
}

/// HTML sanitization settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizationConfig {
    /// Defaults to true.
    pub enabled: bool,
    /// Replaces (does not extend) the built-in allow-list when set.
    #[serde(alias = "allowedTags", skip_serializing_if = "Option::is_none")]
    pub allowed_tags: Option<BTreeSet<String>>,
}

impl Default for SanitizationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_tags: None,
        }
    }
}

/// Renderer rule settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderersConfig {
    /// Built-in rule names to skip during matching.
    pub disabled: Vec<String>,
}

impl RenderersConfig {
    pub fn is_disabled(&self, name: &str) -> bool {
        self.disabled.iter().any(|d| d == name)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_documented_policy() {
        let cfg = ConvoConfig::default();
        assert!(cfg.sanitization.enabled);
        assert!(cfg.sanitization.allowed_tags.is_none());
        assert!(!cfg.collation.collate_streamed_outputs);
        assert!(!cfg.channels.gate_open(PrecedenceStep::DefaultPreview));
        assert!(!cfg.channels.gate_open(PrecedenceStep::SyncedSecondary));
        assert!(cfg.channels.gate_open(PrecedenceStep::Primary));
        assert_eq!(
            cfg.channels.effective_precedence(),
            PrecedenceStep::DEFAULT_ORDER
        );
    }

    #[test]
    fn camel_case_snapshot_is_accepted() {
        let cfg: ConvoConfig = serde_json::from_str(
            r#"{
                "channels": {
                    "enableDefaultPreview": true,
                    "strictChannelSync": true,
                    "syncWithSecondaryChannel": true
                },
                "collation": { "collateStreamedOutputs": true },
                "sanitization": { "allowedTags": ["b", "i"] }
            }"#,
        )
        .unwrap();

        assert!(cfg.channels.enable_default_preview);
        assert!(cfg.channels.gate_open(PrecedenceStep::SyncedSecondary));
        assert!(cfg.collation.collate_streamed_outputs);
        assert!(cfg.sanitization.enabled);
        assert_eq!(cfg.sanitization.allowed_tags.unwrap().len(), 2);
    }

    #[test]
    fn synced_secondary_needs_both_flags() {
        let channels = ChannelsConfig {
            sync_with_secondary_channel: true,
            ..Default::default()
        };
        assert!(!channels.gate_open(PrecedenceStep::SyncedSecondary));
    }

    #[test]
    fn empty_precedence_falls_back_to_default_order() {
        let channels = ChannelsConfig {
            precedence: vec![],
            ..Default::default()
        };
        assert_eq!(channels.effective_precedence().len(), 4);
    }

    #[test]
    fn toml_round_trips_through_defaults() {
        let raw = toml::to_string_pretty(&ConvoConfig::default()).unwrap();
        let parsed: ConvoConfig = toml::from_str(&raw).unwrap();
        assert_eq!(parsed, ConvoConfig::default());
    }
}
