use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{env_subst::substitute_env, schema::ConvoConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["convo.toml", "convo.yaml", "convo.yml", "convo.json"];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<ConvoConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");
    parse_config_str(&raw, ext)
}

/// Effective configuration and the file it was read from.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub config: ConvoConfig,
    /// `None` when defaults are in effect.
    pub source: Option<PathBuf>,
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./convo.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/convo/convo.{toml,yaml,yml,json}` (user-global)
///
/// Falls back to `ConvoConfig::default()` when nothing is found or the file
/// does not parse.
pub fn discover() -> LoadedConfig {
    load_or_default(find_config_file())
}

/// [`discover`] without the source path.
pub fn discover_and_load() -> ConvoConfig {
    discover().config
}

fn load_or_default(path: Option<PathBuf>) -> LoadedConfig {
    let Some(path) = path else {
        debug!("no config file found, using defaults");
        return LoadedConfig::default();
    };
    match load_config(&path) {
        Ok(config) => {
            debug!(path = %path.display(), "loaded config");
            LoadedConfig {
                config,
                source: Some(path),
            }
        },
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            LoadedConfig::default()
        },
    }
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    // Project-local
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    // User-global: ~/.config/convo/
    if let Some(dir) = config_dir() {
        for name in CONFIG_FILENAMES {
            let p = dir.join(name);
            if p.exists() {
                return Some(p);
            }
        }
    }

    None
}

/// Returns the user-global config directory (`~/.config/convo/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "convo").map(|d| d.config_dir().to_path_buf())
}

/// Parse a config document given its format extension (`toml`, `yaml`,
/// `yml` or `json`).
pub fn parse_config_str(raw: &str, ext: &str) -> anyhow::Result<ConvoConfig> {
    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}
