//! Configuration snapshot, loading, env substitution, and validation.
//!
//! Config files: `convo.toml`, `convo.yaml`, or `convo.json`
//! Searched in `./` then `~/.config/convo/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{
        LoadedConfig, config_dir, discover, discover_and_load, find_config_file, load_config,
        parse_config_str,
    },
    schema::{
        ChannelsConfig, CollationConfig, ConvoConfig, NamespaceKeys, PrecedenceStep,
        RenderersConfig, SanitizationConfig,
    },
    validate::{Diagnostic, Severity, ValidationResult},
};
