//! Channel namespace resolution.
//!
//! One logical message may be delivered pre-rendered for several targets
//! (preview tooling, the live widget, a legacy integration). The resolver
//! picks exactly one of those encodings to inspect.
//!
//! Precedence (default order, each step gated by config):
//! 1. Default-preview namespace (`enable_default_preview`)
//! 2. Secondary namespace (`strict_channel_sync` + `sync_with_secondary_channel`)
//! 3. Primary namespace
//! 4. Secondary namespace (fallback)

pub mod resolve;

pub use resolve::{ChannelPayload, Namespace, resolve_payload};
