//! Classify messages into renderer identifiers.
//!
//! Rule cascade (first non-passthrough match wins):
//! 1. Plugin rules, in the order the host supplied them
//! 2. Built-in rules, in fixed order (see [`Renderer::ALL`])
//! 3. `text` fallback, unless disabled in `renderers.disabled`
//!
//! A passthrough rule records its identifier and lets the scan continue, so
//! one message can collect several identifiers (e.g. `buttons` then `text`).

pub mod builtins;
pub mod engine;
pub mod error;
pub mod rule;

pub use {
    builtins::{Renderer, builtin_names},
    engine::{RuleSet, match_message},
    error::{Error, Result},
    rule::{MatchRule, Predicate, RuleOptions, RuleRef},
};
