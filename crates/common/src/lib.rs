//! Shared message types used across all convo crates.

pub mod types;

pub use types::{CollatedMessage, Message, MessageText, Source};
