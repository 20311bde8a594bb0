//! Metric names for convo.
//!
//! Library crates record through the `metrics` facade behind their own
//! `metrics` feature. Nothing is exported until the host installs a recorder.
//!
//! ```rust,ignore
//! use convo_metrics::{counter, routing};
//!
//! counter!(routing::RULE_FAILURES_TOTAL, "rule" => "vip").increment(1);
//! ```

mod definitions;

pub use definitions::*;

// Re-export metrics macros for convenience
pub use metrics::{counter, gauge, histogram};
