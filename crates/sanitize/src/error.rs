/// Crate-wide result type for sanitizer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures of the HTML cleaning backend. Never surfaced to callers of
/// `sanitize`; they are logged and the original text is returned.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The cleaning backend panicked.
    #[error("html cleaner panicked: {message}")]
    CleanerPanicked { message: String },

    /// Backend-specific failure.
    #[error("html cleaner failed: {message}")]
    Backend { message: String },
}

impl Error {
    #[must_use]
    pub fn backend(message: impl std::fmt::Display) -> Self {
        Self::Backend {
            message: message.to_string(),
        }
    }
}
