#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid match rules: {0}")]
    Rules(#[from] convo_routing::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
