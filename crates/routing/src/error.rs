#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("duplicate match rule name: {name}")]
    DuplicateRule { name: String },
}

pub type Result<T> = std::result::Result<T, Error>;
