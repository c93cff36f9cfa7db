use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Similarity {0} out of range (max 100)")]
    SimilarityOutOfRange(u8),

    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),

    #[error("Unknown query type: {0}")]
    UnknownQueryType(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
