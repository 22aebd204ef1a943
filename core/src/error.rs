use thiserror::Error;

/// Errors produced by the indexing and retrieval engine.
///
/// Document lookups for a missing id are not errors; they return `Ok(None)`.
#[derive(Debug, Error)]
pub enum Error {
    /// The persistence layer is unreachable or rejected an operation.
    /// Fatal for the in-flight operation; callers decide retry policy.
    #[error("storage error: {0}")]
    Store(#[from] sled::Error),

    /// A stored record could not be decoded.
    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),

    /// The external morphological analyzer failed. Callers may treat this
    /// as an empty token stream and fall back to n-gram retrieval.
    #[error("tokenizer error: {0}")]
    Tokenize(String),

    /// Every query term was absent from the index, so no ranking vector
    /// can be formed. Distinct from an empty result set.
    #[error("degenerate query: no query term appears in the index")]
    DegenerateQuery,
}

pub type Result<T> = std::result::Result<T, Error>;
