use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid {kind} name {name:?}: must match {pattern}")]
    InvalidName {
        kind: &'static str,
        name: String,
        pattern: &'static str,
    },

    #[error("unknown property: {property} is not declared on {collection}")]
    UnknownProperty {
        collection: String,
        property: String,
    },

    #[error("type mismatch: {property} is declared as {expected}, got {found}")]
    TypeMismatch {
        property: String,
        expected: String,
        found: &'static str,
    },

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
