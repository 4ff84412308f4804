use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResourceError {
    #[error("Resource id must not be empty")]
    EmptyId,

    #[error("Resource pool already exists: {0}")]
    PoolExists(String),

    #[error("Resource pool not found: {0}")]
    PoolNotFound(String),
}
