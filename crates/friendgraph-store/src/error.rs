use friendgraph_types::UserId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Carries the first ID that could not be resolved.
    #[error("User not found")]
    NotFound(UserId),
}
