//! Errors raised by the graph store.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("node '{0}' already exists")]
    DuplicateNode(String),

    #[error("node '{0}' does not exist")]
    MissingNode(String),

    #[error("field '{field}' is missing on node '{node}'")]
    MissingField { node: String, field: String },
}

pub type StoreResult<T> = Result<T, StoreError>;
