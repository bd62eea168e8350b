//! Errors raised while loading or validating schema and transformations
//! documents (§4.2, §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("schema error: {0}")]
    SchemaError(String),

    #[error("rule document error: {0}")]
    RuleDocumentError(String),

    #[error("duplicate rule id '{0}'")]
    DuplicateRule(String),

    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in '{path}': {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Condition(#[from] lpg_condition::ConditionError),
}

pub type MetadataResult<T> = Result<T, MetadataError>;
