//! Errors raised while materializing a graph from tabular sources (§6).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("data file not found: {0}")]
    InputNotFound(String),

    #[error("malformed row in '{path}': {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("entity '{entity}' is missing required field '{field}'")]
    MissingField { entity: String, field: String },

    #[error("id_template field '{0}' not present in row")]
    MissingTemplateField(String),

    #[error("invalid value '{value}' for {field_type} field '{field}'")]
    TypeConversion { field: String, field_type: String, value: String },

    #[error(transparent)]
    Condition(#[from] lpg_condition::ConditionError),

    #[error(transparent)]
    Store(#[from] lpg_core::StoreError),
}

pub type BuildResult<T> = Result<T, BuildError>;
