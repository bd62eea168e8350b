//! Errors raised while parsing or evaluating an expression.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExprError {
    #[error("parse error: {0}")]
    ParseError(String),

    #[error("evaluation error: {0}")]
    EvalError(String),
}

pub type ExprResult<T> = Result<T, ExprError>;
