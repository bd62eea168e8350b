use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConditionError {
    #[error("invalid join condition document: {0}")]
    InvalidDocument(String),

    #[error(transparent)]
    Expr(#[from] lpg_expr_lang::ExprError),
}

pub type ConditionResult<T> = Result<T, ConditionError>;
