//! Errors raised while applying transformation rules to a graph (§4.5, §9).

use thiserror::Error;

/// Failure from evaluating or applying a single rule's body; always wrapped
/// in a [`RuleEngineError::RuleFailed`] with the offending rule's id.
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error(transparent)]
    Condition(#[from] lpg_condition::ConditionError),

    #[error(transparent)]
    Expr(#[from] lpg_expr_lang::ExprError),

    #[error(transparent)]
    Store(#[from] lpg_core::StoreError),

    #[error("node id template references unresolvable source '{0}'")]
    UnresolvedSource(String),
}

#[derive(Debug, Error)]
pub enum RuleEngineError {
    #[error("rule '{rule_id}' failed: {source}")]
    RuleFailed {
        rule_id: String,
        #[source]
        source: ApplyError,
    },

    #[error("run cancelled before completion")]
    CancelledError,
}

pub type RuleEngineResult<T> = Result<T, RuleEngineError>;
