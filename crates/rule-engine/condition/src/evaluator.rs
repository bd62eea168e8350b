//! Short-circuit evaluation of a [`JoinCondition`] against a bound context.

use crate::ast::{FieldRef, JoinCondition};
use crate::error::ConditionResult;
use lpg_core::Value;
use lpg_expr_lang::{Context, Evaluator};

pub fn evaluate(
    condition: &JoinCondition,
    evaluator: &mut Evaluator,
    ctx: &Context,
) -> ConditionResult<bool> {
    Ok(match condition {
        JoinCondition::FieldMatch { from, to } => {
            let from_val = resolve(from, "from", evaluator, ctx)?;
            let to_val = resolve(to, "to", evaluator, ctx)?;
            from_val.loose_equals(&to_val)
        }
        JoinCondition::Expression(expr) => {
            let parsed = lpg_expr_lang::parse(expr)?;
            evaluator.eval(&parsed, ctx)?.is_truthy()
        }
        JoinCondition::And(conds) => {
            let mut result = true;
            for c in conds {
                if !evaluate(c, evaluator, ctx)? {
                    result = false;
                    break;
                }
            }
            result
        }
        JoinCondition::Or(conds) => {
            let mut result = false;
            for c in conds {
                if evaluate(c, evaluator, ctx)? {
                    result = true;
                    break;
                }
            }
            result
        }
        JoinCondition::Not(inner) => !evaluate(inner, evaluator, ctx)?,
    })
}

fn resolve(
    field_ref: &FieldRef,
    object: &str,
    evaluator: &mut Evaluator,
    ctx: &Context,
) -> ConditionResult<Value> {
    let expr = match field_ref {
        FieldRef::Field(field) => lpg_expr_lang::Expr::Field { object: object.to_string(), field: field.clone() },
        FieldRef::Expression(e) => lpg_expr_lang::parse(e)?,
    };
    Ok(evaluator.eval(&expr, ctx)?)
}
