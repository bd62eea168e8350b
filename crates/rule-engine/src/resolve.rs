//! Shared `{value}` / `{source}` / `{expression}` property resolution used
//! by every rule kind that computes node or edge properties (§4.5).
//!
//! `source` is sugar for `expression`: `{source: "from.field"}` behaves
//! exactly like `{expression: "from.field"}` (Q3 in DESIGN.md), so the two
//! branches are rewritten to the same `Expr::Field` before evaluation —
//! there is only one code path to diverge from.

use indexmap::IndexMap;
use lpg_core::{PropertyMap, Value};
use lpg_expr_lang::{Context, Evaluator, Expr};
use lpg_metadata_loader::{DerivedPropertyDef, PropertyValueDef};

use crate::error::ApplyError;

pub fn resolve_properties(
    defs: &IndexMap<String, DerivedPropertyDef>,
    evaluator: &mut Evaluator,
    ctx: &Context,
) -> PropertyMap {
    let mut props = PropertyMap::new();
    for (name, def) in defs {
        match resolve_one(def, evaluator, ctx) {
            Ok(value) => props.set(name.clone(), value),
            Err(err) => {
                tracing::warn!(property = name.as_str(), error = %err, "property computation failed, skipping");
            }
        }
    }
    props
}

fn resolve_one(def: &DerivedPropertyDef, evaluator: &mut Evaluator, ctx: &Context) -> Result<Value, ApplyError> {
    let expr = match &def.def {
        PropertyValueDef::Value(v) => return Ok(apply_round(v.clone(), def.round)),
        PropertyValueDef::Source(source) => field_expr(source)?,
        PropertyValueDef::Expression(expr) => lpg_expr_lang::parse(expr)?,
    };
    let value = evaluator.eval(&expr, ctx)?;
    Ok(apply_round(value, def.round))
}

/// `"alias.field"` -> `Expr::Field { object: alias, field }`.
fn field_expr(source: &str) -> Result<Expr, ApplyError> {
    let (object, field) = source
        .split_once('.')
        .ok_or_else(|| ApplyError::UnresolvedSource(source.to_string()))?;
    Ok(Expr::Field { object: object.to_string(), field: field.to_string() })
}

pub fn apply_round(value: Value, round: Option<i32>) -> Value {
    match (round, value.as_f64()) {
        (Some(digits), Some(n)) => {
            let factor = 10f64.powi(digits);
            Value::Float((n * factor).round() / factor)
        }
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lpg_core::Graph;
    use lpg_expr_lang::FixedClock;

    #[test]
    fn source_and_expression_give_identical_results() {
        let graph = Graph::new();
        let clock = FixedClock("2024-01-01T00:00:00Z".into());
        let mut evaluator = Evaluator::new(&graph, &clock);
        let mut props = PropertyMap::new();
        props.set("x", Value::Int(5));
        let mut ctx = Context::new();
        ctx.bind_map("from", &props);

        let via_source = DerivedPropertyDef { def: PropertyValueDef::Source("from.x".into()), round: None };
        let via_expr = DerivedPropertyDef { def: PropertyValueDef::Expression("from.x".into()), round: None };

        assert_eq!(resolve_one(&via_source, &mut evaluator, &ctx).unwrap(), Value::Int(5));
        assert_eq!(resolve_one(&via_expr, &mut evaluator, &ctx).unwrap(), Value::Int(5));
    }

    #[test]
    fn round_truncates_float_precision() {
        assert_eq!(apply_round(Value::Float(0.123456), Some(2)), Value::Float(0.12));
    }
}
