//! Builds a [`JoinCondition`] from the structured-data tree a schema or
//! transformations document decodes into.

use crate::ast::{FieldRef, JoinCondition};
use crate::error::{ConditionError, ConditionResult};
use serde_json::Value as Json;

pub fn parse(json: &Json) -> ConditionResult<JoinCondition> {
    let obj = json
        .as_object()
        .ok_or_else(|| ConditionError::InvalidDocument("join condition must be an object".into()))?;

    if let Some(operator) = obj.get("operator").and_then(Json::as_str) {
        let conditions = obj
            .get("conditions")
            .and_then(Json::as_array)
            .ok_or_else(|| ConditionError::InvalidDocument(format!("'{operator}' requires a 'conditions' array")))?;
        let parsed: Vec<JoinCondition> = conditions.iter().map(parse).collect::<ConditionResult<_>>()?;
        return match operator {
            "AND" => Ok(JoinCondition::And(parsed)),
            "OR" => Ok(JoinCondition::Or(parsed)),
            "NOT" => {
                let mut parsed = parsed;
                if parsed.len() != 1 {
                    return Err(ConditionError::InvalidDocument(
                        "'NOT' requires exactly one condition".into(),
                    ));
                }
                Ok(JoinCondition::Not(Box::new(parsed.remove(0))))
            }
            other => Err(ConditionError::InvalidDocument(format!("unknown operator '{other}'"))),
        };
    }

    match obj.get("type").and_then(Json::as_str) {
        Some("field_match") => {
            let from = field_ref(obj, "from_field", "from_expression")?;
            let to = field_ref(obj, "to_field", "to_expression")?;
            Ok(JoinCondition::FieldMatch { from, to })
        }
        Some("expression") => {
            let expression = obj
                .get("expression")
                .and_then(Json::as_str)
                .ok_or_else(|| ConditionError::InvalidDocument("'expression' type requires 'expression'".into()))?;
            Ok(JoinCondition::Expression(expression.to_string()))
        }
        Some(other) => Err(ConditionError::InvalidDocument(format!("unknown condition type '{other}'"))),
        None => Err(ConditionError::InvalidDocument(
            "join condition requires 'type' or 'operator'".into(),
        )),
    }
}

fn field_ref(
    obj: &serde_json::Map<String, Json>,
    field_key: &str,
    expr_key: &str,
) -> ConditionResult<FieldRef> {
    if let Some(field) = obj.get(field_key).and_then(Json::as_str) {
        return Ok(FieldRef::Field(field.to_string()));
    }
    if let Some(expr) = obj.get(expr_key).and_then(Json::as_str) {
        return Ok(FieldRef::Expression(expr.to_string()));
    }
    Err(ConditionError::InvalidDocument(format!(
        "field_match requires '{field_key}' or '{expr_key}'"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_field_match() {
        let cond = parse(&json!({"type": "field_match", "from_field": "aid", "to_field": "aid"})).unwrap();
        assert_eq!(
            cond,
            JoinCondition::FieldMatch {
                from: FieldRef::Field("aid".into()),
                to: FieldRef::Field("aid".into()),
            }
        );
    }

    #[test]
    fn parses_boolean_composition() {
        let cond = parse(&json!({
            "operator": "AND",
            "conditions": [
                {"type": "expression", "expression": "from.year == to.year"},
                {"type": "expression", "expression": "from.month == to.month"},
            ]
        }))
        .unwrap();
        assert!(matches!(cond, JoinCondition::And(conds) if conds.len() == 2));
    }

    #[test]
    fn not_requires_single_condition() {
        let err = parse(&json!({"operator": "NOT", "conditions": []})).unwrap_err();
        assert!(matches!(err, ConditionError::InvalidDocument(_)));
    }
}
