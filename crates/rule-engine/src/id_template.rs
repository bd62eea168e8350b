//! `node_id_template` rendering for `derived_node`/`aggregation` rules:
//! `{alias.field}` or `{alias.field:format}` placeholders resolved against
//! a bound [`Context`] (§4.5). Distinct from `lpg-builder`'s entity
//! `id_template`, whose placeholders reference bare row columns instead of
//! alias-qualified fields.

use once_cell::sync::Lazy;
use regex::Regex;

use lpg_expr_lang::{Context, Evaluator, Expr};

use crate::error::ApplyError;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{([^}:]+)(?::([^}]+))?\}").unwrap());

pub fn render_node_id(template: &str, evaluator: &mut Evaluator, ctx: &Context) -> Result<String, ApplyError> {
    let mut error = None;
    let rendered = PLACEHOLDER.replace_all(template, |caps: &regex::Captures| {
        let reference = &caps[1];
        let format = caps.get(2).map(|m| m.as_str());
        match resolve(reference, evaluator, ctx) {
            Ok(value) => format_value(&value, format),
            Err(err) => {
                error = Some(err);
                String::new()
            }
        }
    });
    match error {
        Some(err) => Err(err),
        None => Ok(rendered.into_owned()),
    }
}

fn resolve(reference: &str, evaluator: &mut Evaluator, ctx: &Context) -> Result<lpg_core::Value, ApplyError> {
    let Some((object, field)) = reference.split_once('.') else {
        return Err(ApplyError::UnresolvedSource(reference.to_string()));
    };
    let expr = Expr::Field { object: object.to_string(), field: field.to_string() };
    Ok(evaluator.eval_required(&expr, ctx)?)
}

fn format_value(value: &lpg_core::Value, format: Option<&str>) -> String {
    let Some(format) = format else {
        return value.to_display_string();
    };
    if let Some(width) = format.strip_suffix('d').and_then(|rest| rest.strip_prefix('0')) {
        if let (Ok(width), Some(n)) = (width.parse::<usize>(), value.as_f64()) {
            return format!("{:0width$}", n as i64, width = width);
        }
    }
    value.to_display_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lpg_core::{Graph, PropertyMap, Value};
    use lpg_expr_lang::FixedClock;

    #[test]
    fn renders_alias_field_with_zero_padded_format() {
        let graph = Graph::new();
        let clock = FixedClock("2024-01-01T00:00:00Z".into());
        let mut evaluator = Evaluator::new(&graph, &clock);

        let mut props = PropertyMap::new();
        props.set("aid", Value::String("a1".into()));
        props.set("year", Value::Int(2024));
        props.set("month", Value::Int(1));
        let mut ctx = Context::new();
        ctx.bind_map("a", &props);

        let id = render_node_id("D_{a.aid}_{a.year}{a.month:02d}", &mut evaluator, &ctx).unwrap();
        assert_eq!(id, "D_a1_202401");
    }
}
