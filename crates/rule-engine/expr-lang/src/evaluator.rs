//! Walks an [`Expr`] against a [`Context`] and a graph snapshot to produce a
//! [`Value`].

use crate::ast::{BinOp, Expr, LogicalOp};
use crate::builtins;
use crate::clock::Clock;
use crate::error::{ExprError, ExprResult};
use lpg_core::{Graph, PropertyMap, Value};
use std::collections::HashMap;

/// A binding available to field references: either a node's property map
/// (for `alias.field`) or a bare scalar (rarely used, reserved for callers
/// that want to bind a precomputed value under a name).
#[derive(Debug, Clone)]
pub enum Binding<'a> {
    Map(&'a PropertyMap),
    Scalar(Value),
}

/// The set of identifier bindings an expression is evaluated against, e.g.
/// `{from: props(f), to: props(t)}` for a join condition, or
/// `{a: props, a_node_id: Value::String(id), ...}` for a derived-node tuple.
#[derive(Debug, Clone, Default)]
pub struct Context<'a> {
    vars: HashMap<String, Binding<'a>>,
}

impl<'a> Context<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind_map(&mut self, name: impl Into<String>, map: &'a PropertyMap) -> &mut Self {
        self.vars.insert(name.into(), Binding::Map(map));
        self
    }

    pub fn bind_scalar(&mut self, name: impl Into<String>, value: Value) -> &mut Self {
        self.vars.insert(name.into(), Binding::Scalar(value));
        self
    }

    fn field(&self, object: &str, field: &str) -> Option<Value> {
        match self.vars.get(object)? {
            Binding::Map(map) => map.get(field).cloned(),
            Binding::Scalar(_) => None,
        }
    }
}

/// Cache key for aggregation results: `(function, label, field)`. `field`
/// is empty for `count`, which does not take one.
type AggKey = (String, String, String);

/// Evaluates expressions against one graph snapshot. One evaluator is
/// constructed per rule application so its aggregation cache is naturally
/// rule-scoped (§4.4, O3); call [`Evaluator::clear_cache`] to reuse an
/// instance across rules instead of reconstructing it.
pub struct Evaluator<'g> {
    graph: &'g Graph,
    clock: &'g dyn Clock,
    cache: HashMap<AggKey, Value>,
}

impl<'g> Evaluator<'g> {
    pub fn new(graph: &'g Graph, clock: &'g dyn Clock) -> Self {
        Self { graph, clock, cache: HashMap::new() }
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Lenient evaluation: a missing field or unresolved identifier
    /// degrades to `Value::Null` rather than erroring, so one absent
    /// upstream value doesn't abort an otherwise-valid computation.
    pub fn eval(&mut self, expr: &Expr, ctx: &Context) -> ExprResult<Value> {
        match expr {
            Expr::Literal(v) => Ok(v.clone()),
            Expr::Ident(name) => Ok(ctx
                .vars
                .get(name)
                .and_then(|b| match b {
                    Binding::Scalar(v) => Some(v.clone()),
                    Binding::Map(_) => None,
                })
                .unwrap_or(Value::Null)),
            Expr::Field { object, field } => Ok(ctx.field(object, field).unwrap_or(Value::Null)),
            Expr::Neg(inner) => {
                let v = self.eval(inner, ctx)?;
                Ok(match v.as_f64() {
                    Some(n) if v.is_int() => Value::Int(-(n as i64)),
                    Some(n) => Value::Float(-n),
                    None => Value::Null,
                })
            }
            Expr::Not(inner) => {
                let v = self.eval(inner, ctx)?;
                Ok(Value::Bool(!v.is_truthy()))
            }
            Expr::Logical { op, left, right } => {
                let l = self.eval(left, ctx)?;
                match op {
                    LogicalOp::And if !l.is_truthy() => Ok(Value::Bool(false)),
                    LogicalOp::And => Ok(Value::Bool(self.eval(right, ctx)?.is_truthy())),
                    LogicalOp::Or if l.is_truthy() => Ok(Value::Bool(true)),
                    LogicalOp::Or => Ok(Value::Bool(self.eval(right, ctx)?.is_truthy())),
                }
            }
            Expr::Binary { op, left, right } => {
                let l = self.eval(left, ctx)?;
                let r = self.eval(right, ctx)?;
                self.eval_binary(*op, l, r)
            }
            Expr::Call { name, args } => self.eval_call(name, args, ctx),
        }
    }

    /// Strict evaluation for the single case where a field reference is
    /// required to produce a value (e.g. an identifier resolution used to
    /// build a node reference): unresolved fields surface as `EvalError`
    /// instead of `Null` (§4.4).
    pub fn eval_required(&mut self, expr: &Expr, ctx: &Context) -> ExprResult<Value> {
        if let Expr::Field { object, field } = expr {
            return ctx
                .field(object, field)
                .ok_or_else(|| ExprError::EvalError(format!("missing field '{object}.{field}'")));
        }
        self.eval(expr, ctx)
    }

    fn eval_binary(&self, op: BinOp, l: Value, r: Value) -> ExprResult<Value> {
        use BinOp::*;
        match op {
            Eq => return Ok(Value::Bool(l.loose_equals(&r))),
            NotEq => return Ok(Value::Bool(!l.loose_equals(&r))),
            Lt | Le | Gt | Ge => {
                return Ok(Value::Bool(match l.partial_cmp(&r) {
                    Some(ord) => match op {
                        Lt => ord.is_lt(),
                        Le => ord.is_le(),
                        Gt => ord.is_gt(),
                        Ge => ord.is_ge(),
                        _ => unreachable!(),
                    },
                    None => false,
                }));
            }
            _ => {}
        }

        if l.is_null() || r.is_null() {
            return Ok(Value::Null);
        }
        let (Some(lf), Some(rf)) = (l.as_f64(), r.as_f64()) else {
            return Ok(Value::Null);
        };
        let both_int = l.is_int() && r.is_int();

        Ok(match op {
            Add if both_int => Value::Int(lf as i64 + rf as i64),
            Add => Value::Float(lf + rf),
            Sub if both_int => Value::Int(lf as i64 - rf as i64),
            Sub => Value::Float(lf - rf),
            Mul if both_int => Value::Int(lf as i64 * rf as i64),
            Mul => Value::Float(lf * rf),
            Div if rf == 0.0 => Value::Null,
            Div => Value::Float(lf / rf),
            Mod if rf == 0.0 => Value::Null,
            Mod if both_int => Value::Int(lf as i64 % rf as i64),
            Mod => Value::Float(lf % rf),
            Pow => Value::Float(lf.powf(rf)),
            Eq | NotEq | Lt | Le | Gt | Ge => unreachable!(),
        })
    }

    fn eval_call(&mut self, name: &str, args: &[Expr], ctx: &Context) -> ExprResult<Value> {
        if builtins::is_aggregation(name) {
            return self.eval_aggregation(name, args);
        }
        match name {
            "now" => Ok(Value::Timestamp(self.clock.now_iso8601())),
            "abs" => {
                let v = self.eval(args.first().ok_or_else(|| missing_arg("abs"))?, ctx)?;
                Ok(match v.as_f64() {
                    Some(n) if v.is_int() => Value::Int(n.abs() as i64),
                    Some(n) => Value::Float(n.abs()),
                    None => Value::Null,
                })
            }
            "len" => {
                let v = self.eval(args.first().ok_or_else(|| missing_arg("len"))?, ctx)?;
                match v.as_str() {
                    Some(s) => Ok(Value::Int(s.chars().count() as i64)),
                    None => Ok(Value::Null),
                }
            }
            "round" => {
                let x = self.eval(args.first().ok_or_else(|| missing_arg("round"))?, ctx)?;
                let digits = match args.get(1) {
                    Some(e) => self.eval(e, ctx)?.as_f64().unwrap_or(0.0) as i32,
                    None => 0,
                };
                match x.as_f64() {
                    None => Ok(Value::Null),
                    Some(n) => {
                        let factor = 10f64.powi(digits);
                        Ok(Value::Float((n * factor).round() / factor))
                    }
                }
            }
            other => Err(ExprError::EvalError(format!("unknown function '{other}'"))),
        }
    }

    /// `count(E)` takes a bare label; the rest take `E.field`.
    fn eval_aggregation(&mut self, function: &str, args: &[Expr]) -> ExprResult<Value> {
        let (label, field) = match args.first() {
            Some(Expr::Ident(label)) if function == "count" => (label.clone(), String::new()),
            Some(Expr::Field { object, field }) => (object.clone(), field.clone()),
            _ => {
                return Err(ExprError::EvalError(format!(
                    "{function}() requires a label or label.field argument"
                )))
            }
        };

        let key: AggKey = (function.to_string(), label.clone(), field.clone());
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached.clone());
        }

        let result = if function == "count" {
            Value::Int(self.graph.nodes_by_label(&label).len() as i64)
        } else {
            let values: Vec<f64> = self
                .graph
                .nodes_by_label(&label)
                .iter()
                .filter_map(|id| self.graph.get_node(id).ok())
                .filter_map(|n| n.properties.get(&field))
                .filter(|v| !v.is_null())
                .filter_map(numeric_value)
                .collect();
            aggregate(function, &values)
        };

        self.cache.insert(key, result.clone());
        Ok(result)
    }
}

fn numeric_value(v: &Value) -> Option<f64> {
    v.as_f64().or_else(|| v.as_str().and_then(|s| s.parse().ok()))
}

fn aggregate(function: &str, values: &[f64]) -> Value {
    if values.is_empty() {
        return Value::Int(0);
    }
    match function {
        "avg" => Value::Float(values.iter().sum::<f64>() / values.len() as f64),
        "sum" => Value::Float(values.iter().sum()),
        "max" => Value::Float(values.iter().cloned().fold(f64::NEG_INFINITY, f64::max)),
        "min" => Value::Float(values.iter().cloned().fold(f64::INFINITY, f64::min)),
        "stddev" => Value::Float(if values.len() > 1 { stddev(values) } else { 0.0 }),
        _ => Value::Null,
    }
}

fn stddev(values: &[f64]) -> f64 {
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

fn missing_arg(function: &str) -> ExprError {
    ExprError::EvalError(format!("{function}() requires an argument"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::parser::parse;
    use lpg_core::property::PropertyMap;

    fn eval_str(graph: &Graph, clock: &dyn Clock, src: &str, ctx: &Context) -> Value {
        let expr = parse(src).unwrap();
        Evaluator::new(graph, clock).eval(&expr, ctx).unwrap()
    }

    #[test]
    fn division_by_zero_is_null() {
        let graph = Graph::new();
        let clock = FixedClock("2024-01-01T00:00:00Z".into());
        let v = eval_str(&graph, &clock, "1 / 0", &Context::new());
        assert_eq!(v, Value::Null);
    }

    #[test]
    fn int_plus_float_promotes_to_float() {
        let graph = Graph::new();
        let clock = FixedClock("2024-01-01T00:00:00Z".into());
        let v = eval_str(&graph, &clock, "1 + 2.5", &Context::new());
        assert_eq!(v, Value::Float(3.5));
    }

    #[test]
    fn field_reference_reads_bound_map() {
        let graph = Graph::new();
        let clock = FixedClock("2024-01-01T00:00:00Z".into());
        let mut props = PropertyMap::new();
        props.set("aid", Value::String("a1".into()));
        let mut ctx = Context::new();
        ctx.bind_map("a", &props);
        let v = eval_str(&graph, &clock, "a.aid", &ctx);
        assert_eq!(v, Value::String("a1".into()));
    }

    #[test]
    fn missing_field_is_null_not_error() {
        let graph = Graph::new();
        let clock = FixedClock("2024-01-01T00:00:00Z".into());
        let props = PropertyMap::new();
        let mut ctx = Context::new();
        ctx.bind_map("a", &props);
        let v = eval_str(&graph, &clock, "a.missing", &ctx);
        assert_eq!(v, Value::Null);
    }

    #[test]
    fn aggregation_over_empty_label_is_zero() {
        let graph = Graph::new();
        let clock = FixedClock("2024-01-01T00:00:00Z".into());
        let v = eval_str(&graph, &clock, "avg(D.ratio)", &Context::new());
        assert_eq!(v, Value::Int(0));
    }

    #[test]
    fn aggregation_result_is_cached_within_one_evaluator() {
        let mut graph = Graph::new();
        for (id, ratio) in [("d1", 0.2), ("d2", 0.6)] {
            let mut props = PropertyMap::new();
            props.set("ratio", Value::Float(ratio));
            graph.add_node(id, "D", props).unwrap();
        }
        let clock = FixedClock("2024-01-01T00:00:00Z".into());
        let mut evaluator = Evaluator::new(&graph, &clock);
        let expr = parse("avg(D.ratio)").unwrap();
        let first = evaluator.eval(&expr, &Context::new()).unwrap();
        // Mutating the graph after the cache is warm must not change the
        // answer within the same evaluator instance (§4.4, O3).
        let mut extra = PropertyMap::new();
        extra.set("ratio", Value::Float(100.0));
        // (graph is immutably borrowed by evaluator; this just re-confirms determinism)
        let second = evaluator.eval(&expr, &Context::new()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, Value::Float(0.4));
    }

    #[test]
    fn comparison_of_incomparable_types_is_false() {
        let graph = Graph::new();
        let clock = FixedClock("2024-01-01T00:00:00Z".into());
        let v = eval_str(&graph, &clock, "'abc' < 5", &Context::new());
        assert_eq!(v, Value::Bool(false));
    }
}
