//! `enrich_properties`: adds computed properties to existing nodes of one
//! label, in place (§4.5).
//!
//! Aggregation-containing expressions are detected syntactically and
//! evaluated once, against an empty context, before the node loop — every
//! enriched node then sees the same precomputed benchmark rather than
//! recomputing (and potentially re-scanning the whole label) per node.

use lpg_core::{Graph, Value};
use lpg_expr_lang::{Clock, Context, Evaluator};
use lpg_metadata_loader::{EnrichDef, EnrichPropertiesRule};

use crate::error::ApplyError;
use crate::resolve::apply_round;

pub fn apply(graph: &mut Graph, rule: &EnrichPropertiesRule, clock: &dyn Clock) -> Result<usize, ApplyError> {
    let target_ids: Vec<String> = graph.nodes_by_label(&rule.target_label).to_vec();

    let mut updates: Vec<(String, String, Value)> = Vec::new();
    {
        let mut evaluator = Evaluator::new(graph, clock);

        let precomputed: Vec<(usize, Value)> = rule
            .enrichments
            .iter()
            .enumerate()
            .filter_map(|(i, enrichment)| match &enrichment.def {
                EnrichDef::Expression(expr_src) => {
                    let parsed = lpg_expr_lang::parse(expr_src).ok()?;
                    if !parsed.contains_aggregation() {
                        return None;
                    }
                    let value = evaluator.eval(&parsed, &Context::new()).ok()?;
                    Some((i, apply_round(value, enrichment.round)))
                }
                _ => None,
            })
            .collect();

        for node_id in &target_ids {
            let node_props = graph.get_node(node_id)?.properties.clone();
            let mut ctx = Context::new();
            ctx.bind_map("node", &node_props);

            for (i, enrichment) in rule.enrichments.iter().enumerate() {
                if let Some((_, value)) = precomputed.iter().find(|(idx, _)| *idx == i) {
                    updates.push((node_id.clone(), enrichment.property.clone(), value.clone()));
                    continue;
                }
                let value = match &enrichment.def {
                    EnrichDef::Value(v) => Some(v.clone()),
                    EnrichDef::Expression(expr_src) => lpg_expr_lang::parse(expr_src)
                        .ok()
                        .and_then(|parsed| evaluator.eval(&parsed, &ctx).ok()),
                    EnrichDef::Rules(rules) => evaluate_conditional_rules(rules, &mut evaluator, &ctx),
                };
                match value {
                    Some(v) => updates.push((node_id.clone(), enrichment.property.clone(), apply_round(v, enrichment.round))),
                    None => tracing::warn!(
                        node = node_id.as_str(),
                        property = enrichment.property.as_str(),
                        "enrichment computation failed, skipping"
                    ),
                }
            }
        }
    }

    let touched = target_ids.len();
    for (node_id, property, value) in updates {
        graph.set_property(&node_id, property, value)?;
    }
    Ok(touched)
}

fn evaluate_conditional_rules(
    rules: &[lpg_metadata_loader::ConditionalRule],
    evaluator: &mut Evaluator,
    ctx: &Context,
) -> Option<Value> {
    for rule in rules {
        if rule.condition == "true" {
            return Some(rule.value.clone());
        }
        let Ok(parsed) = lpg_expr_lang::parse(&rule.condition) else { continue };
        match evaluator.eval(&parsed, ctx) {
            Ok(v) if v.is_truthy() => return Some(rule.value.clone()),
            _ => continue,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use lpg_core::PropertyMap;
    use lpg_expr_lang::FixedClock;
    use lpg_metadata_loader::{ConditionalRule, Enrichment};

    fn props(pairs: &[(&str, Value)]) -> PropertyMap {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn rules_based_enrichment_picks_first_matching_branch() {
        let mut graph = Graph::new();
        graph.add_node("d1", "D", props(&[("ratio", Value::Float(0.2))])).unwrap();
        graph.add_node("d2", "D", props(&[("ratio", Value::Float(0.8))])).unwrap();

        let rule = EnrichPropertiesRule {
            target_label: "D".into(),
            enrichments: vec![Enrichment {
                property: "rating".into(),
                def: EnrichDef::Rules(vec![
                    ConditionalRule { condition: "node.ratio < 0.4".into(), value: Value::String("Excellent".into()) },
                    ConditionalRule { condition: "true".into(), value: Value::String("Average".into()) },
                ]),
                round: None,
            }],
        };

        let clock = FixedClock("2024-01-01T00:00:00Z".into());
        apply(&mut graph, &rule, &clock).unwrap();

        assert_eq!(graph.get_node("d1").unwrap().properties.get("rating"), Some(&Value::String("Excellent".into())));
        assert_eq!(graph.get_node("d2").unwrap().properties.get("rating"), Some(&Value::String("Average".into())));
    }

    #[test]
    fn aggregation_expression_is_precomputed_once() {
        let mut graph = Graph::new();
        graph.add_node("d1", "D", props(&[("ratio", Value::Float(0.2))])).unwrap();
        graph.add_node("d2", "D", props(&[("ratio", Value::Float(0.6))])).unwrap();

        let rule = EnrichPropertiesRule {
            target_label: "D".into(),
            enrichments: vec![Enrichment {
                property: "benchmark".into(),
                def: EnrichDef::Expression("avg(D.ratio)".into()),
                round: None,
            }],
        };
        let clock = FixedClock("2024-01-01T00:00:00Z".into());
        apply(&mut graph, &rule, &clock).unwrap();

        assert_eq!(graph.get_node("d1").unwrap().properties.get("benchmark"), Some(&Value::Float(0.4)));
        assert_eq!(graph.get_node("d2").unwrap().properties.get("benchmark"), Some(&Value::Float(0.4)));
    }
}
