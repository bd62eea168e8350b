//! `aggregation`: summarizes each group node's `aggregate_entity`
//! successors into one new node (§4.5).

use indexmap::IndexMap;
use lpg_core::{Graph, PropertyMap, Value};
use lpg_expr_lang::{Clock, Context, Evaluator};
use lpg_metadata_loader::AggregationRule;

use crate::error::ApplyError;
use crate::id_template::render_node_id;
use crate::resolve::{apply_round, resolve_properties};

pub fn apply(graph: &mut Graph, rule: &AggregationRule, clock: &dyn Clock) -> Result<usize, ApplyError> {
    let group_ids: Vec<String> = graph.nodes_by_label(&rule.group_by_label).to_vec();

    struct NewNode {
        id: String,
        properties: PropertyMap,
        group_id: String,
        member_ids: Vec<String>,
    }
    let mut created = Vec::new();

    {
        let mut evaluator = Evaluator::new(graph, clock);
        for group_id in &group_ids {
            let member_ids: Vec<String> =
                graph.successors_with_label(group_id, &rule.aggregate_label).map(|n| n.id.clone()).collect();
            if member_ids.is_empty() {
                continue;
            }

            let agg_values = compute_aggregations(graph, rule, &member_ids);

            let group_props = graph.get_node(group_id)?.properties.clone();
            let mut ctx = Context::new();
            ctx.bind_map("facility", &group_props);
            for (name, value) in &agg_values {
                ctx.bind_scalar(name.clone(), value.clone());
            }

            let node_id = render_node_id(&rule.node_id_template, &mut evaluator, &ctx)?;

            let mut properties: PropertyMap = agg_values.into_iter().collect();
            for (name, value) in resolve_properties(&rule.properties, &mut evaluator, &ctx).iter() {
                properties.set(name.clone(), value.clone());
            }

            created.push(NewNode { id: node_id, properties, group_id: group_id.clone(), member_ids });
        }
    }

    let count = created.len();
    for node in created {
        graph.add_node(node.id.clone(), rule.output_label.clone(), node.properties)?;
        for edge in &rule.edges {
            match (edge.from.as_str(), edge.to.as_str()) {
                ("facility", "new_node") => {
                    graph.add_edge(node.group_id.clone(), node.id.clone(), edge.label.clone(), PropertyMap::new())?;
                }
                ("new_node", "aggregated_nodes") => {
                    for member_id in &node.member_ids {
                        graph.add_edge(node.id.clone(), member_id.clone(), edge.label.clone(), PropertyMap::new())?;
                    }
                }
                _ => tracing::warn!(from = edge.from.as_str(), to = edge.to.as_str(), "unrecognized aggregation edge endpoints, skipping"),
            }
        }
    }
    Ok(count)
}

fn compute_aggregations(graph: &Graph, rule: &AggregationRule, member_ids: &[String]) -> IndexMap<String, Value> {
    let mut values = IndexMap::new();
    for (name, def) in &rule.aggregations {
        let value = if def.function == "count" {
            Value::Int(member_ids.len() as i64)
        } else {
            let field = def.field.as_deref().unwrap_or("");
            let numbers: Vec<f64> = member_ids
                .iter()
                .filter_map(|id| graph.get_node(id).ok())
                .filter_map(|n| n.properties.get(field))
                .filter(|v| !v.is_null())
                .filter_map(|v| v.as_f64())
                .collect();
            aggregate(&def.function, &numbers)
        };
        values.insert(name.clone(), apply_round(value, def.round));
    }
    values
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
        _ => Value::Int(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lpg_expr_lang::FixedClock;

    fn props(pairs: &[(&str, Value)]) -> PropertyMap {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn summarizes_successor_group_with_rounding() {
        let mut graph = Graph::new();
        graph.add_node("a1", "A", props(&[("aid", Value::String("a1".into()))])).unwrap();
        graph.add_node("d1", "D", props(&[("ratio", Value::Float(0.2))])).unwrap();
        graph.add_node("d2", "D", props(&[("ratio", Value::Float(0.6))])).unwrap();
        graph.add_edge("a1", "d1", "HAS", PropertyMap::new()).unwrap();
        graph.add_edge("a1", "d2", "HAS", PropertyMap::new()).unwrap();

        let mut aggregations = IndexMap::new();
        aggregations.insert(
            "mean".to_string(),
            lpg_metadata_loader::AggregationDef { function: "avg".into(), field: Some("ratio".into()), round: Some(4) },
        );

        let rule = AggregationRule {
            output_label: "Summary".into(),
            group_by_label: "A".into(),
            aggregate_label: "D".into(),
            node_id_template: "SUM_{facility.aid}".into(),
            aggregations,
            properties: Default::default(),
            edges: Vec::new(),
        };

        let clock = FixedClock("2024-01-01T00:00:00Z".into());
        let count = apply(&mut graph, &rule, &clock).unwrap();
        assert_eq!(count, 1);
        let node = graph.get_node("SUM_a1").unwrap();
        assert_eq!(node.properties.get("mean"), Some(&Value::Float(0.4)));
    }
}
