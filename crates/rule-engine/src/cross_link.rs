//! `cross_link`: adds edges between existing nodes of two entities whose
//! join condition holds (§4.5).

use lpg_core::{Graph, PropertyMap};
use lpg_expr_lang::{Clock, Context, Evaluator};
use lpg_metadata_loader::CrossLinkRule;

use crate::error::ApplyError;
use crate::resolve::resolve_properties;

pub fn apply(graph: &mut Graph, rule: &CrossLinkRule, clock: &dyn Clock) -> Result<usize, ApplyError> {
    let from_ids: Vec<String> = graph.nodes_by_label(&rule.from_entity).to_vec();
    let to_ids: Vec<String> = graph.nodes_by_label(&rule.to_entity).to_vec();

    let mut matches: Vec<(String, String, PropertyMap)> = Vec::new();
    {
        let mut evaluator = Evaluator::new(graph, clock);
        for from_id in &from_ids {
            let from_props = graph.get_node(from_id)?.properties.clone();
            for to_id in &to_ids {
                let to_props = graph.get_node(to_id)?.properties.clone();
                let mut ctx = Context::new();
                ctx.bind_map("from", &from_props);
                ctx.bind_map("to", &to_props);

                if lpg_condition::evaluate(&rule.condition, &mut evaluator, &ctx)? {
                    let props = resolve_properties(&rule.properties, &mut evaluator, &ctx);
                    matches.push((from_id.clone(), to_id.clone(), props));
                }
            }
        }
    }

    let added = matches.len();
    for (from_id, to_id, props) in matches {
        graph.add_edge(from_id, to_id, rule.link_label.clone(), props)?;
    }
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lpg_core::{PropertyMap as PMap, Value};
    use lpg_expr_lang::FixedClock;

    fn node_props(pairs: &[(&str, Value)]) -> PMap {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn links_nodes_whose_join_condition_holds() {
        let mut graph = Graph::new();
        graph.add_node("a1", "A", node_props(&[("year", Value::Int(2024))])).unwrap();
        graph.add_node("b1", "B", node_props(&[("year", Value::Int(2024))])).unwrap();
        graph.add_node("b2", "B", node_props(&[("year", Value::Int(2023))])).unwrap();

        let rule = CrossLinkRule {
            from_entity: "A".into(),
            to_entity: "B".into(),
            link_label: "LINK".into(),
            condition: lpg_condition::parse(&serde_json::json!({
                "type": "field_match", "from_field": "year", "to_field": "year"
            }))
            .unwrap(),
            properties: Default::default(),
        };

        let clock = FixedClock("2024-01-01T00:00:00Z".into());
        let added = apply(&mut graph, &rule, &clock).unwrap();
        assert_eq!(added, 1);
        assert_eq!(graph.stats().total_edges, 1);
    }
}
