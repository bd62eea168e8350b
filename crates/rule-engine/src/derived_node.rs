//! `derived_node`: materializes new nodes computed from tuples of existing
//! nodes across several aliased entities (§4.5).

use indexmap::IndexMap;
use lpg_core::{Graph, PropertyMap, Value};
use lpg_expr_lang::{Clock, Context, Evaluator};
use lpg_metadata_loader::{DerivedEdgeDef, DerivedNodeRule};

use crate::error::ApplyError;
use crate::id_template::render_node_id;
use crate::resolve::resolve_properties;

struct MatchedTuple {
    node_ids: IndexMap<String, String>,
}

pub fn apply(graph: &mut Graph, rule: &DerivedNodeRule, clock: &dyn Clock) -> Result<usize, ApplyError> {
    let entity_nodes: IndexMap<String, Vec<String>> = rule
        .source_entities
        .iter()
        .map(|(alias, label)| (alias.clone(), graph.nodes_by_label(label).to_vec()))
        .collect();

    let first_alias = rule
        .source_entities
        .keys()
        .next()
        .expect("schema validation guarantees at least one source entity")
        .clone();

    struct NewNode {
        id: String,
        properties: PropertyMap,
        edges: Vec<(String, String, String)>,
    }
    let mut created: Vec<NewNode> = Vec::new();

    let first_ids = entity_nodes.get(&first_alias).cloned().unwrap_or_default();

    {
        let mut evaluator = Evaluator::new(graph, clock);
        for first_id in &first_ids {
            let Some(tuple) = find_matching_tuple(graph, rule, &first_alias, first_id, &entity_nodes, &mut evaluator)?
            else {
                continue;
            };

            let props_by_alias: IndexMap<String, PropertyMap> = tuple
                .node_ids
                .iter()
                .map(|(alias, id)| Ok((alias.clone(), graph.get_node(id)?.properties.clone())))
                .collect::<Result<_, ApplyError>>()?;

            let mut ctx = Context::new();
            for (alias, props) in &props_by_alias {
                ctx.bind_map(alias.clone(), props);
            }

            let node_id = render_node_id(&rule.node_id_template, &mut evaluator, &ctx)?;
            let properties = resolve_properties(&rule.properties, &mut evaluator, &ctx);
            let edges = resolve_edges(&rule.edges, &node_id, &tuple, &props_by_alias);

            created.push(NewNode { id: node_id, properties, edges });
        }
    }

    let count = created.len();
    for node in created {
        graph.add_node(node.id.clone(), rule.output_label.clone(), node.properties)?;
        for (from, to, label) in node.edges {
            graph.add_edge(from, to, label, PropertyMap::new())?;
        }
    }
    Ok(count)
}

fn find_matching_tuple(
    graph: &Graph,
    rule: &DerivedNodeRule,
    first_alias: &str,
    first_id: &str,
    entity_nodes: &IndexMap<String, Vec<String>>,
    evaluator: &mut Evaluator,
) -> Result<Option<MatchedTuple>, ApplyError> {
    let first_props = graph.get_node(first_id)?.properties.clone();
    let mut matched_ids = IndexMap::new();
    matched_ids.insert(first_alias.to_string(), first_id.to_string());
    let mut matched_props: IndexMap<String, PropertyMap> = IndexMap::new();
    matched_props.insert(first_alias.to_string(), first_props);

    for alias in rule.source_entities.keys() {
        if alias == first_alias {
            continue;
        }
        let mut found = None;
        let candidates = entity_nodes.get(alias).cloned().unwrap_or_default();
        for candidate_id in &candidates {
            let candidate_props = graph.get_node(candidate_id)?.properties.clone();
            let mut ctx = Context::new();
            for (bound_alias, props) in &matched_props {
                ctx.bind_map(bound_alias.clone(), props);
            }
            ctx.bind_map(alias.clone(), &candidate_props);

            if lpg_condition::evaluate(&rule.join_condition, evaluator, &ctx)? {
                found = Some((candidate_id.clone(), candidate_props));
                break;
            }
        }
        match found {
            Some((id, props)) => {
                matched_ids.insert(alias.clone(), id);
                matched_props.insert(alias.clone(), props);
            }
            None => return Ok(None),
        }
    }

    Ok(Some(MatchedTuple { node_ids: matched_ids }))
}

/// Resolves `"new_node"`, an alias name, or the `"facility"` sentinel
/// (Q2 in DESIGN.md: any bound alias carrying a `facility_id` property).
fn resolve_node_reference(
    reference: &str,
    new_node_id: &str,
    tuple: &MatchedTuple,
    props_by_alias: &IndexMap<String, PropertyMap>,
) -> Option<String> {
    if reference == "new_node" {
        return Some(new_node_id.to_string());
    }
    if let Some(id) = tuple.node_ids.get(reference) {
        return Some(id.clone());
    }
    if reference == "facility" {
        for props in props_by_alias.values() {
            if let Some(Value::String(facility_id)) = props.get("facility_id") {
                return Some(facility_id.clone());
            }
        }
    }
    None
}

fn resolve_edges(
    defs: &[DerivedEdgeDef],
    new_node_id: &str,
    tuple: &MatchedTuple,
    props_by_alias: &IndexMap<String, PropertyMap>,
) -> Vec<(String, String, String)> {
    defs.iter()
        .filter_map(|edge| {
            let from = resolve_node_reference(&edge.from, new_node_id, tuple, props_by_alias)?;
            let to = resolve_node_reference(&edge.to, new_node_id, tuple, props_by_alias)?;
            Some((from, to, edge.label.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lpg_expr_lang::FixedClock;

    fn props(pairs: &[(&str, Value)]) -> PropertyMap {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn creates_a_node_per_matched_tuple() {
        let mut graph = Graph::new();
        graph.add_node("a1", "A", props(&[("aid", Value::String("a1".into())), ("x", Value::Int(45000))])).unwrap();
        graph.add_node("b1", "B", props(&[("aid", Value::String("a1".into())), ("y", Value::Int(100000))])).unwrap();

        let mut source_entities = IndexMap::new();
        source_entities.insert("a".to_string(), "A".to_string());
        source_entities.insert("b".to_string(), "B".to_string());

        let rule = DerivedNodeRule {
            output_label: "D".into(),
            source_entities,
            join_condition: lpg_condition::parse(&serde_json::json!({
                "type": "expression", "expression": "a.aid == b.aid"
            }))
            .unwrap(),
            node_id_template: "D_{a.aid}".into(),
            properties: {
                let mut m = IndexMap::new();
                m.insert(
                    "ratio".to_string(),
                    lpg_metadata_loader::DerivedPropertyDef {
                        def: lpg_metadata_loader::PropertyValueDef::Expression("a.x / b.y".into()),
                        round: None,
                    },
                );
                m
            },
            edges: Vec::new(),
        };

        let clock = FixedClock("2024-01-01T00:00:00Z".into());
        let count = apply(&mut graph, &rule, &clock).unwrap();
        assert_eq!(count, 1);
        let node = graph.get_node("D_a1").unwrap();
        assert_eq!(node.properties.get("ratio"), Some(&Value::Float(0.45)));
    }

    #[test]
    fn facility_sentinel_edge_targets_the_facility_node_not_the_record() {
        let mut graph = Graph::new();
        graph.add_node("f1", "Facility", PropertyMap::new()).unwrap();
        graph.add_node(
            "r1",
            "Record",
            props(&[("facility_id", Value::String("f1".into())), ("x", Value::Int(10))]),
        )
        .unwrap();

        let mut source_entities = IndexMap::new();
        source_entities.insert("r".to_string(), "Record".to_string());

        let rule = DerivedNodeRule {
            output_label: "D".into(),
            source_entities,
            join_condition: lpg_condition::parse(&serde_json::json!({"type": "expression", "expression": "true"}))
                .unwrap(),
            node_id_template: "D_{r.facility_id}".into(),
            properties: IndexMap::new(),
            edges: vec![lpg_metadata_loader::DerivedEdgeDef {
                from: "facility".into(),
                to: "new_node".into(),
                label: "HAS_DERIVED".into(),
            }],
        };

        let clock = FixedClock("2024-01-01T00:00:00Z".into());
        let count = apply(&mut graph, &rule, &clock).unwrap();
        assert_eq!(count, 1);
        let node_id = "D_f1";
        assert!(graph.has_node(node_id));
        let edges: Vec<_> = graph.out_edges("f1").collect();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].to, node_id);
    }
}
