//! Materializes entities as nodes and relationships as edges from a
//! validated [`Schema`], reading each entity's declared tabular source
//! exactly once (§6).

use std::path::{Path, PathBuf};

use lpg_condition::JoinCondition;
use lpg_core::{Graph, PropertyMap, Value};
use lpg_expr_lang::{Clock, Context, Evaluator};
use lpg_metadata_loader::{EdgePropertyDef, EntityDef, RelationshipDef, Schema};
use tracing::{info, warn};

use crate::convert::convert;
use crate::error::{BuildError, BuildResult};
use crate::id_template;
use crate::tabular::{CsvSource, Row, TabularSource};

pub struct GraphBuilder<'c> {
    base_path: PathBuf,
    clock: &'c dyn Clock,
}

impl<'c> GraphBuilder<'c> {
    pub fn new(base_path: impl AsRef<Path>, clock: &'c dyn Clock) -> Self {
        Self { base_path: base_path.as_ref().to_path_buf(), clock }
    }

    pub fn build(&self, schema: &Schema) -> BuildResult<Graph> {
        let mut graph = Graph::new();

        for entity in &schema.entities {
            self.load_entity(entity, &mut graph)?;
        }
        for relationship in &schema.relationships {
            self.create_relationship(relationship, &mut graph)?;
        }

        let stats = graph.stats();
        info!(total_nodes = stats.total_nodes, total_edges = stats.total_edges, "graph constructed");
        Ok(graph)
    }

    fn load_entity(&self, entity: &EntityDef, graph: &mut Graph) -> BuildResult<()> {
        let csv_path = self.base_path.join(&entity.source.path);
        let mut source = CsvSource::open(&csv_path)?;
        let rows = source.rows()?;

        let mut added = 0usize;
        for row in &rows {
            let node_id = generate_node_id(entity, row)?;
            let properties = extract_properties(entity, row)?;
            graph.add_node(node_id, entity.name.clone(), properties)?;
            added += 1;
        }
        info!(entity = entity.name.as_str(), added, "entity loaded");
        Ok(())
    }

    fn create_relationship(&self, relationship: &RelationshipDef, graph: &mut Graph) -> BuildResult<()> {
        let from_ids: Vec<String> = graph.nodes_by_label(&relationship.from_entity).to_vec();
        let to_ids: Vec<String> = graph.nodes_by_label(&relationship.to_entity).to_vec();

        let mut matches: Vec<(String, String, PropertyMap)> = Vec::new();
        {
            let mut evaluator = Evaluator::new(graph, self.clock);
            for from_id in &from_ids {
                let from_props = graph.get_node(from_id)?.properties.clone();
                for to_id in &to_ids {
                    let to_props = graph.get_node(to_id)?.properties.clone();
                    let mut ctx = Context::new();
                    ctx.bind_map("from", &from_props);
                    ctx.bind_map("to", &to_props);

                    if evaluate_condition(&relationship.join_condition, &mut evaluator, &ctx)? {
                        let edge_props = resolve_edge_properties(relationship, &from_props, &to_props);
                        matches.push((from_id.clone(), to_id.clone(), edge_props));
                    }
                }
            }
        }

        let matched = matches.len();
        for (from_id, to_id, props) in matches {
            graph.add_edge(from_id, to_id, relationship.name.clone(), props)?;
        }
        if matched == 0 {
            warn!(relationship = relationship.name.as_str(), "relationship produced no edges");
        } else {
            info!(relationship = relationship.name.as_str(), matched, "relationship materialized");
        }
        Ok(())
    }
}

fn evaluate_condition(condition: &JoinCondition, evaluator: &mut Evaluator, ctx: &Context) -> BuildResult<bool> {
    Ok(lpg_condition::evaluate(condition, evaluator, ctx)?)
}

fn generate_node_id(entity: &EntityDef, row: &impl Row) -> BuildResult<String> {
    if let Some(id_field) = &entity.id_field {
        return row.get(id_field).map(str::to_string).ok_or_else(|| BuildError::MissingField {
            entity: entity.name.clone(),
            field: id_field.clone(),
        });
    }
    if let Some(template) = &entity.id_template {
        return id_template::render(template, row);
    }
    unreachable!("schema validation guarantees exactly one id strategy")
}

fn extract_properties(entity: &EntityDef, row: &impl Row) -> BuildResult<PropertyMap> {
    let mut properties = PropertyMap::new();
    for (field_name, prop_def) in &entity.properties {
        let Some(raw) = row.get(field_name) else {
            if prop_def.required {
                return Err(BuildError::MissingField { entity: entity.name.clone(), field: field_name.clone() });
            }
            continue;
        };
        let value = convert(raw, field_name, prop_def.property_type)?;
        let prop_name = prop_def.alias.clone().unwrap_or_else(|| field_name.clone());
        properties.set(prop_name, value.clone());
        if prop_def.alias.is_some() {
            properties.set(field_name.clone(), value);
        }
    }
    Ok(properties)
}

fn resolve_edge_properties(relationship: &RelationshipDef, from: &PropertyMap, to: &PropertyMap) -> PropertyMap {
    let mut props = PropertyMap::new();
    for (name, def) in &relationship.properties {
        let value = match def {
            EdgePropertyDef::Value(v) => v.clone(),
            EdgePropertyDef::Source(source) => {
                if let Some(field) = source.strip_prefix("from.") {
                    from.get(field).cloned().unwrap_or(Value::Null)
                } else if let Some(field) = source.strip_prefix("to.") {
                    to.get(field).cloned().unwrap_or(Value::Null)
                } else {
                    Value::Null
                }
            }
        };
        props.set(name.clone(), value);
    }
    props
}
