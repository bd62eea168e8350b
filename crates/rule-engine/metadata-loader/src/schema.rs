//! Entity schema document: what tabular sources exist, how their rows
//! become node ids, and what relationships connect them (§4.1, §4.2).

use indexmap::IndexMap;
use lpg_condition::JoinCondition;
use lpg_core::Value;
use serde_json::Value as Json;

use crate::error::MetadataError;
use crate::json_util::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    Integer,
    Float,
    String,
    Boolean,
}

impl PropertyType {
    fn from_str(raw: &str, what: &str) -> Result<Self, MetadataError> {
        match raw {
            "integer" => Ok(Self::Integer),
            "float" => Ok(Self::Float),
            "string" => Ok(Self::String),
            "boolean" => Ok(Self::Boolean),
            other => Err(MetadataError::SchemaError(format!(
                "{what} has unknown property type '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PropertyDef {
    pub property_type: PropertyType,
    pub alias: Option<String>,
    pub required: bool,
}

#[derive(Debug, Clone)]
pub struct SourceDef {
    pub path: String,
    pub format: Option<String>,
}

#[derive(Debug, Clone)]
pub enum EdgePropertyDef {
    Value(Value),
    Source(String),
}

#[derive(Debug, Clone)]
pub struct RelationshipDef {
    pub name: String,
    pub from_entity: String,
    pub to_entity: String,
    pub join_condition: JoinCondition,
    pub properties: IndexMap<String, EdgePropertyDef>,
}

#[derive(Debug, Clone)]
pub struct EntityDef {
    pub name: String,
    pub source: SourceDef,
    pub id_field: Option<String>,
    pub id_template: Option<String>,
    pub properties: IndexMap<String, PropertyDef>,
}

impl EntityDef {
    /// Exactly one of `id_field`/`id_template` must be present; this is
    /// the synthesis strategy the builder picks between (§6).
    pub fn has_valid_id_strategy(&self) -> bool {
        self.id_field.is_some() != self.id_template.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Schema {
    pub version: String,
    pub entities: Vec<EntityDef>,
    pub relationships: Vec<RelationshipDef>,
}

impl Schema {
    pub fn from_json(json: &Json) -> Result<Self, MetadataError> {
        let obj = as_object(json, "schema document")?;
        let version = require_str(obj, "version", "schema document")?.to_string();

        let entities_json = require_array(obj, "entities", "schema document")?;
        if entities_json.is_empty() {
            return Err(MetadataError::SchemaError("schema document must declare at least one entity".into()));
        }
        let mut entities = Vec::with_capacity(entities_json.len());
        let mut seen_names = std::collections::HashSet::new();
        for entity_json in entities_json {
            let entity = parse_entity(entity_json)?;
            if !seen_names.insert(entity.name.clone()) {
                return Err(MetadataError::SchemaError(format!("duplicate entity name '{}'", entity.name)));
            }
            entities.push(entity);
        }

        let mut relationships = Vec::new();
        if let Some(relationships_json) = obj.get("relationships") {
            let relationships_json = relationships_json
                .as_array()
                .ok_or_else(|| MetadataError::SchemaError("'relationships' must be an array".into()))?;
            for rel_json in relationships_json {
                let rel = parse_relationship(rel_json, &seen_names)?;
                relationships.push(rel);
            }
        }

        Ok(Self { version, entities, relationships })
    }

    pub fn entity_by_name(&self, name: &str) -> Option<&EntityDef> {
        self.entities.iter().find(|e| e.name == name)
    }
}

fn parse_entity(json: &Json) -> Result<EntityDef, MetadataError> {
    let obj = as_object(json, "entity definition")?;
    let name = require_str(obj, "name", "entity definition")?.to_string();
    let what = format!("entity '{name}'");

    let source_obj = require_object(obj, "source", &what)?;
    let source = SourceDef {
        path: require_str(source_obj, "path", &format!("{what}.source"))?.to_string(),
        format: optional_str(source_obj, "format").map(str::to_string),
    };

    let id_field = optional_str(obj, "id_field").map(str::to_string);
    let id_template = optional_str(obj, "id_template").map(str::to_string);

    let properties_obj = require_object(obj, "properties", &what)?;
    if properties_obj.is_empty() {
        return Err(MetadataError::SchemaError(format!("{what} must declare at least one property")));
    }
    let mut properties = IndexMap::new();
    for (prop_name, prop_json) in properties_obj {
        let prop_obj = as_object(prop_json, &format!("{what}.properties.{prop_name}"))?;
        let type_str = require_str(prop_obj, "type", &format!("{what}.properties.{prop_name}"))?;
        let property_type = PropertyType::from_str(type_str, &format!("{what}.properties.{prop_name}"))?;
        properties.insert(
            prop_name.clone(),
            PropertyDef {
                property_type,
                alias: optional_str(prop_obj, "alias").map(str::to_string),
                required: optional_bool(prop_obj, "required", false),
            },
        );
    }

    let entity = EntityDef { name, source, id_field, id_template, properties };
    if !entity.has_valid_id_strategy() {
        return Err(MetadataError::SchemaError(format!(
            "entity '{}' must declare exactly one of id_field/id_template",
            entity.name
        )));
    }
    Ok(entity)
}

fn parse_relationship(json: &Json, known_entities: &std::collections::HashSet<String>) -> Result<RelationshipDef, MetadataError> {
    let obj = as_object(json, "relationship definition")?;
    let name = require_str(obj, "name", "relationship definition")?.to_string();
    let what = format!("relationship '{name}'");

    let from_entity = require_str(obj, "from_entity", &what)?.to_string();
    let to_entity = require_str(obj, "to_entity", &what)?.to_string();
    for entity_name in [&from_entity, &to_entity] {
        if !known_entities.contains(entity_name) {
            return Err(MetadataError::SchemaError(format!(
                "{what} references undeclared entity '{entity_name}'"
            )));
        }
    }

    let condition_json = obj
        .get("join_condition")
        .ok_or_else(|| MetadataError::SchemaError(format!("{what} is missing required field 'join_condition'")))?;
    let join_condition = lpg_condition::parse(condition_json)?;

    let mut properties = IndexMap::new();
    if let Some(props_json) = obj.get("properties") {
        let props_obj = as_object(props_json, &format!("{what}.properties"))?;
        for (prop_name, prop_json) in props_obj {
            properties.insert(prop_name.clone(), parse_edge_property(prop_json, &what, prop_name)?);
        }
    }

    Ok(RelationshipDef { name, from_entity, to_entity, join_condition, properties })
}

fn parse_edge_property(json: &Json, what: &str, prop_name: &str) -> Result<EdgePropertyDef, MetadataError> {
    let obj = as_object(json, &format!("{what}.properties.{prop_name}"))?;
    if let Some(source) = optional_str(obj, "source") {
        return Ok(EdgePropertyDef::Source(source.to_string()));
    }
    if let Some(value) = obj.get("value") {
        return Ok(EdgePropertyDef::Value(json_to_value(value)));
    }
    Err(MetadataError::SchemaError(format!(
        "{what}.properties.{prop_name} must declare 'value' or 'source'"
    )))
}

pub fn json_to_value(json: &Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else {
                Value::Float(n.as_f64().unwrap_or_default())
            }
        }
        Json::String(s) => Value::String(s.clone()),
        other => Value::String(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_schema() -> Json {
        json!({
            "version": "1.0",
            "entities": [
                {
                    "name": "account",
                    "source": {"path": "accounts.csv"},
                    "id_field": "aid",
                    "properties": {
                        "aid": {"type": "string", "required": true},
                        "balance": {"type": "float"}
                    }
                },
                {
                    "name": "facility",
                    "source": {"path": "facilities.csv"},
                    "id_template": "fac-{fid}",
                    "properties": {
                        "fid": {"type": "string", "required": true}
                    }
                }
            ],
            "relationships": [
                {
                    "name": "owns",
                    "from_entity": "account",
                    "to_entity": "facility",
                    "join_condition": {"type": "field_match", "from_field": "aid", "to_field": "aid"}
                }
            ]
        })
    }

    #[test]
    fn parses_entities_and_relationships() {
        let schema = Schema::from_json(&sample_schema()).unwrap();
        assert_eq!(schema.entities.len(), 2);
        assert_eq!(schema.relationships.len(), 1);
        assert!(schema.entity_by_name("account").is_some());
    }

    #[test]
    fn rejects_entity_with_both_id_strategies() {
        let mut json = sample_schema();
        json["entities"][0]["id_template"] = json!("acct-{aid}");
        assert!(Schema::from_json(&json).is_err());
    }

    #[test]
    fn rejects_relationship_to_unknown_entity() {
        let mut json = sample_schema();
        json["relationships"][0]["to_entity"] = json!("ghost");
        assert!(Schema::from_json(&json).is_err());
    }

    #[test]
    fn rejects_duplicate_entity_names() {
        let mut json = sample_schema();
        let dup = json["entities"][0].clone();
        json["entities"].as_array_mut().unwrap().push(dup);
        assert!(Schema::from_json(&json).is_err());
    }
}
