//! Transformation rule documents: the four rule kinds that the rule
//! engine applies in declared order (§4.5, §7).

use indexmap::IndexMap;
use lpg_condition::JoinCondition;
use lpg_core::Value;
use serde_json::Value as Json;

use crate::error::MetadataError;
use crate::json_util::*;
use crate::schema::json_to_value;

#[derive(Debug, Clone)]
pub enum PropertyValueDef {
    Value(Value),
    Source(String),
    Expression(String),
}

impl PropertyValueDef {
    fn from_json(json: &Json, what: &str) -> Result<Self, MetadataError> {
        let obj = as_object(json, what)?;
        if let Some(expr) = optional_str(obj, "expression") {
            return Ok(Self::Expression(expr.to_string()));
        }
        if let Some(source) = optional_str(obj, "source") {
            return Ok(Self::Source(source.to_string()));
        }
        if let Some(value) = obj.get("value") {
            return Ok(Self::Value(json_to_value(value)));
        }
        Err(MetadataError::RuleDocumentError(format!("{what} must declare 'value', 'source', or 'expression'")))
    }
}

#[derive(Debug, Clone)]
pub struct DerivedPropertyDef {
    pub def: PropertyValueDef,
    pub round: Option<i32>,
}

impl DerivedPropertyDef {
    fn from_json(json: &Json, what: &str) -> Result<Self, MetadataError> {
        Ok(Self { def: PropertyValueDef::from_json(json, what)?, round: optional_i32(as_object(json, what)?, "round") })
    }
}

#[derive(Debug, Clone)]
pub struct DerivedEdgeDef {
    pub from: String,
    pub to: String,
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct CrossLinkRule {
    pub from_entity: String,
    pub to_entity: String,
    pub link_label: String,
    pub condition: JoinCondition,
    pub properties: IndexMap<String, DerivedPropertyDef>,
}

#[derive(Debug, Clone)]
pub struct DerivedNodeRule {
    pub output_label: String,
    /// alias -> source node label, bound into the join context under the alias name.
    pub source_entities: IndexMap<String, String>,
    pub join_condition: JoinCondition,
    pub node_id_template: String,
    pub properties: IndexMap<String, DerivedPropertyDef>,
    pub edges: Vec<DerivedEdgeDef>,
}

#[derive(Debug, Clone)]
pub struct ConditionalRule {
    pub condition: String,
    pub value: Value,
}

#[derive(Debug, Clone)]
pub enum EnrichDef {
    Value(Value),
    Expression(String),
    Rules(Vec<ConditionalRule>),
}

#[derive(Debug, Clone)]
pub struct Enrichment {
    pub property: String,
    pub def: EnrichDef,
    pub round: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct EnrichPropertiesRule {
    pub target_label: String,
    pub enrichments: Vec<Enrichment>,
}

#[derive(Debug, Clone)]
pub struct AggregationDef {
    pub function: String,
    pub field: Option<String>,
    pub round: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct AggregationRule {
    pub output_label: String,
    pub group_by_label: String,
    pub aggregate_label: String,
    pub node_id_template: String,
    pub aggregations: IndexMap<String, AggregationDef>,
    pub properties: IndexMap<String, DerivedPropertyDef>,
    pub edges: Vec<DerivedEdgeDef>,
}

#[derive(Debug, Clone)]
pub enum RuleKind {
    CrossLink(CrossLinkRule),
    DerivedNode(DerivedNodeRule),
    EnrichProperties(EnrichPropertiesRule),
    Aggregation(AggregationRule),
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub id: String,
    pub enabled: bool,
    pub description: Option<String>,
    pub kind: RuleKind,
}

#[derive(Debug, Clone)]
pub struct TransformationsDoc {
    pub version: String,
    pub rules: Vec<Rule>,
}

impl TransformationsDoc {
    pub fn from_json(json: &Json) -> Result<Self, MetadataError> {
        let obj = as_object(json, "transformations document")?;
        let version = require_str(obj, "version", "transformations document")?.to_string();
        let rules_json = require_array(obj, "transformations", "transformations document")?;

        let mut rules = Vec::with_capacity(rules_json.len());
        let mut seen_ids = std::collections::HashSet::new();
        for rule_json in rules_json {
            let rule = parse_rule(rule_json)?;
            if !seen_ids.insert(rule.id.clone()) {
                return Err(MetadataError::DuplicateRule(rule.id));
            }
            rules.push(rule);
        }
        Ok(Self { version, rules })
    }

    pub fn enabled_rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|r| r.enabled)
    }
}

fn parse_rule(json: &Json) -> Result<Rule, MetadataError> {
    let obj = as_object(json, "transformation rule")?;
    let id = require_str(obj, "id", "transformation rule")?.to_string();
    let what = format!("rule '{id}'");
    let rule_type = require_str(obj, "type", &what)?;
    let enabled = optional_bool(obj, "enabled", true);
    let description = optional_str(obj, "description").map(str::to_string);

    let kind = match rule_type {
        "cross_link" => RuleKind::CrossLink(parse_cross_link(obj, &what)?),
        "derived_node" => RuleKind::DerivedNode(parse_derived_node(obj, &what)?),
        "enrich_properties" => RuleKind::EnrichProperties(parse_enrich_properties(obj, &what)?),
        "aggregation" => RuleKind::Aggregation(parse_aggregation(obj, &what)?),
        other => return Err(MetadataError::RuleDocumentError(format!("{what} has unknown type '{other}'"))),
    };

    Ok(Rule { id, enabled, description, kind })
}

fn parse_properties(obj: &serde_json::Map<String, Json>, what: &str) -> Result<IndexMap<String, DerivedPropertyDef>, MetadataError> {
    let mut properties = IndexMap::new();
    if let Some(props_json) = obj.get("properties") {
        let props_obj = as_object(props_json, &format!("{what}.properties"))?;
        for (name, def_json) in props_obj {
            properties.insert(name.clone(), DerivedPropertyDef::from_json(def_json, &format!("{what}.properties.{name}"))?);
        }
    }
    Ok(properties)
}

fn parse_edges(obj: &serde_json::Map<String, Json>, what: &str) -> Result<Vec<DerivedEdgeDef>, MetadataError> {
    let mut edges = Vec::new();
    if let Some(edges_json) = obj.get("edges") {
        let edges_json = edges_json
            .as_array()
            .ok_or_else(|| MetadataError::RuleDocumentError(format!("{what}.edges must be an array")))?;
        for edge_json in edges_json {
            let edge_what = format!("{what}.edges[]");
            let edge_obj = as_object(edge_json, &edge_what)?;
            edges.push(DerivedEdgeDef {
                from: require_str(edge_obj, "from", &edge_what)?.to_string(),
                to: require_str(edge_obj, "to", &edge_what)?.to_string(),
                label: require_str(edge_obj, "label", &edge_what)?.to_string(),
            });
        }
    }
    Ok(edges)
}

fn parse_cross_link(obj: &serde_json::Map<String, Json>, what: &str) -> Result<CrossLinkRule, MetadataError> {
    let condition_json = obj
        .get("condition")
        .ok_or_else(|| MetadataError::RuleDocumentError(format!("{what} is missing required field 'condition'")))?;
    Ok(CrossLinkRule {
        from_entity: require_str(obj, "from_entity", what)?.to_string(),
        to_entity: require_str(obj, "to_entity", what)?.to_string(),
        link_label: require_str(obj, "link_label", what)?.to_string(),
        condition: lpg_condition::parse(condition_json)?,
        properties: parse_properties(obj, what)?,
    })
}

fn parse_derived_node(obj: &serde_json::Map<String, Json>, what: &str) -> Result<DerivedNodeRule, MetadataError> {
    let source_entities_obj = require_object(obj, "source_entities", what)?;
    if source_entities_obj.is_empty() {
        return Err(MetadataError::RuleDocumentError(format!("{what}.source_entities must not be empty")));
    }
    let mut source_entities = IndexMap::new();
    for (alias, label_json) in source_entities_obj {
        let label = label_json
            .as_str()
            .ok_or_else(|| MetadataError::RuleDocumentError(format!("{what}.source_entities.{alias} must be a string")))?;
        source_entities.insert(alias.clone(), label.to_string());
    }

    let condition_json = obj
        .get("join_condition")
        .ok_or_else(|| MetadataError::RuleDocumentError(format!("{what} is missing required field 'join_condition'")))?;

    Ok(DerivedNodeRule {
        output_label: require_str(obj, "output_entity", what)?.to_string(),
        source_entities,
        join_condition: lpg_condition::parse(condition_json)?,
        node_id_template: require_str(obj, "node_id_template", what)?.to_string(),
        properties: parse_properties(obj, what)?,
        edges: parse_edges(obj, what)?,
    })
}

fn parse_enrich_properties(obj: &serde_json::Map<String, Json>, what: &str) -> Result<EnrichPropertiesRule, MetadataError> {
    let target_label = require_str(obj, "target_entity", what)?.to_string();
    let enrichments_json = require_array(obj, "enrichments", what)?;
    if enrichments_json.is_empty() {
        return Err(MetadataError::RuleDocumentError(format!("{what}.enrichments must not be empty")));
    }
    let mut enrichments = Vec::with_capacity(enrichments_json.len());
    for enrich_json in enrichments_json {
        let enrich_obj = as_object(enrich_json, &format!("{what}.enrichments[]"))?;
        let property = require_str(enrich_obj, "property", &format!("{what}.enrichments[]"))?.to_string();
        let enrich_what = format!("{what}.enrichments.{property}");
        let round = optional_i32(enrich_obj, "round");
        let def = if let Some(rules_json) = enrich_obj.get("rules") {
            let rules_json = rules_json
                .as_array()
                .ok_or_else(|| MetadataError::RuleDocumentError(format!("{enrich_what}.rules must be an array")))?;
            if rules_json.is_empty() {
                return Err(MetadataError::RuleDocumentError(format!("{enrich_what}.rules must not be empty")));
            }
            let mut conditional_rules = Vec::with_capacity(rules_json.len());
            for rule_json in rules_json {
                let rule_obj = as_object(rule_json, &format!("{enrich_what}.rules[]"))?;
                let value_json = rule_obj
                    .get("value")
                    .ok_or_else(|| MetadataError::RuleDocumentError(format!("{enrich_what}.rules[] is missing 'value'")))?;
                conditional_rules.push(ConditionalRule {
                    condition: require_str(rule_obj, "condition", &format!("{enrich_what}.rules[]"))?.to_string(),
                    value: json_to_value(value_json),
                });
            }
            EnrichDef::Rules(conditional_rules)
        } else if let Some(expr) = optional_str(enrich_obj, "expression") {
            EnrichDef::Expression(expr.to_string())
        } else if let Some(value) = enrich_obj.get("value") {
            EnrichDef::Value(json_to_value(value))
        } else {
            return Err(MetadataError::RuleDocumentError(format!(
                "{enrich_what} must declare 'value', 'expression', or 'rules'"
            )));
        };
        enrichments.push(Enrichment { property, def, round });
    }
    Ok(EnrichPropertiesRule { target_label, enrichments })
}

fn parse_aggregation(obj: &serde_json::Map<String, Json>, what: &str) -> Result<AggregationRule, MetadataError> {
    let aggregations_obj = require_object(obj, "aggregations", what)?;
    if aggregations_obj.is_empty() {
        return Err(MetadataError::RuleDocumentError(format!("{what}.aggregations must not be empty")));
    }
    let mut aggregations = IndexMap::new();
    for (name, def_json) in aggregations_obj {
        let def_obj = as_object(def_json, &format!("{what}.aggregations.{name}"))?;
        aggregations.insert(
            name.clone(),
            AggregationDef {
                function: require_str(def_obj, "function", &format!("{what}.aggregations.{name}"))?.to_string(),
                field: optional_str(def_obj, "field").map(str::to_string),
                round: optional_i32(def_obj, "round"),
            },
        );
    }

    Ok(AggregationRule {
        output_label: require_str(obj, "output_entity", what)?.to_string(),
        group_by_label: require_str(obj, "group_by_entity", what)?.to_string(),
        aggregate_label: require_str(obj, "aggregate_entity", what)?.to_string(),
        node_id_template: require_str(obj, "node_id_template", what)?.to_string(),
        aggregations,
        properties: parse_properties(obj, what)?,
        edges: parse_edges(obj, what)?,
    })
}
