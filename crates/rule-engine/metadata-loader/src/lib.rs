//! Strict loading and validation of schema and transformations documents
//! (§4.1, §4.2, §4.5).

pub mod error;
mod json_util;
pub mod loader;
pub mod schema;
pub mod transformations;

pub use error::{MetadataError, MetadataResult};
pub use loader::MetadataLoader;
pub use schema::{EdgePropertyDef, EntityDef, PropertyDef, PropertyType, RelationshipDef, Schema, SourceDef};
pub use transformations::{
    AggregationDef, AggregationRule, ConditionalRule, CrossLinkRule, DerivedEdgeDef, DerivedNodeRule,
    DerivedPropertyDef, EnrichDef, EnrichPropertiesRule, Enrichment, PropertyValueDef, Rule, RuleKind,
    TransformationsDoc,
};
