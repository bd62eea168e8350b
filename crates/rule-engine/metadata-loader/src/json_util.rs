//! Small extraction helpers shared by the schema and transformations
//! parsers; every miss turns into a `SchemaError`/`RuleDocumentError` with
//! the offending key named, rather than a generic serde deserialize failure.

use crate::error::MetadataError;
use serde_json::{Map, Value as Json};

pub fn as_object<'a>(json: &'a Json, what: &str) -> Result<&'a Map<String, Json>, MetadataError> {
    json.as_object()
        .ok_or_else(|| MetadataError::SchemaError(format!("{what} must be an object")))
}

pub fn require_str<'a>(obj: &'a Map<String, Json>, key: &str, what: &str) -> Result<&'a str, MetadataError> {
    obj.get(key)
        .and_then(Json::as_str)
        .ok_or_else(|| MetadataError::SchemaError(format!("{what} is missing required string field '{key}'")))
}

pub fn require_array<'a>(obj: &'a Map<String, Json>, key: &str, what: &str) -> Result<&'a Vec<Json>, MetadataError> {
    obj.get(key)
        .and_then(Json::as_array)
        .ok_or_else(|| MetadataError::SchemaError(format!("{what} is missing required array field '{key}'")))
}

pub fn require_object<'a>(
    obj: &'a Map<String, Json>,
    key: &str,
    what: &str,
) -> Result<&'a Map<String, Json>, MetadataError> {
    obj.get(key)
        .and_then(Json::as_object)
        .ok_or_else(|| MetadataError::SchemaError(format!("{what} is missing required object field '{key}'")))
}

pub fn optional_str<'a>(obj: &'a Map<String, Json>, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Json::as_str)
}

pub fn optional_bool(obj: &Map<String, Json>, key: &str, default: bool) -> bool {
    obj.get(key).and_then(Json::as_bool).unwrap_or(default)
}

pub fn optional_i32(obj: &Map<String, Json>, key: &str) -> Option<i32> {
    obj.get(key).and_then(Json::as_i64).map(|n| n as i32)
}
