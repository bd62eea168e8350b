//! File-system entry point: reads a schema and a transformations document
//! from disk and hands back validated, in-memory structures.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::MetadataError;
use crate::schema::Schema;
use crate::transformations::TransformationsDoc;

#[derive(Debug, Default)]
pub struct MetadataLoader;

impl MetadataLoader {
    pub fn new() -> Self {
        Self
    }

    pub fn load_schema(&self, path: impl AsRef<Path>) -> Result<Schema, MetadataError> {
        let path = path.as_ref();
        let raw = read_to_string(path)?;
        let json = parse_json(&raw, path)?;
        let schema = Schema::from_json(&json)?;
        info!(entities = schema.entities.len(), relationships = schema.relationships.len(), "schema loaded");
        Ok(schema)
    }

    pub fn load_transformations(&self, path: impl AsRef<Path>) -> Result<TransformationsDoc, MetadataError> {
        let path = path.as_ref();
        let raw = read_to_string(path)?;
        let json = parse_json(&raw, path)?;
        let doc = TransformationsDoc::from_json(&json)?;
        info!(rules = doc.rules.len(), "transformations loaded");
        Ok(doc)
    }
}

fn read_to_string(path: &Path) -> Result<String, MetadataError> {
    fs::read_to_string(path).map_err(|source| MetadataError::Io { path: path.display().to_string(), source })
}

fn parse_json(raw: &str, path: &Path) -> Result<serde_json::Value, MetadataError> {
    serde_json::from_str(raw).map_err(|source| MetadataError::Json { path: path.display().to_string(), source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_schema_reports_missing_file() {
        let loader = MetadataLoader::new();
        let result = loader.load_schema("/nonexistent/schema.json");
        assert!(matches!(result, Err(MetadataError::Io { .. })));
    }

    #[test]
    fn load_schema_reports_invalid_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        use std::io::Write;
        file.write_all(b"not json").unwrap();
        let loader = MetadataLoader::new();
        let result = loader.load_schema(file.path());
        assert!(matches!(result, Err(MetadataError::Json { .. })));
    }
}
