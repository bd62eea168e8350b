//! Ordered property maps attached to nodes and edges.

use crate::value::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A property name to value mapping that preserves insertion order.
///
/// Order matters here, not just for readability: report generation walks
/// properties in the order they were first set, and the builder relies on
/// that order matching the declared order of the schema's `properties` map.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PropertyMap(IndexMap<String, Value>);

impl PropertyMap {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Adds a property if absent, or overwrites it in place if present.
    /// Overwriting never moves the key to the end, matching (I4): a
    /// property's position is fixed by its first write.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        if let Some(slot) = self.0.get_mut(&name) {
            *slot = value;
        } else {
            self.0.insert(name, value);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Value)> for PropertyMap {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_order_preserved_across_overwrite() {
        let mut props = PropertyMap::new();
        props.set("a", Value::Int(1));
        props.set("b", Value::Int(2));
        props.set("a", Value::Int(99));

        let keys: Vec<&str> = props.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(props.get("a"), Some(&Value::Int(99)));
    }
}
