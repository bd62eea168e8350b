//! The in-memory labeled property multigraph.

use crate::error::{StoreError, StoreResult};
use crate::property::PropertyMap;
use indexmap::IndexMap;

/// Opaque handle returned by [`Graph::add_edge`]. Carries no meaning beyond
/// identifying one particular edge insertion; two edges between the same
/// endpoints with the same label get distinct keys (Q4 in DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeKey(usize);

#[derive(Debug, Clone)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub properties: PropertyMap,
}

#[derive(Debug, Clone)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub label: String,
    pub properties: PropertyMap,
}

#[derive(Debug, Clone, Default)]
pub struct GraphStats {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub nodes_by_label: IndexMap<String, usize>,
    pub edges_by_label: IndexMap<String, usize>,
}

/// Owns every node, edge, and property map for the duration of one run.
///
/// Nothing here is ever deleted (§3 "Lifecycles"): rules may add nodes, add
/// edges, and overwrite properties, but never remove them. That lets
/// `successors`/`predecessors`/`*_edges` hand back plain borrowed slices and
/// indices instead of defensive copies.
#[derive(Debug, Default)]
pub struct Graph {
    nodes: IndexMap<String, Node>,
    label_index: IndexMap<String, Vec<String>>,
    edges: Vec<Edge>,
    out_adjacency: IndexMap<String, Vec<usize>>,
    in_adjacency: IndexMap<String, Vec<usize>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(
        &mut self,
        id: impl Into<String>,
        label: impl Into<String>,
        mut properties: PropertyMap,
    ) -> StoreResult<()> {
        let id = id.into();
        if self.nodes.contains_key(&id) {
            return Err(StoreError::DuplicateNode(id));
        }
        let label = label.into();
        properties.set("label", crate::value::Value::String(label.clone()));
        self.label_index
            .entry(label.clone())
            .or_default()
            .push(id.clone());
        self.nodes.insert(
            id.clone(),
            Node {
                id,
                label,
                properties,
            },
        );
        Ok(())
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get_node(&self, id: &str) -> StoreResult<&Node> {
        self.nodes
            .get(id)
            .ok_or_else(|| StoreError::MissingNode(id.to_string()))
    }

    /// Adds a property on first write, or overwrites it in place. Fails if
    /// the node does not exist; the value itself is never validated beyond
    /// being a legal `Value` (I4), which the type system already enforces.
    pub fn set_property(
        &mut self,
        id: &str,
        name: impl Into<String>,
        value: crate::value::Value,
    ) -> StoreResult<()> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| StoreError::MissingNode(id.to_string()))?;
        node.properties.set(name, value);
        Ok(())
    }

    pub fn add_edge(
        &mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        label: impl Into<String>,
        properties: PropertyMap,
    ) -> StoreResult<EdgeKey> {
        let from = from.into();
        let to = to.into();
        if !self.nodes.contains_key(&from) {
            return Err(StoreError::MissingNode(from));
        }
        if !self.nodes.contains_key(&to) {
            return Err(StoreError::MissingNode(to));
        }
        let label = label.into();
        let index = self.edges.len();
        self.out_adjacency.entry(from.clone()).or_default().push(index);
        self.in_adjacency.entry(to.clone()).or_default().push(index);
        self.edges.push(Edge {
            from,
            to,
            label,
            properties,
        });
        Ok(EdgeKey(index))
    }

    pub fn nodes_by_label(&self, label: &str) -> &[String] {
        self.label_index
            .get(label)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn successors(&self, id: &str) -> impl Iterator<Item = &str> {
        self.out_adjacency
            .get(id)
            .into_iter()
            .flatten()
            .map(move |&i| self.edges[i].to.as_str())
    }

    pub fn predecessors(&self, id: &str) -> impl Iterator<Item = &str> {
        self.in_adjacency
            .get(id)
            .into_iter()
            .flatten()
            .map(move |&i| self.edges[i].from.as_str())
    }

    pub fn out_edges(&self, id: &str) -> impl Iterator<Item = &Edge> {
        self.out_adjacency
            .get(id)
            .into_iter()
            .flatten()
            .map(move |&i| &self.edges[i])
    }

    pub fn in_edges(&self, id: &str) -> impl Iterator<Item = &Edge> {
        self.in_adjacency
            .get(id)
            .into_iter()
            .flatten()
            .map(move |&i| &self.edges[i])
    }

    /// Successors of `id` whose node label is exactly `label`, in edge
    /// insertion order. Used by the aggregation rule to collect group
    /// members without materializing the full successor list first.
    pub fn successors_with_label<'a>(
        &'a self,
        id: &'a str,
        label: &'a str,
    ) -> impl Iterator<Item = &'a Node> + 'a {
        self.successors(id)
            .filter_map(move |sid| self.nodes.get(sid))
            .filter(move |n| n.label == label)
    }

    pub fn stats(&self) -> GraphStats {
        let mut nodes_by_label = IndexMap::new();
        for (label, ids) in &self.label_index {
            nodes_by_label.insert(label.clone(), ids.len());
        }
        let mut edges_by_label: IndexMap<String, usize> = IndexMap::new();
        for edge in &self.edges {
            *edges_by_label.entry(edge.label.clone()).or_insert(0) += 1;
        }
        GraphStats {
            total_nodes: self.nodes.len(),
            total_edges: self.edges.len(),
            nodes_by_label,
            edges_by_label,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn props(pairs: &[(&str, Value)]) -> PropertyMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn duplicate_node_rejected() {
        let mut g = Graph::new();
        g.add_node("a1", "A", PropertyMap::new()).unwrap();
        let err = g.add_node("a1", "A", PropertyMap::new()).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateNode(id) if id == "a1"));
    }

    #[test]
    fn label_index_preserves_insertion_order() {
        let mut g = Graph::new();
        g.add_node("a3", "A", PropertyMap::new()).unwrap();
        g.add_node("a1", "A", PropertyMap::new()).unwrap();
        g.add_node("a2", "A", PropertyMap::new()).unwrap();
        assert_eq!(g.nodes_by_label("A"), &["a3", "a1", "a2"]);
        assert!(g.nodes_by_label("B").is_empty());
    }

    #[test]
    fn edge_requires_both_endpoints() {
        let mut g = Graph::new();
        g.add_node("a1", "A", PropertyMap::new()).unwrap();
        let err = g
            .add_edge("a1", "missing", "HAS", PropertyMap::new())
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingNode(id) if id == "missing"));
    }

    #[test]
    fn successors_follow_edge_insertion_order() {
        let mut g = Graph::new();
        for id in ["a1", "b1", "b2"] {
            g.add_node(id, "X", PropertyMap::new()).unwrap();
        }
        g.add_edge("a1", "b2", "HAS", PropertyMap::new()).unwrap();
        g.add_edge("a1", "b1", "HAS", PropertyMap::new()).unwrap();
        let succ: Vec<&str> = g.successors("a1").collect();
        assert_eq!(succ, vec!["b2", "b1"]);
    }

    #[test]
    fn stats_count_by_label() {
        let mut g = Graph::new();
        g.add_node("a1", "A", props(&[("x", Value::Int(1))])).unwrap();
        g.add_node("a2", "A", PropertyMap::new()).unwrap();
        g.add_node("b1", "B", PropertyMap::new()).unwrap();
        g.add_edge("a1", "b1", "HAS", PropertyMap::new()).unwrap();
        g.add_edge("a2", "b1", "HAS", PropertyMap::new()).unwrap();

        let stats = g.stats();
        assert_eq!(stats.total_nodes, 3);
        assert_eq!(stats.total_edges, 2);
        assert_eq!(stats.nodes_by_label.get("A"), Some(&2));
        assert_eq!(stats.edges_by_label.get("HAS"), Some(&2));
    }
}
