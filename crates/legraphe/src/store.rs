// Field graph store
//
// Attributed directed graph over variable and label nodes. Nodes are
// addressed by their semantic key; edges are unique per ordered endpoint
// pair and are soft-deleted rather than removed.

use crate::error::{GraphError, Result};
use crate::model::{
    Domain, Edge, EdgeId, EdgeKind, FieldType, Model, Node, NodeId, NodeKey, NodeKind,
};
use crate::normalize::{is_shadow, normalize_label};
use petgraph::stable_graph::StableGraph;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{BTreeSet, HashMap};
use tracing::trace;

/// Field-mapping graph
///
/// Owns every node and edge for the lifetime of one reconciliation run.
#[derive(Debug, Clone, Default)]
pub struct FieldGraph {
    /// Internal graph structure
    graph: StableGraph<Node, Edge>,

    /// Semantic key to node ID mapping
    index: HashMap<NodeKey, NodeId>,
}

impl FieldGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or merge a variable node
    ///
    /// A variable seen before must carry the same type; the `model` flag is
    /// set on every call.
    pub fn add_variable(
        &mut self,
        domain: Domain,
        name: &str,
        field_type: FieldType,
        model: Model,
    ) -> Result<NodeId> {
        if !domain.is_vocabulary() {
            return Err(GraphError::InvalidDomain {
                domain,
                name: name.to_string(),
            });
        }

        let key = NodeKey::new(domain, name);
        let id = match self.index.get(&key).copied() {
            Some(id) => {
                let existing = self.graph[id].field_type();
                if existing != Some(field_type) {
                    return Err(GraphError::TypeMismatch {
                        domain,
                        name: name.to_string(),
                        existing: existing.unwrap_or(field_type),
                        declared: field_type,
                    });
                }
                id
            }
            None => {
                trace!(%key, %field_type, "new variable");
                self.insert_node(Node::variable(key, field_type))
            }
        };

        if let NodeKind::Variable { models, .. } = &mut self.graph[id].kind {
            models.set(model);
        }
        Ok(id)
    }

    /// Insert a mapping edge, plus its reverse when `bidirectional`
    ///
    /// Idempotent per ordered endpoint pair.
    pub fn add_mapping(&mut self, from: &NodeKey, to: &NodeKey, bidirectional: bool) -> Result<()> {
        let from_id = self.require_variable(from)?;
        let to_id = self.require_variable(to)?;

        self.ensure_edge(from_id, to_id, Edge::mapping);
        if bidirectional {
            self.ensure_edge(to_id, from_id, Edge::mapping);
        }
        Ok(())
    }

    /// Attach a label to an existing variable
    ///
    /// Creates the literal label and its normalized form (one node when they
    /// coincide), each with a reference edge to the variable.
    pub fn add_label(&mut self, domain: Domain, name: &str, label: &str) -> Result<()> {
        let target = NodeKey::new(domain, name);
        let target_id = match self.index.get(&target) {
            Some(&id) if !self.graph[id].is_label() => id,
            _ => {
                return Err(GraphError::DanglingLabel {
                    domain,
                    name: name.to_string(),
                    label: label.to_string(),
                })
            }
        };

        let normalized = normalize_label(label);
        let mut forms = vec![label.to_string()];
        if normalized != label {
            forms.push(normalized);
        }

        for form in forms {
            let key = NodeKey::label(form.as_str());
            let label_id = match self.index.get(&key).copied() {
                Some(id) => id,
                None => self.insert_node(Node::label(form.as_str(), is_shadow(&form))),
            };
            self.ensure_edge(label_id, target_id, Edge::label_reference);
        }
        Ok(())
    }

    /// Find node by key
    pub fn node_id(&self, key: &NodeKey) -> Option<NodeId> {
        self.index.get(key).copied()
    }

    /// Get node by ID
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.graph.node_weight(id)
    }

    /// Get node by key
    pub fn get(&self, key: &NodeKey) -> Option<&Node> {
        self.node_id(key).and_then(|id| self.node(id))
    }

    /// Get edge by ID
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.graph.edge_weight(id)
    }

    pub(crate) fn edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
        self.graph.edge_weight_mut(id)
    }

    /// Source and target of an edge
    pub fn edge_endpoints(&self, id: EdgeId) -> Option<(NodeId, NodeId)> {
        self.graph.edge_endpoints(id)
    }

    /// Edge between two nodes, if any
    pub fn find_edge(&self, from: NodeId, to: NodeId) -> Option<EdgeId> {
        self.graph.find_edge(from, to)
    }

    /// Edge between two keyed nodes, if any
    pub fn find_edge_by_key(&self, from: &NodeKey, to: &NodeKey) -> Option<&Edge> {
        let from_id = self.node_id(from)?;
        let to_id = self.node_id(to)?;
        self.find_edge(from_id, to_id).and_then(|id| self.edge(id))
    }

    /// Check for a direct edge
    pub fn has_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.find_edge(from, to).is_some()
    }

    /// Get node count
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get edge count
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Outgoing edges as `(edge, target)` pairs
    pub fn outgoing(&self, id: NodeId) -> Vec<(EdgeId, NodeId)> {
        self.graph
            .edges_directed(id, Direction::Outgoing)
            .map(|e| (e.id(), e.target()))
            .collect()
    }

    /// Incoming edges as `(edge, source)` pairs
    pub fn incoming(&self, id: NodeId) -> Vec<(EdgeId, NodeId)> {
        self.graph
            .edges_directed(id, Direction::Incoming)
            .map(|e| (e.id(), e.source()))
            .collect()
    }

    /// Domains reached by the outgoing edges of a node
    pub fn out_domains(&self, id: NodeId) -> BTreeSet<Domain> {
        self.graph
            .neighbors_directed(id, Direction::Outgoing)
            .filter_map(|n| self.node(n).map(Node::domain))
            .collect()
    }

    /// All node IDs, sorted by key
    pub fn sorted_nodes(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.graph.node_indices().collect();
        self.sort_by_key(&mut ids);
        ids
    }

    /// Variable node IDs, sorted by key
    pub fn variables(&self) -> Vec<NodeId> {
        self.sorted_nodes()
            .into_iter()
            .filter(|&id| !self.graph[id].is_label())
            .collect()
    }

    /// Label node IDs, sorted by label text
    pub fn labels(&self) -> Vec<NodeId> {
        self.sorted_nodes()
            .into_iter()
            .filter(|&id| self.graph[id].is_label())
            .collect()
    }

    /// Sort node IDs by their semantic key
    pub fn sort_by_key(&self, ids: &mut [NodeId]) {
        ids.sort_by(|a, b| self.graph[*a].key.cmp(&self.graph[*b].key));
    }

    /// Remove a node together with its edges
    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        let node = self.graph.remove_node(id)?;
        self.index.remove(&node.key);
        Some(node)
    }

    /// Count edges by kind and flags: `(mapping, label_reference, removed, added)`
    pub fn edge_stats(&self) -> (usize, usize, usize, usize) {
        self.graph
            .edge_indices()
            .filter_map(|id| self.graph.edge_weight(id))
            .fold((0, 0, 0, 0), |(m, l, r, a), e| match e.kind {
                EdgeKind::Mapping => (m + 1, l, r + e.removed as usize, a + e.added as usize),
                EdgeKind::LabelReference => (m, l + 1, r + e.removed as usize, a + e.added as usize),
            })
    }

    pub(crate) fn inner(&self) -> &StableGraph<Node, Edge> {
        &self.graph
    }

    pub(crate) fn insert_edge(&mut self, from: NodeId, to: NodeId, edge: Edge) -> EdgeId {
        self.graph.add_edge(from, to, edge)
    }

    fn insert_node(&mut self, node: Node) -> NodeId {
        let key = node.key.clone();
        let id = self.graph.add_node(node);
        self.index.insert(key, id);
        id
    }

    fn ensure_edge(&mut self, from: NodeId, to: NodeId, make: fn() -> Edge) -> EdgeId {
        match self.graph.find_edge(from, to) {
            Some(id) => id,
            None => self.graph.add_edge(from, to, make()),
        }
    }

    fn require_variable(&self, key: &NodeKey) -> Result<NodeId> {
        match self.index.get(key) {
            Some(&id) if !self.graph[id].is_label() => Ok(id),
            _ => Err(GraphError::UnknownVariable {
                domain: key.domain,
                name: key.name.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csl(name: &str) -> NodeKey {
        NodeKey::new(Domain::Csl, name)
    }

    fn model_a(name: &str) -> NodeKey {
        NodeKey::new(Domain::Model(Model::A), name)
    }

    #[test]
    fn test_graph_creation() {
        let graph = FieldGraph::new();
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_add_variable_merges_and_sets_flags() {
        let mut graph = FieldGraph::new();
        let first = graph.add_variable(Domain::Csl, "title", FieldType::Text, Model::A).unwrap();
        let second = graph.add_variable(Domain::Csl, "title", FieldType::Text, Model::B).unwrap();

        assert_eq!(first, second);
        assert_eq!(graph.node_count(), 1);
        match &graph.node(first).unwrap().kind {
            NodeKind::Variable { models, .. } => {
                assert!(models.has(Model::A));
                assert!(models.has(Model::B));
            }
            other => panic!("unexpected node kind: {:?}", other),
        }
    }

    #[test]
    fn test_add_variable_rejects_type_change() {
        let mut graph = FieldGraph::new();
        graph.add_variable(Domain::Csl, "issued", FieldType::Date, Model::A).unwrap();
        let err = graph
            .add_variable(Domain::Csl, "issued", FieldType::Text, Model::B)
            .unwrap_err();

        match err {
            GraphError::TypeMismatch { domain, name, existing, declared } => {
                assert_eq!(domain, Domain::Csl);
                assert_eq!(name, "issued");
                assert_eq!(existing, FieldType::Date);
                assert_eq!(declared, FieldType::Text);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_add_variable_rejects_label_domain() {
        let mut graph = FieldGraph::new();
        let err = graph
            .add_variable(Domain::Label, "title", FieldType::Text, Model::A)
            .unwrap_err();
        assert!(matches!(err, GraphError::InvalidDomain { .. }));
    }

    #[test]
    fn test_add_mapping_is_idempotent() {
        let mut graph = FieldGraph::new();
        graph.add_variable(Domain::Csl, "title", FieldType::Text, Model::A).unwrap();
        graph.add_variable(Domain::Model(Model::A), "title", FieldType::Text, Model::A).unwrap();

        graph.add_mapping(&csl("title"), &model_a("title"), true).unwrap();
        graph.add_mapping(&csl("title"), &model_a("title"), true).unwrap();
        assert_eq!(graph.edge_count(), 2);

        graph.add_mapping(&model_a("title"), &csl("title"), false).unwrap();
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_add_mapping_requires_variables() {
        let mut graph = FieldGraph::new();
        graph.add_variable(Domain::Csl, "title", FieldType::Text, Model::A).unwrap();
        let err = graph.add_mapping(&csl("title"), &model_a("title"), true).unwrap_err();
        assert!(matches!(err, GraphError::UnknownVariable { .. }));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_add_label_creates_both_forms() {
        let mut graph = FieldGraph::new();
        let var = graph
            .add_variable(Domain::Csl, "publisher-place", FieldType::Text, Model::A)
            .unwrap();
        graph.add_label(Domain::Csl, "publisher-place", "publisher-place").unwrap();

        let literal = graph.get(&NodeKey::label("publisher-place")).unwrap();
        assert!(literal.is_shadow_label());
        let normalized = graph.get(&NodeKey::label("publisher place")).unwrap();
        assert!(normalized.is_plain_label());

        let literal_id = graph.node_id(&NodeKey::label("publisher-place")).unwrap();
        let normalized_id = graph.node_id(&NodeKey::label("publisher place")).unwrap();
        assert!(graph.has_edge(literal_id, var));
        assert!(graph.has_edge(normalized_id, var));
    }

    #[test]
    fn test_add_label_plain_text_creates_single_node() {
        let mut graph = FieldGraph::new();
        graph.add_variable(Domain::Csl, "title", FieldType::Text, Model::A).unwrap();
        graph.add_label(Domain::Csl, "title", "title").unwrap();
        graph.add_label(Domain::Csl, "title", "title").unwrap();

        assert_eq!(graph.labels().len(), 1);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_add_label_dangling() {
        let mut graph = FieldGraph::new();
        let err = graph.add_label(Domain::Csl, "title", "title").unwrap_err();
        match err {
            GraphError::DanglingLabel { domain, name, label } => {
                assert_eq!(domain, Domain::Csl);
                assert_eq!(name, "title");
                assert_eq!(label, "title");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_remove_node_clears_index_and_edges() {
        let mut graph = FieldGraph::new();
        graph.add_variable(Domain::Csl, "note", FieldType::Text, Model::A).unwrap();
        graph.add_variable(Domain::Model(Model::A), "extra", FieldType::Text, Model::A).unwrap();
        graph.add_mapping(&csl("note"), &model_a("extra"), true).unwrap();

        let id = graph.node_id(&csl("note")).unwrap();
        assert!(graph.remove_node(id).is_some());
        assert!(graph.node_id(&csl("note")).is_none());
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_sorted_nodes_follow_key_order() {
        let mut graph = FieldGraph::new();
        graph.add_variable(Domain::Csl, "b", FieldType::Text, Model::A).unwrap();
        graph.add_variable(Domain::Csl, "a", FieldType::Text, Model::A).unwrap();
        graph.add_variable(Domain::Model(Model::B), "z", FieldType::Text, Model::B).unwrap();

        let names: Vec<String> = graph
            .sorted_nodes()
            .into_iter()
            .map(|id| graph.node(id).unwrap().key.to_string())
            .collect();
        assert_eq!(names, vec!["modelB:z", "csl:a", "csl:b"]);
    }
}
