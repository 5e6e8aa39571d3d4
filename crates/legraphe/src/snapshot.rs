// Read-only graph snapshot

use crate::model::{EdgeKind, FieldType, ModelFlags, NodeKey, NodeKind, DISPLAY_HEIGHT};
use crate::store::FieldGraph;
use serde::Serialize;

/// Node as seen by exporters
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    /// Identity
    #[serde(flatten)]
    pub key: NodeKey,
    /// Type (variables only)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    /// Defining models (variables only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub models: Option<ModelFlags>,
    /// Shadow label marker
    pub shadow: bool,
    /// Display width hint
    pub width: f64,
    /// Display height hint
    pub height: f64,
}

/// Edge as seen by exporters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeRecord {
    /// Source key
    pub source: NodeKey,
    /// Target key
    pub target: NodeKey,
    /// Edge type
    pub kind: EdgeKind,
    /// Removed by conflict resolution
    pub removed: bool,
    /// Synthesized by the closure pass
    pub added: bool,
    /// Comma-joined change identifiers
    pub audit: String,
}

/// Sorted, load-order independent view of a graph
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphSnapshot {
    /// Nodes sorted by key
    pub nodes: Vec<NodeRecord>,
    /// Edges sorted by `(source, target)`
    pub edges: Vec<EdgeRecord>,
}

impl GraphSnapshot {
    /// Node record by key
    pub fn node(&self, key: &NodeKey) -> Option<&NodeRecord> {
        self.nodes
            .binary_search_by(|n| n.key.cmp(key))
            .ok()
            .map(|i| &self.nodes[i])
    }

    /// Edge record by endpoint keys
    pub fn edge(&self, source: &NodeKey, target: &NodeKey) -> Option<&EdgeRecord> {
        self.edges
            .binary_search_by(|e| (&e.source, &e.target).cmp(&(source, target)))
            .ok()
            .map(|i| &self.edges[i])
    }
}

impl FieldGraph {
    /// Capture a sorted snapshot of every node and edge
    pub fn snapshot(&self) -> GraphSnapshot {
        let nodes = self
            .sorted_nodes()
            .into_iter()
            .filter_map(|id| self.node(id))
            .map(|node| {
                let (field_type, models, shadow) = match node.kind {
                    NodeKind::Variable { field_type, models } => (Some(field_type), Some(models), false),
                    NodeKind::Label { shadow } => (None, None, shadow),
                };
                NodeRecord {
                    key: node.key.clone(),
                    field_type,
                    models,
                    shadow,
                    width: node.display_width(),
                    height: DISPLAY_HEIGHT,
                }
            })
            .collect();

        let mut edges: Vec<EdgeRecord> = self
            .sorted_nodes()
            .into_iter()
            .flat_map(|source| {
                self.outgoing(source)
                    .into_iter()
                    .map(move |(edge, target)| (source, edge, target))
            })
            .filter_map(|(source, edge, target)| {
                let weight = self.edge(edge)?;
                Some(EdgeRecord {
                    source: self.node(source)?.key.clone(),
                    target: self.node(target)?.key.clone(),
                    kind: weight.kind,
                    removed: weight.removed,
                    added: weight.added,
                    audit: weight.audit_label(),
                })
            })
            .collect();
        edges.sort_by(|a, b| (&a.source, &a.target).cmp(&(&b.source, &b.target)));

        GraphSnapshot { nodes, edges }
    }
}
