// Conflict resolution
//
// A variable with two or more incoming mappings from one domain would be
// overwritten depending on which source wrote last. Those mappings are
// marked removed (never deleted) and stamped with a change identifier.

use crate::model::{ChangeId, ChangeSeq, Domain, EdgeId, NodeId};
use crate::store::FieldGraph;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};

/// Edges removed by conflict resolution
#[derive(Debug, Clone, Default)]
pub struct RemovedSet {
    edges: HashSet<EdgeId>,
}

impl RemovedSet {
    fn insert(&mut self, edge: EdgeId) {
        self.edges.insert(edge);
    }

    /// Check whether an edge was removed
    pub fn contains(&self, edge: EdgeId) -> bool {
        self.edges.contains(&edge)
    }

    /// Number of removed edges
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// True when nothing was removed
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// A group of mappings neutralized together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    /// Variable receiving the conflicting mappings
    pub target: NodeId,
    /// Domain the mappings came from
    pub source_domain: Domain,
    /// Removed edges
    pub edges: Vec<EdgeId>,
    /// Change identifier shared by the group
    pub change: ChangeId,
}

/// Mark every same-domain group of two or more incoming mappings removed
///
/// Label references are exempt. Variables are visited in key order so change
/// identifiers do not depend on load order.
pub fn resolve_conflicts(graph: &mut FieldGraph, changes: &mut ChangeSeq) -> (RemovedSet, Vec<Conflict>) {
    let mut removed = RemovedSet::default();
    let mut conflicts = Vec::new();

    for target in graph.variables() {
        let mut by_domain: BTreeMap<Domain, Vec<(EdgeId, NodeId)>> = BTreeMap::new();
        for (edge, source) in graph.incoming(target) {
            if let Some(node) = graph.node(source) {
                by_domain.entry(node.domain()).or_default().push((edge, source));
            }
        }

        for (source_domain, mut edges) in by_domain {
            match source_domain {
                Domain::Label => continue,
                Domain::Model(_) | Domain::Csl => {}
            }
            if edges.len() < 2 {
                continue;
            }

            edges.sort_by(|a, b| {
                let key = |id: NodeId| graph.node(id).map(|n| n.key.clone());
                key(a.1).cmp(&key(b.1))
            });

            let change = changes.next_id();
            for &(edge, _) in &edges {
                if let Some(weight) = graph.edge_mut(edge) {
                    weight.removed = true;
                    weight.record_change(change);
                }
                removed.insert(edge);
            }

            debug!(
                target = %graph.node(target).map(|n| n.key.to_string()).unwrap_or_default(),
                domain = %source_domain,
                edges = edges.len(),
                change,
                "removed conflicting mappings"
            );
            conflicts.push(Conflict {
                target,
                source_domain,
                edges: edges.into_iter().map(|(edge, _)| edge).collect(),
                change,
            });
        }
    }

    info!(groups = conflicts.len(), edges = removed.len(), "resolved conflicts");
    (removed, conflicts)
}
