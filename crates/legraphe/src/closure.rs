// Transitive (hop-through) closure
//
// A plain label naming one variable also resolves the variables that are
// exactly one intermediate hop away, unless the label already reaches that
// domain directly. Deeper paths are never inferred.

use crate::model::{ChangeId, ChangeSeq, Domain, Edge, EdgeId, NodeId};
use crate::resolve::RemovedSet;
use crate::store::FieldGraph;
use petgraph::algo::dijkstra;
use petgraph::stable_graph::EdgeReference;
use petgraph::visit::{EdgeFiltered, EdgeRef};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

/// Path length (in edges) of an inferable hop-through
const HOP_THROUGH_COST: u32 = 2;

/// An edge synthesized by the closure pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HopThrough {
    /// Plain label the edge starts at
    pub label: NodeId,
    /// Intermediate variable on the replaced path
    pub via: NodeId,
    /// Variable the new edge points at
    pub target: NodeId,
    /// Change identifier shared with the replaced path
    pub change: ChangeId,
}

fn passable(id: EdgeId, edge: &Edge, removed: &RemovedSet) -> bool {
    !edge.removed && !removed.contains(id)
}

/// Synthesize direct label edges for one-hop paths
///
/// Domains reached by each plain label and all shortest-path costs are
/// computed before the graph is touched. Removed edges are impassable; every
/// other edge costs 1, including the live reverse of a removed mapping.
pub fn close_transitively(
    graph: &mut FieldGraph,
    removed: &RemovedSet,
    changes: &mut ChangeSeq,
) -> Vec<HopThrough> {
    let plain: Vec<NodeId> = graph
        .labels()
        .into_iter()
        .filter(|&id| graph.node(id).map_or(false, |n| n.is_plain_label()))
        .collect();

    let reached: HashMap<NodeId, BTreeSet<Domain>> =
        plain.iter().map(|&id| (id, graph.out_domains(id))).collect();

    let plan = {
        let view = EdgeFiltered::from_fn(graph.inner(), |e: EdgeReference<'_, Edge>| {
            passable(e.id(), e.weight(), removed)
        });

        let mut plan: Vec<(NodeId, NodeId, NodeId)> = Vec::new();
        for &label in &plain {
            let costs = dijkstra(&view, label, None, |_| 1u32);

            let mut targets: Vec<NodeId> = costs
                .into_iter()
                .filter(|&(node, cost)| node != label && cost == HOP_THROUGH_COST)
                .map(|(node, _)| node)
                .collect();
            graph.sort_by_key(&mut targets);

            for target in targets {
                if graph.has_edge(label, target) {
                    continue;
                }
                let Some(domain) = graph.node(target).map(|n| n.domain()) else {
                    continue;
                };
                if reached.get(&label).map_or(false, |domains| domains.contains(&domain)) {
                    continue;
                }
                if let Some(via) = intermediate(graph, removed, label, target) {
                    plan.push((label, via, target));
                }
            }
        }
        plan
    };

    let mut synthesized = Vec::with_capacity(plan.len());
    for (label, via, target) in plan {
        let change = changes.next_id();
        for (from, to) in [(label, via), (via, target)] {
            if let Some(id) = graph.find_edge(from, to) {
                if let Some(edge) = graph.edge_mut(id) {
                    edge.record_change(change);
                }
            }
        }
        graph.insert_edge(label, target, Edge::synthesized(change));

        debug!(
            label = %key_of(graph, label),
            via = %key_of(graph, via),
            target = %key_of(graph, target),
            change,
            "synthesized hop-through"
        );
        synthesized.push(HopThrough {
            label,
            via,
            target,
            change,
        });
    }

    info!(plain_labels = plain.len(), synthesized = synthesized.len(), "closed hop-throughs");
    synthesized
}

/// First passable intermediate (in key order) on a 2-edge path
fn intermediate(graph: &FieldGraph, removed: &RemovedSet, label: NodeId, target: NodeId) -> Option<NodeId> {
    let mut candidates: Vec<NodeId> = graph
        .outgoing(label)
        .into_iter()
        .filter(|&(edge, via)| {
            graph
                .edge(edge)
                .map_or(false, |e| passable(edge, e, removed))
        })
        .map(|(_, via)| via)
        .collect();
    graph.sort_by_key(&mut candidates);

    candidates.into_iter().find(|&via| {
        graph
            .find_edge(via, target)
            .and_then(|id| graph.edge(id).map(|e| passable(id, e, removed)))
            .unwrap_or(false)
    })
}

fn key_of(graph: &FieldGraph, id: NodeId) -> String {
    graph
        .node(id)
        .map(|n| n.key.to_string())
        .unwrap_or_default()
}
