// Multi-line field purge

use crate::model::{Domain, NodeKey};
use crate::store::FieldGraph;
use tracing::debug;

const MODEL_MULTILINE: [&str; 2] = ["abstractNote", "extra"];
const CSL_MULTILINE: [&str; 2] = ["abstract", "note"];

/// Multi-line text fields cannot back a short structured label
pub fn is_multiline(key: &NodeKey) -> bool {
    match key.domain {
        Domain::Model(_) => MODEL_MULTILINE.contains(&key.name.as_str()),
        Domain::Csl => CSL_MULTILINE.contains(&key.name.as_str()),
        Domain::Label => false,
    }
}

/// Remove denylisted multi-line variables and their edges
///
/// Labels left without a target are pruned later, during projection.
pub fn purge_multiline(graph: &mut FieldGraph) -> usize {
    let doomed: Vec<_> = graph
        .variables()
        .into_iter()
        .filter(|&id| graph.node(id).map_or(false, |n| is_multiline(&n.key)))
        .collect();

    for &id in &doomed {
        if let Some(node) = graph.remove_node(id) {
            debug!(key = %node.key, "purged multi-line variable");
        }
    }
    doomed.len()
}
