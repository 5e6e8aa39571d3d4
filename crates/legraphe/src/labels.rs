// Label builder

use crate::error::Result;
use crate::loader::PendingLabels;
use crate::model::Domain;
use crate::store::FieldGraph;
use tracing::debug;

/// Derive label nodes once every schema is loaded
///
/// 1. An identity label for every variable.
/// 2. A surface-name label for every model field whose surface name differs
///    from its base field, pointing at the base field.
/// 3. An alias label for every citation-style alias.
///
/// Returns the number of labels requested (each yields one or two nodes).
pub fn build_labels(graph: &mut FieldGraph, pending: &PendingLabels) -> Result<usize> {
    let mut requested = 0;

    let identities: Vec<(Domain, String)> = graph
        .variables()
        .into_iter()
        .filter_map(|id| graph.node(id).map(|n| (n.domain(), n.name().to_string())))
        .collect();
    for (domain, name) in &identities {
        graph.add_label(*domain, name, name)?;
        requested += 1;
    }

    for (model, base, surface) in &pending.model_aliases {
        graph.add_label(Domain::Model(*model), base, surface)?;
        requested += 1;
    }

    for (field, alias) in &pending.csl_aliases {
        graph.add_label(Domain::Csl, field, alias)?;
        requested += 1;
    }

    debug!(requested, labels = graph.labels().len(), "built labels");
    Ok(requested)
}
