// Reconciliation run
//
// Owns the field graph for one run: any number of loads, then a single
// finalization that consumes the reconciler.

use crate::closure::{close_transitively, HopThrough};
use crate::error::Result;
use crate::labels::build_labels;
use crate::loader::{load_schema, LoadSummary, PendingLabels};
use crate::model::{ChangeSeq, Model};
use crate::projection::{project, DocRow, MappingEntry, MappingTable};
use crate::purge::purge_multiline;
use crate::resolve::{resolve_conflicts, Conflict};
use crate::schema::ClientSchema;
use crate::snapshot::GraphSnapshot;
use crate::store::FieldGraph;
use tracing::info;

/// Builder for one reconciliation run
#[derive(Debug, Default)]
pub struct Reconciler {
    graph: FieldGraph,
    pending: PendingLabels,
    changes: ChangeSeq,
}

impl Reconciler {
    /// Start an empty run
    pub fn new() -> Self {
        Self::default()
    }

    /// Load one client schema; models may be loaded in any order
    pub fn load(&mut self, schema: &ClientSchema, model: Model) -> Result<LoadSummary> {
        load_schema(&mut self.graph, &mut self.pending, schema, model)
    }

    /// Graph as loaded so far
    pub fn graph(&self) -> &FieldGraph {
        &self.graph
    }

    /// Aliases waiting for the label builder
    pub fn pending(&self) -> &PendingLabels {
        &self.pending
    }

    /// Run labels, purge, conflict resolution, closure and projection
    ///
    /// Any error aborts the run; nothing partial is returned.
    pub fn finalize(self) -> Result<Reconciliation> {
        let Reconciler {
            mut graph,
            pending,
            mut changes,
        } = self;

        build_labels(&mut graph, &pending)?;
        let purged = purge_multiline(&mut graph);
        let (removed, conflicts) = resolve_conflicts(&mut graph, &mut changes);
        let hop_throughs = close_transitively(&mut graph, &removed, &mut changes);
        let table = project(&mut graph)?;

        let (mappings, references, removed_edges, added_edges) = graph.edge_stats();
        info!(
            nodes = graph.node_count(),
            mappings,
            references,
            removed = removed_edges,
            added = added_edges,
            purged,
            labels = table.len(),
            last_change = changes.last(),
            "reconciliation finalized"
        );

        Ok(Reconciliation {
            graph,
            table,
            conflicts,
            hop_throughs,
            purged,
        })
    }
}

/// Result of a finalized run
#[derive(Debug, Clone)]
pub struct Reconciliation {
    graph: FieldGraph,
    table: MappingTable,
    conflicts: Vec<Conflict>,
    hop_throughs: Vec<HopThrough>,
    purged: usize,
}

impl Reconciliation {
    /// Finalized graph
    pub fn graph(&self) -> &FieldGraph {
        &self.graph
    }

    /// Label to field mapping table
    pub fn table(&self) -> &MappingTable {
        &self.table
    }

    /// Mapping table entry for one label
    pub fn lookup(&self, label: &str) -> Option<&MappingEntry> {
        self.table.get(label)
    }

    /// Documentation rows, plain labels only
    pub fn doc_rows(&self) -> Vec<DocRow> {
        self.table.doc_rows()
    }

    /// Sorted snapshot of the finalized graph
    pub fn snapshot(&self) -> GraphSnapshot {
        self.graph.snapshot()
    }

    /// Conflict groups neutralized by the resolver
    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    /// Edges synthesized by the closure pass
    pub fn hop_throughs(&self) -> &[HopThrough] {
        &self.hop_throughs
    }

    /// Number of multi-line variables purged
    pub fn purged(&self) -> usize {
        self.purged
    }

    /// Take the mapping table, dropping the graph
    pub fn into_table(self) -> MappingTable {
        self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Domain, FieldType, NodeKey};
    use serde_json::json;

    fn schema(value: serde_json::Value) -> ClientSchema {
        serde_json::from_value(value).unwrap()
    }

    fn article() -> ClientSchema {
        schema(json!({
            "itemTypes": {
                "journalArticle": {
                    "itemType": "journalArticle",
                    "fields": {
                        "title": "title",
                        "abstractNote": "abstractNote",
                        "publicationTitle": "publicationTitle"
                    },
                    "creatorTypes": ["author"]
                }
            },
            "csl": {
                "fields": {
                    "text": {
                        "title": "title",
                        "abstract": "abstractNote",
                        "container-title": "publicationTitle"
                    }
                },
                "names": { "author": "author" }
            }
        }))
    }

    #[test]
    fn test_finalize_single_model() {
        let mut run = Reconciler::new();
        let summary = run.load(&article(), Model::A).unwrap();
        assert!(summary.variables > 0);

        let result = run.finalize().unwrap();
        assert_eq!(result.purged(), 2);
        assert!(result.conflicts().is_empty());

        let title = result.lookup("title").unwrap();
        assert_eq!(title.field_type, FieldType::Text);
        assert_eq!(title.model_a, vec!["title"]);
        assert_eq!(title.citation_style, vec!["title"]);
        assert!(title.model_b.is_empty());

        let author = result.lookup("author").unwrap();
        assert_eq!(author.field_type, FieldType::Name);

        assert!(result.lookup("abstract").is_none());
        assert!(result.lookup("abstract note").is_none());
        assert!(result
            .graph()
            .get(&NodeKey::new(Domain::Model(Model::A), "abstractNote"))
            .is_none());
    }

    #[test]
    fn test_container_title_reaches_model_field_by_hop_through() {
        let mut run = Reconciler::new();
        run.load(&article(), Model::A).unwrap();
        let result = run.finalize().unwrap();

        let entry = result.lookup("container title").unwrap();
        assert_eq!(entry.citation_style, vec!["container-title"]);
        assert_eq!(entry.model_a, vec!["publicationTitle"]);
        assert!(!result.hop_throughs().is_empty());
    }
}
