// Mapping table projection
//
// Read-only view of the finalized graph: every label with the type and the
// per-domain fields it resolves to.

use crate::error::{GraphError, Result};
use crate::model::{Domain, FieldType, Model, NodeKind};
use crate::normalize::is_shadow;
use crate::store::FieldGraph;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Fields one label resolves to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingEntry {
    /// Shared type of every variable behind the label
    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Model A fields
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub model_a: Vec<String>,

    /// Model B fields
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub model_b: Vec<String>,

    /// Citation-style variables
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub citation_style: Vec<String>,
}

impl MappingEntry {
    fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            model_a: Vec::new(),
            model_b: Vec::new(),
            citation_style: Vec::new(),
        }
    }

    /// Fields of one vocabulary (empty for the label domain)
    pub fn fields(&self, domain: Domain) -> &[String] {
        match domain {
            Domain::Model(Model::A) => &self.model_a,
            Domain::Model(Model::B) => &self.model_b,
            Domain::Csl => &self.citation_style,
            Domain::Label => &[],
        }
    }

    fn fields_mut(&mut self, domain: Domain) -> Option<&mut Vec<String>> {
        match domain {
            Domain::Model(Model::A) => Some(&mut self.model_a),
            Domain::Model(Model::B) => Some(&mut self.model_b),
            Domain::Csl => Some(&mut self.citation_style),
            Domain::Label => None,
        }
    }

    fn finish(&mut self) {
        for fields in [&mut self.model_a, &mut self.model_b, &mut self.citation_style] {
            fields.sort();
            fields.dedup();
        }
    }
}

/// Label text to mapping entry, sorted by label
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MappingTable {
    entries: BTreeMap<String, MappingEntry>,
}

impl MappingTable {
    /// Entry for a label
    pub fn get(&self, label: &str) -> Option<&MappingEntry> {
        self.entries.get(label)
    }

    /// Number of labels
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in label order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MappingEntry)> {
        self.entries.iter().map(|(label, entry)| (label.as_str(), entry))
    }

    /// Stable pretty JSON (sorted keys)
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// One documentation row per plain label, sorted by label
    pub fn doc_rows(&self) -> Vec<DocRow> {
        self.iter()
            .filter(|(label, _)| !is_shadow(label))
            .map(|(label, entry)| DocRow {
                label: label.to_string(),
                field_type: entry.field_type,
                model_a: entry.model_a.join(" / "),
                model_b: entry.model_b.join(" / "),
                citation_style: entry.citation_style.join(" / "),
            })
            .collect()
    }

    /// Fail if a name-typed label maps to several fields of one domain
    pub fn check_name_uniqueness(&self) -> Result<()> {
        for (label, entry) in self.iter() {
            if entry.field_type != FieldType::Name {
                continue;
            }
            for domain in Domain::VOCABULARIES {
                let fields = entry.fields(domain);
                if fields.len() > 1 {
                    return Err(GraphError::AmbiguousNameMapping {
                        label: label.to_string(),
                        domain,
                        fields: fields.to_vec(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Human-readable row of the mapping documentation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocRow {
    /// Label text
    pub label: String,
    /// Field type
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Model A fields joined with ` / `
    pub model_a: String,
    /// Model B fields joined with ` / `
    pub model_b: String,
    /// Citation-style variables joined with ` / `
    pub citation_style: String,
}

/// Remove labels that no longer reference any variable
pub fn prune_orphan_labels(graph: &mut FieldGraph) -> usize {
    let orphans: Vec<_> = graph
        .labels()
        .into_iter()
        .filter(|&id| graph.outgoing(id).is_empty())
        .collect();
    for &id in &orphans {
        if let Some(node) = graph.remove_node(id) {
            debug!(label = %node.key.name, "pruned orphan label");
        }
    }
    orphans.len()
}

/// Project the finalized graph into the mapping table
///
/// Prunes orphan labels first. Fails on mixed types behind one label and on
/// ambiguous name labels.
pub fn project(graph: &mut FieldGraph) -> Result<MappingTable> {
    prune_orphan_labels(graph);

    let mut entries: BTreeMap<String, MappingEntry> = BTreeMap::new();
    for label in graph.labels() {
        let Some(label_node) = graph.node(label) else {
            continue;
        };
        let text = label_node.name().to_string();

        let mut targets: Vec<_> = graph.outgoing(label).into_iter().map(|(_, var)| var).collect();
        graph.sort_by_key(&mut targets);

        for var in targets {
            let Some(node) = graph.node(var) else {
                continue;
            };
            let field_type = match node.kind {
                NodeKind::Variable { field_type, .. } => field_type,
                NodeKind::Label { .. } => continue,
            };

            let entry = entries
                .entry(text.clone())
                .or_insert_with(|| MappingEntry::new(field_type));
            if entry.field_type != field_type {
                return Err(GraphError::LabelTypeConflict {
                    label: text,
                    existing: entry.field_type,
                    found: field_type,
                    variable: node.key.to_string(),
                });
            }
            if let Some(fields) = entry.fields_mut(node.domain()) {
                fields.push(node.name().to_string());
            }
        }
    }

    for entry in entries.values_mut() {
        entry.finish();
    }
    let table = MappingTable { entries };
    table.check_name_uniqueness()?;
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeKey;

    fn text_graph() -> FieldGraph {
        let mut graph = FieldGraph::new();
        graph.add_variable(Domain::Csl, "title", FieldType::Text, Model::A).unwrap();
        graph.add_variable(Domain::Model(Model::A), "title", FieldType::Text, Model::A).unwrap();
        graph.add_variable(Domain::Model(Model::B), "title", FieldType::Text, Model::B).unwrap();
        graph.add_label(Domain::Csl, "title", "title").unwrap();
        graph.add_label(Domain::Model(Model::A), "title", "title").unwrap();
        graph.add_label(Domain::Model(Model::B), "title", "title").unwrap();
        graph
    }

    #[test]
    fn test_project_groups_fields_by_domain() {
        let mut graph = text_graph();
        let table = project(&mut graph).unwrap();
        let entry = table.get("title").unwrap();

        assert_eq!(entry.field_type, FieldType::Text);
        assert_eq!(entry.model_a, vec!["title"]);
        assert_eq!(entry.model_b, vec!["title"]);
        assert_eq!(entry.citation_style, vec!["title"]);
    }

    #[test]
    fn test_project_prunes_orphans() {
        let mut graph = text_graph();
        graph.add_variable(Domain::Csl, "note", FieldType::Text, Model::A).unwrap();
        graph.add_label(Domain::Csl, "note", "note").unwrap();
        let note = graph.node_id(&NodeKey::new(Domain::Csl, "note")).unwrap();
        graph.remove_node(note);

        let table = project(&mut graph).unwrap();
        assert!(table.get("note").is_none());
        assert!(graph.get(&NodeKey::label("note")).is_none());
        for label in graph.labels() {
            assert!(!graph.outgoing(label).is_empty());
        }
    }

    #[test]
    fn test_project_rejects_mixed_types() {
        let mut graph = text_graph();
        graph.add_variable(Domain::Csl, "issued", FieldType::Date, Model::A).unwrap();
        graph.add_label(Domain::Csl, "issued", "title").unwrap();

        let err = project(&mut graph).unwrap_err();
        match err {
            GraphError::LabelTypeConflict {
                label,
                existing,
                found,
                variable,
            } => {
                assert_eq!(label, "title");
                assert_eq!(existing, FieldType::Text);
                assert_eq!(found, FieldType::Date);
                assert_eq!(variable, "csl:issued");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_project_rejects_ambiguous_names() {
        let mut graph = FieldGraph::new();
        graph.add_variable(Domain::Model(Model::A), "author", FieldType::Name, Model::A).unwrap();
        graph.add_variable(Domain::Model(Model::A), "creator", FieldType::Name, Model::A).unwrap();
        graph.add_label(Domain::Model(Model::A), "author", "author").unwrap();
        graph.add_label(Domain::Model(Model::A), "creator", "author").unwrap();

        let err = project(&mut graph).unwrap_err();
        match err {
            GraphError::AmbiguousNameMapping { label, domain, fields } => {
                assert_eq!(label, "author");
                assert_eq!(domain, Domain::Model(Model::A));
                assert_eq!(fields, vec!["author", "creator"]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_doc_rows_skip_shadow_labels() {
        let mut graph = FieldGraph::new();
        graph
            .add_variable(Domain::Csl, "publisher-place", FieldType::Text, Model::A)
            .unwrap();
        graph
            .add_variable(Domain::Model(Model::A), "place", FieldType::Text, Model::A)
            .unwrap();
        graph.add_label(Domain::Csl, "publisher-place", "publisher-place").unwrap();
        graph.add_label(Domain::Model(Model::A), "place", "publisherPlace").unwrap();

        let table = project(&mut graph).unwrap();
        assert_eq!(table.len(), 3);

        let rows = table.doc_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].label, "publisher place");
        assert_eq!(rows[0].model_a, "place");
        assert_eq!(rows[0].citation_style, "publisher-place");
    }

    #[test]
    fn test_json_has_sorted_keys_and_omits_empty_domains() {
        let mut graph = FieldGraph::new();
        graph.add_variable(Domain::Csl, "volume", FieldType::Text, Model::A).unwrap();
        graph.add_variable(Domain::Csl, "issue", FieldType::Text, Model::A).unwrap();
        graph.add_label(Domain::Csl, "volume", "volume").unwrap();
        graph.add_label(Domain::Csl, "issue", "issue").unwrap();

        let json = project(&mut graph).unwrap().to_json_pretty().unwrap();
        let issue = json.find("\"issue\"").unwrap();
        let volume = json.find("\"volume\"").unwrap();
        assert!(issue < volume);
        assert!(json.contains("\"citationStyle\""));
        assert!(!json.contains("\"modelA\""));
    }
}
