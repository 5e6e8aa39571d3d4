// GML and markdown exporters

use crate::model::{Domain, EdgeKind, Model};
use crate::projection::DocRow;
use crate::snapshot::{EdgeRecord, GraphSnapshot, NodeRecord};
use std::collections::HashMap;
use std::io::{self, Write};

const COLOR_MODEL_A: &str = "#33cccc";
const COLOR_MODEL_B: &str = "#ff9966";
const COLOR_CSL: &str = "#99CC00";
const COLOR_LABEL: &str = "#C0C0C0";
const COLOR_REMOVED: &str = "#666666";
const COLOR_ADDED: &str = "#0000FF";

fn fill(domain: Domain) -> &'static str {
    match domain {
        Domain::Model(Model::A) => COLOR_MODEL_A,
        Domain::Model(Model::B) => COLOR_MODEL_B,
        Domain::Csl => COLOR_CSL,
        Domain::Label => COLOR_LABEL,
    }
}

/// Quote a GML string value
///
/// GML strings are ASCII; quotes, ampersands and anything outside ASCII are
/// written as character entities.
fn gml_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("&quot;"),
            '&' => out.push_str("&amp;"),
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            c => out.push_str(&format!("&#{};", c as u32)),
        }
    }
    out.push('"');
    out
}

fn write_node<W: Write>(out: &mut W, id: usize, node: &NodeRecord) -> io::Result<()> {
    writeln!(out, "  node [")?;
    writeln!(out, "    id {}", id)?;
    writeln!(out, "    label {}", gml_string(&node.key.name))?;
    writeln!(out, "    domain {}", gml_string(node.key.domain.as_str()))?;
    writeln!(out, "    name {}", gml_string(&node.key.name))?;
    if let Some(field_type) = node.field_type {
        writeln!(out, "    type {}", gml_string(field_type.as_str()))?;
    }
    if let Some(models) = node.models {
        for model in Model::ALL {
            if models.has(model) {
                writeln!(out, "    {} 1", model.as_str())?;
            }
        }
    }
    writeln!(out, "    graphics [")?;
    writeln!(out, "      h {:.1}", node.height)?;
    writeln!(out, "      w {:.1}", node.width)?;
    match node.key.domain {
        Domain::Label => {
            writeln!(out, "      hasFill 0")?;
            writeln!(out, "      outline {}", gml_string(COLOR_LABEL))?;
        }
        domain => writeln!(out, "      fill {}", gml_string(fill(domain)))?,
    }
    writeln!(out, "    ]")?;
    writeln!(out, "  ]")
}

fn write_edge<W: Write>(out: &mut W, source: usize, target: usize, edge: &EdgeRecord) -> io::Result<()> {
    writeln!(out, "  edge [")?;
    writeln!(out, "    source {}", source)?;
    writeln!(out, "    target {}", target)?;
    if !edge.audit.is_empty() {
        writeln!(out, "    label {}", gml_string(&edge.audit))?;
    }
    let kind = match edge.kind {
        EdgeKind::Mapping => "mapping",
        EdgeKind::LabelReference => "label_reference",
    };
    writeln!(out, "    kind {}", gml_string(kind))?;
    if edge.removed {
        writeln!(out, "    removed 1")?;
    }
    if edge.added {
        writeln!(out, "    added 1")?;
    }
    writeln!(out, "    graphics [")?;
    if edge.removed {
        writeln!(out, "      style \"dashed\"")?;
        writeln!(out, "      fill {}", gml_string(COLOR_REMOVED))?;
    } else if edge.added {
        writeln!(out, "      style \"dashed\"")?;
        writeln!(out, "      fill {}", gml_string(COLOR_ADDED))?;
    }
    writeln!(out, "      targetArrow \"standard\"")?;
    writeln!(out, "    ]")?;
    writeln!(out, "  ]")
}

/// Write a snapshot as a directed GML graph
///
/// Shadow labels and their edges are left out.
pub fn write_gml<W: Write>(snapshot: &GraphSnapshot, out: &mut W) -> io::Result<()> {
    let mut ids = HashMap::new();

    writeln!(out, "graph [")?;
    writeln!(out, "  directed 1")?;
    for node in snapshot.nodes.iter().filter(|n| !n.shadow) {
        let id = ids.len();
        ids.insert(&node.key, id);
        write_node(out, id, node)?;
    }
    for edge in &snapshot.edges {
        if let (Some(&source), Some(&target)) = (ids.get(&edge.source), ids.get(&edge.target)) {
            write_edge(out, source, target, edge)?;
        }
    }
    writeln!(out, "]")
}

/// Render a snapshot as GML text
pub fn to_gml(snapshot: &GraphSnapshot) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail
    let _ = write_gml(snapshot, &mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

fn markdown_cell(value: &str) -> String {
    value.replace('\\', "\\\\").replace('_', "\\_").replace('|', "\\|")
}

/// Render documentation rows as a markdown table
///
/// `model_headers` titles the model A and model B columns.
pub fn render_markdown(rows: &[DocRow], model_headers: [&str; 2]) -> String {
    let headers = ["label", "type", model_headers[0], model_headers[1], "csl"];

    let mut out = String::new();
    out.push_str(&format!("| {} |\n", headers.join(" | ")));
    out.push_str(&format!("|{}\n", ["---|"; 5].concat()));
    for row in rows {
        let cells = [
            format!("**{}**", markdown_cell(&row.label)),
            row.field_type.to_string(),
            markdown_cell(&row.model_a),
            markdown_cell(&row.model_b),
            markdown_cell(&row.citation_style),
        ];
        out.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldType, NodeKey};
    use crate::store::FieldGraph;
    use rstest::rstest;

    #[rstest]
    #[case("title", "\"title\"")]
    #[case("say \"hi\"", "\"say &quot;hi&quot;\"")]
    #[case("a&b", "\"a&amp;b\"")]
    #[case("é", "\"&#233;\"")]
    fn test_gml_string(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(gml_string(input), expected);
    }

    #[test]
    fn test_gml_omits_shadow_labels() {
        let mut graph = FieldGraph::new();
        graph.add_variable(Domain::Csl, "title", FieldType::Text, Model::A).unwrap();
        graph.add_label(Domain::Csl, "title", "shortTitle").unwrap();

        let gml = to_gml(&graph.snapshot());
        assert!(gml.starts_with("graph [\n  directed 1\n"));
        assert!(gml.contains("label \"short title\"\n    domain \"label\""));
        assert!(gml.contains("label \"title\"\n    domain \"csl\""));
        assert!(!gml.contains("shortTitle"));
        assert!(gml.contains("fill \"#99CC00\""));
        assert_eq!(gml.matches("node [").count(), 2);
        assert_eq!(gml.matches("edge [").count(), 1);
    }

    #[test]
    fn test_gml_marks_removed_and_added_edges() {
        let mut graph = FieldGraph::new();
        graph.add_variable(Domain::Csl, "author", FieldType::Name, Model::A).unwrap();
        graph.add_variable(Domain::Model(Model::A), "author", FieldType::Name, Model::A).unwrap();
        graph
            .add_mapping(
                &NodeKey::new(Domain::Model(Model::A), "author"),
                &NodeKey::new(Domain::Csl, "author"),
                false,
            )
            .unwrap();
        let mut snapshot = graph.snapshot();
        snapshot.edges[0].removed = true;
        snapshot.edges[0].audit = "3".to_string();

        let gml = to_gml(&snapshot);
        assert!(gml.contains("removed 1"));
        assert!(gml.contains("label \"3\""));
        assert!(gml.contains(COLOR_REMOVED));
        assert!(!gml.contains(COLOR_ADDED));
    }

    #[test]
    fn test_render_markdown() {
        let rows = vec![DocRow {
            label: "publisher place".to_string(),
            field_type: FieldType::Text,
            model_a: "place".to_string(),
            model_b: "place / jurisdiction_place".to_string(),
            citation_style: "publisher-place".to_string(),
        }];

        let table = render_markdown(&rows, ["zotero", "jurism"]);
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines[0], "| label | type | zotero | jurism | csl |");
        assert_eq!(lines[1], "|---|---|---|---|---|");
        assert_eq!(
            lines[2],
            "| **publisher place** | text | place | place / jurisdiction\\_place | publisher-place |"
        );
    }
}
