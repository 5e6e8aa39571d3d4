// Node and edge model for the field-mapping graph

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Node ID type (stable across node removal)
pub type NodeId = petgraph::stable_graph::NodeIndex;

/// Edge ID type
pub type EdgeId = petgraph::stable_graph::EdgeIndex;

/// Change identifier recorded in edge audit trails
pub type ChangeId = u32;

/// Source model of a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Model {
    /// First client vocabulary
    A,
    /// Second client vocabulary
    B,
}

impl Model {
    /// Both models, in canonical order
    pub const ALL: [Model; 2] = [Model::A, Model::B];

    /// Stable identifier used in outputs
    pub fn as_str(self) -> &'static str {
        match self {
            Model::A => "modelA",
            Model::B => "modelB",
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vocabulary a node belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Domain {
    /// Item field or creator role of a client model
    Model(Model),
    /// Citation-style (CSL) variable
    Csl,
    /// Human-facing label
    Label,
}

impl Domain {
    /// Domains that hold variables
    pub const VOCABULARIES: [Domain; 3] = [Domain::Model(Model::A), Domain::Model(Model::B), Domain::Csl];

    /// Stable identifier used in outputs
    pub fn as_str(self) -> &'static str {
        match self {
            Domain::Model(model) => model.as_str(),
            Domain::Csl => "csl",
            Domain::Label => "label",
        }
    }

    /// True for the three variable vocabularies
    pub fn is_vocabulary(self) -> bool {
        match self {
            Domain::Model(_) | Domain::Csl => true,
            Domain::Label => false,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Domain {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Semantic kind of a variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Person or entity name (creator roles)
    Name,
    /// Date-valued field
    Date,
    /// Free text
    Text,
}

impl FieldType {
    /// Lowercase identifier
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Name => "name",
            FieldType::Date => "date",
            FieldType::Text => "text",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic node identity: `(domain, name)`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeKey {
    /// Vocabulary
    pub domain: Domain,
    /// Field name, role name or label text
    pub name: String,
}

impl NodeKey {
    /// Create a key
    pub fn new(domain: Domain, name: impl Into<String>) -> Self {
        Self {
            domain,
            name: name.into(),
        }
    }

    /// Key of a label node
    pub fn label(text: impl Into<String>) -> Self {
        Self::new(Domain::Label, text)
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.domain, self.name)
    }
}

/// Which source models define a variable
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelFlags {
    /// Defined by model A
    pub model_a: bool,
    /// Defined by model B
    pub model_b: bool,
}

impl ModelFlags {
    /// Mark a model as defining the variable
    pub fn set(&mut self, model: Model) {
        match model {
            Model::A => self.model_a = true,
            Model::B => self.model_b = true,
        }
    }

    /// Check whether a model defines the variable
    pub fn has(&self, model: Model) -> bool {
        match model {
            Model::A => self.model_a,
            Model::B => self.model_b,
        }
    }
}

/// Node payload
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Field or role of one vocabulary
    Variable {
        /// Semantic type, immutable once set
        field_type: FieldType,
        /// Source models that reference it
        models: ModelFlags,
    },
    /// Human-facing label
    Label {
        /// Literal form that differs from its normalized form
        shadow: bool,
    },
}

/// Display height hint shared by all nodes
pub const DISPLAY_HEIGHT: f64 = 30.0;

/// Node in the field graph
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Identity
    pub key: NodeKey,
    /// Variable or label payload
    pub kind: NodeKind,
}

impl Node {
    /// Create a variable node
    pub fn variable(key: NodeKey, field_type: FieldType) -> Self {
        Self {
            key,
            kind: NodeKind::Variable {
                field_type,
                models: ModelFlags::default(),
            },
        }
    }

    /// Create a label node
    pub fn label(text: impl Into<String>, shadow: bool) -> Self {
        Self {
            key: NodeKey::label(text),
            kind: NodeKind::Label { shadow },
        }
    }

    /// Domain of the node
    pub fn domain(&self) -> Domain {
        self.key.domain
    }

    /// Name or label text
    pub fn name(&self) -> &str {
        &self.key.name
    }

    /// Semantic type (variables only)
    pub fn field_type(&self) -> Option<FieldType> {
        match self.kind {
            NodeKind::Variable { field_type, .. } => Some(field_type),
            NodeKind::Label { .. } => None,
        }
    }

    /// True for label nodes
    pub fn is_label(&self) -> bool {
        matches!(self.kind, NodeKind::Label { .. })
    }

    /// True for labels already in normalized form
    pub fn is_plain_label(&self) -> bool {
        matches!(self.kind, NodeKind::Label { shadow: false })
    }

    /// True for literal labels whose normalized form differs
    pub fn is_shadow_label(&self) -> bool {
        matches!(self.kind, NodeKind::Label { shadow: true })
    }

    /// Display width hint, proportional to the name length
    pub fn display_width(&self) -> f64 {
        7.0 * self.key.name.chars().count() as f64
    }
}

/// Edge type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Variable to variable correspondence
    Mapping,
    /// Label naming a variable
    LabelReference,
}

/// Edge in the field graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    /// Edge type
    pub kind: EdgeKind,
    /// Soft-delete marker set by conflict resolution
    pub removed: bool,
    /// Synthesized by the transitive pass
    pub added: bool,
    /// Change identifiers that touched this edge, in order
    pub changes: Vec<ChangeId>,
}

impl Edge {
    fn with_kind(kind: EdgeKind) -> Self {
        Self {
            kind,
            removed: false,
            added: false,
            changes: Vec::new(),
        }
    }

    /// Fresh mapping edge
    pub fn mapping() -> Self {
        Self::with_kind(EdgeKind::Mapping)
    }

    /// Fresh label reference edge
    pub fn label_reference() -> Self {
        Self::with_kind(EdgeKind::LabelReference)
    }

    /// Label reference synthesized by the transitive pass
    pub fn synthesized(change: ChangeId) -> Self {
        Self {
            kind: EdgeKind::LabelReference,
            removed: false,
            added: true,
            changes: vec![change],
        }
    }

    /// Append a change identifier to the audit trail
    pub fn record_change(&mut self, change: ChangeId) {
        self.changes.push(change);
    }

    /// Audit trail rendered as a comma-joined list
    pub fn audit_label(&self) -> String {
        self.changes
            .iter()
            .map(ChangeId::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Monotonic change identifier source, one per run
#[derive(Debug, Clone, Default)]
pub struct ChangeSeq {
    last: ChangeId,
}

impl ChangeSeq {
    /// Create a sequence starting at 1
    pub fn new() -> Self {
        Self::default()
    }

    /// Next identifier
    pub fn next_id(&mut self) -> ChangeId {
        self.last += 1;
        self.last
    }

    /// Last identifier handed out (0 if none)
    pub fn last(&self) -> ChangeId {
        self.last
    }
}
