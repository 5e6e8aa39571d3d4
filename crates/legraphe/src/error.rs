// Reconciliation errors
//
// Every variant is fatal for the run: once schema data is internally
// inconsistent there is no trustworthy partial mapping to hand out.

use crate::model::{Domain, FieldType, Model};
use thiserror::Error;

/// Result type for graph operations
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors raised while building or finalizing the field graph
#[derive(Debug, Error)]
pub enum GraphError {
    /// A variable was re-declared with a different semantic type
    #[error("type mismatch for {domain}:{name}: recorded as {existing}, redeclared as {declared}")]
    TypeMismatch {
        /// Domain of the variable
        domain: Domain,
        /// Variable name
        name: String,
        /// Type recorded by the first declaration
        existing: FieldType,
        /// Type of the conflicting declaration
        declared: FieldType,
    },

    /// A label points at a variable that is not in the graph
    #[error("label `{label}` references missing variable {domain}:{name}")]
    DanglingLabel {
        /// Domain of the missing variable
        domain: Domain,
        /// Name of the missing variable
        name: String,
        /// Label text that was being attached
        label: String,
    },

    /// A name-typed label still resolves to several fields of one domain
    #[error("name label `{label}` maps to {} {domain} fields: {}", fields.len(), fields.join(", "))]
    AmbiguousNameMapping {
        /// Label text
        label: String,
        /// Domain holding more than one field
        domain: Domain,
        /// Fields the label resolves to in that domain
        fields: Vec<String>,
    },

    /// A label references variables of different types
    #[error("label `{label}` mixes {existing} and {found} variables (at {variable})")]
    LabelTypeConflict {
        /// Label text
        label: String,
        /// Type established by earlier variables
        existing: FieldType,
        /// Type of the offending variable
        found: FieldType,
        /// Offending variable key
        variable: String,
    },

    /// The same surface field aliases different base fields across item types
    #[error("{model}: field `{field}` aliases `{base}` but was already aliased to `{previous}`")]
    InconsistentBaseField {
        /// Source model of the schema
        model: Model,
        /// Surface field name
        field: String,
        /// Base field seen now
        base: String,
        /// Base field seen before
        previous: String,
    },

    /// A mapping endpoint was never declared as a variable
    #[error("unknown variable {domain}:{name}")]
    UnknownVariable {
        /// Domain of the endpoint
        domain: Domain,
        /// Name of the endpoint
        name: String,
    },

    /// Variables cannot live in the label domain
    #[error("`{name}` cannot be declared as a variable in the {domain} domain")]
    InvalidDomain {
        /// Rejected domain
        domain: Domain,
        /// Variable name
        name: String,
    },

    /// Schema document could not be parsed
    #[error("schema parse error: {0}")]
    Schema(#[from] serde_json::Error),
}
