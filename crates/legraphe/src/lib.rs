//! legraphe - Field Mapping Graph Core
//!
//! *Le Graphe* (The Graph) - reconciles the field vocabularies of two client
//! models and a citation-style vocabulary into one label-addressed mapping.

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

/// Transitive (hop-through) closure pass.
pub mod closure;
/// Error types.
pub mod error;
/// GML and markdown exporters.
pub mod export;
/// Label builder.
pub mod labels;
/// Schema loader.
pub mod loader;
/// Node, edge and domain types.
pub mod model;
/// Label text normalization.
pub mod normalize;
/// Mapping table projection.
pub mod projection;
/// Multi-line field purge.
pub mod purge;
/// Reconciliation run.
pub mod reconcile;
/// Conflict resolution.
pub mod resolve;
/// Client schema input types.
pub mod schema;
/// Sorted graph snapshot.
pub mod snapshot;
/// Field graph store.
pub mod store;

pub use error::{GraphError, Result};
pub use model::{Domain, Edge, EdgeKind, FieldType, Model, Node, NodeKey, NodeKind};
pub use projection::{DocRow, MappingEntry, MappingTable};
pub use reconcile::{Reconciler, Reconciliation};
pub use schema::ClientSchema;
pub use snapshot::GraphSnapshot;
pub use store::FieldGraph;
