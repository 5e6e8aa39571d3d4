// lepasserelle - CLI & Integration
//
// *La Passerelle* (The Bridge) - reads schema files, runs the reconciliation
// and writes its outputs

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

/// Command-line interface.
pub mod cli;
/// TOML run configuration.
pub mod config;
/// Output rendering and atomic file writes.
pub mod output;

pub use cli::{find_entry, reconcile_files, Cli, SchemaArgs};
pub use config::ReconcileConfig;
pub use output::Outputs;
