// Variable loader
//
// Ingests one client schema into the field graph. Loading is additive and
// commutative: node identity is the semantic key and edges are unique per
// endpoint pair, so the load order of the two models does not matter.

use crate::error::Result;
use crate::model::{Domain, FieldType, Model, NodeKey};
use crate::schema::{ClientSchema, OneOrMany};
use crate::store::FieldGraph;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Aliases collected during loading, turned into labels once all schemas
/// are in
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingLabels {
    /// `(model, base field, surface field)` for surface names that differ
    /// from their base field
    pub model_aliases: BTreeSet<(Model, String, String)>,

    /// `(csl variable, alias)`
    pub csl_aliases: BTreeSet<(String, String)>,
}

impl PendingLabels {
    /// Total number of remembered aliases
    pub fn len(&self) -> usize {
        self.model_aliases.len() + self.csl_aliases.len()
    }

    /// True when nothing is pending
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Counts reported by one load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Variables declared (including merges)
    pub variables: usize,
    /// Bidirectional mappings declared
    pub mappings: usize,
    /// Aliases remembered for labelling
    pub aliases: usize,
}

/// Load one schema as `model`
///
/// # Arguments
/// * `graph` - Graph receiving variables and mapping edges
/// * `pending` - Alias collector for the label builder
/// * `schema` - Normalized client schema
/// * `model` - Which source model the schema describes
pub fn load_schema(
    graph: &mut FieldGraph,
    pending: &mut PendingLabels,
    schema: &ClientSchema,
    model: Model,
) -> Result<LoadSummary> {
    let mut loader = Loader {
        graph,
        model,
        summary: LoadSummary::default(),
    };
    let domain = Domain::Model(model);

    let base_fields = schema.base_fields(model)?;
    for base in base_fields.values().collect::<BTreeSet<_>>() {
        loader.variable(domain, base, schema.field_type(base))?;
    }

    for role in schema.creator_roles() {
        loader.variable(domain, role, FieldType::Name)?;
    }

    loader.kind(&schema.csl.fields.text, FieldType::Text)?;
    loader.kind(&schema.csl.fields.date, FieldType::Date)?;

    for (role, csl) in &schema.csl.names {
        loader.variable(Domain::Csl, csl, FieldType::Name)?;
        loader.variable(domain, role, FieldType::Name)?;
        loader.mapping(csl, role)?;
    }

    for (csl, kind) in &schema.csl.unmapped {
        match kind.field_type() {
            Some(field_type) => loader.variable(Domain::Csl, csl, field_type)?,
            None => debug!(csl = %csl, "skipping type discriminator"),
        }
    }

    let summary = loader.summary;
    let before = pending.len();
    for (field, base) in &base_fields {
        if field != base {
            pending
                .model_aliases
                .insert((model, base.clone(), field.clone()));
        }
    }
    for (alias, field) in &schema.csl.alias {
        pending.csl_aliases.insert((field.clone(), alias.clone()));
    }

    let summary = LoadSummary {
        aliases: pending.len() - before,
        ..summary
    };
    info!(
        %model,
        variables = summary.variables,
        mappings = summary.mappings,
        aliases = summary.aliases,
        "loaded schema"
    );
    Ok(summary)
}

struct Loader<'g> {
    graph: &'g mut FieldGraph,
    model: Model,
    summary: LoadSummary,
}

impl Loader<'_> {
    fn variable(&mut self, domain: Domain, name: &str, field_type: FieldType) -> Result<()> {
        self.graph.add_variable(domain, name, field_type, self.model)?;
        self.summary.variables += 1;
        Ok(())
    }

    fn mapping(&mut self, csl: &str, field: &str) -> Result<()> {
        self.graph.add_mapping(
            &NodeKey::new(Domain::Csl, csl),
            &NodeKey::new(Domain::Model(self.model), field),
            true,
        )?;
        self.summary.mappings += 1;
        Ok(())
    }

    fn kind(&mut self, table: &BTreeMap<String, OneOrMany>, field_type: FieldType) -> Result<()> {
        let domain = Domain::Model(self.model);
        for (csl, fields) in table {
            self.variable(Domain::Csl, csl, field_type)?;
            for field in fields.iter() {
                self.variable(domain, field, field_type)?;
                self.mapping(csl, field)?;
            }
        }
        Ok(())
    }
}
