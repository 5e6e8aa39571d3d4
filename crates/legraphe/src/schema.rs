// Client schema input
//
// Deserialized form of an already-normalized client schema document. Only
// the sections the reconciliation reads are modelled; other keys are ignored.

use crate::error::{GraphError, Result};
use crate::model::{FieldType, Model};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;

/// Normalized schema of one client model
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSchema {
    /// Item type name to its fields and creator roles
    #[serde(default)]
    pub item_types: BTreeMap<String, ItemType>,

    /// Field metadata (types)
    #[serde(default)]
    pub meta: Meta,

    /// Citation-style correspondence tables
    #[serde(default)]
    pub csl: CslSchema,
}

/// One item type
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemType {
    /// Item type name
    #[serde(default)]
    pub item_type: String,

    /// Surface field name to base field name
    #[serde(default)]
    pub fields: BTreeMap<String, String>,

    /// Creator roles
    #[serde(default)]
    pub creator_types: Vec<String>,
}

/// Schema metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Meta {
    /// Field name to metadata
    #[serde(default)]
    pub fields: BTreeMap<String, FieldMeta>,
}

/// Per-field metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldMeta {
    /// Semantic type, `text` when absent
    #[serde(rename = "type", default)]
    pub field_type: Option<FieldType>,
}

/// Citation-style tables
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CslSchema {
    /// CSL variable to model field correspondences per kind
    #[serde(default)]
    pub fields: CslFields,

    /// Model creator role to CSL name variable
    #[serde(default)]
    pub names: BTreeMap<String, String>,

    /// CSL variables without a model counterpart, with their kind
    #[serde(default)]
    pub unmapped: BTreeMap<String, UnmappedKind>,

    /// Alias to CSL variable
    #[serde(default)]
    pub alias: BTreeMap<String, String>,
}

/// CSL correspondences per kind
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CslFields {
    /// Text variables
    #[serde(default)]
    pub text: BTreeMap<String, OneOrMany>,

    /// Date variables
    #[serde(default)]
    pub date: BTreeMap<String, OneOrMany>,
}

/// A single model field or a list of them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    /// One field
    One(String),
    /// Several fields
    Many(Vec<String>),
}

impl OneOrMany {
    /// Iterate the field names
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            OneOrMany::One(field) => std::slice::from_ref(field),
            OneOrMany::Many(fields) => fields,
        };
        slice.iter().map(String::as_str)
    }
}

/// Kind of an unmapped CSL variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnmappedKind {
    /// Text variable
    Text,
    /// Date variable
    Date,
    /// Name variable
    Name,
    /// Pure item-type discriminator, never a variable
    Type,
}

impl UnmappedKind {
    /// Variable type, `None` for type discriminators
    pub fn field_type(self) -> Option<FieldType> {
        match self {
            UnmappedKind::Text => Some(FieldType::Text),
            UnmappedKind::Date => Some(FieldType::Date),
            UnmappedKind::Name => Some(FieldType::Name),
            UnmappedKind::Type => None,
        }
    }
}

impl ClientSchema {
    /// Parse a schema from JSON text
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a schema from a JSON reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Declared type of a base field, `text` when untyped
    pub fn field_type(&self, field: &str) -> FieldType {
        self.meta
            .fields
            .get(field)
            .and_then(|meta| meta.field_type)
            .unwrap_or(FieldType::Text)
    }

    /// Surface field to base field, merged over all item types
    ///
    /// Fails when one surface field aliases different base fields in
    /// different item types.
    pub fn base_fields(&self, model: Model) -> Result<BTreeMap<String, String>> {
        let mut base_fields: BTreeMap<String, String> = BTreeMap::new();
        for item_type in self.item_types.values() {
            for (field, base) in &item_type.fields {
                match base_fields.get(field) {
                    Some(previous) if previous != base => {
                        return Err(GraphError::InconsistentBaseField {
                            model,
                            field: field.clone(),
                            base: base.clone(),
                            previous: previous.clone(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        base_fields.insert(field.clone(), base.clone());
                    }
                }
            }
        }
        Ok(base_fields)
    }

    /// Creator roles over all item types, deduplicated and sorted
    pub fn creator_roles(&self) -> Vec<&str> {
        let mut roles: Vec<&str> = self
            .item_types
            .values()
            .flat_map(|item_type| item_type.creator_types.iter().map(String::as_str))
            .collect();
        roles.sort_unstable();
        roles.dedup();
        roles
    }
}
