//! Entity type registry: field schemas per domain type.
//!
//! The registry is an explicit value built once at startup (usually from
//! the YAML documents in [`crate::schema`]) and handed by reference to rule
//! construction and the condition editor. It is not synchronised: register
//! every type before any rule is loaded.

use std::collections::{BTreeSet, HashMap};

use indexmap::IndexMap;
use rulebook_core::{FieldType, Operator};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Schema of one field of an entity type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FieldDefinition {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    /// Operators the lattice would allow but this field does not.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub disallowed_ops: BTreeSet<Operator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl FieldDefinition {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: false,
            disallowed_ops: BTreeSet::new(),
            display_name: None,
        }
    }

    /// Shorthand for a string field.
    pub fn string() -> Self {
        Self::new(FieldType::String)
    }

    /// Shorthand for a numeric field.
    pub fn number() -> Self {
        Self::new(FieldType::Number)
    }

    /// Shorthand for a date field.
    pub fn date() -> Self {
        Self::new(FieldType::Date)
    }

    /// Shorthand for a boolean field.
    pub fn boolean() -> Self {
        Self::new(FieldType::Boolean)
    }

    /// Shorthand for an id (reference) field.
    pub fn id() -> Self {
        Self::new(FieldType::Id)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn named(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn disallow(mut self, op: Operator) -> Self {
        self.disallowed_ops.insert(op);
        self
    }
}

/// Which implicit fields an entity type exposes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultFields {
    #[serde(default)]
    pub date: bool,
    #[serde(default)]
    pub notes: bool,
    #[serde(default)]
    pub amount: bool,
}

/// The three implicit field names, in overlay order.
pub const DEFAULT_FIELD_NAMES: [&str; 3] = ["date", "notes", "amount"];

impl DefaultFields {
    fn enabled(&self, name: &str) -> bool {
        match name {
            "date" => self.date,
            "notes" => self.notes,
            "amount" => self.amount,
            _ => false,
        }
    }
}

/// Synthesized definition of an implicit field.
fn default_field(name: &str) -> Option<FieldDefinition> {
    match name {
        "date" => Some(FieldDefinition::date().named("Date")),
        "notes" => Some(
            FieldDefinition::string()
                .named("Notes")
                .disallow(Operator::OneOf)
                .disallow(Operator::NotOneOf),
        ),
        "amount" => Some(FieldDefinition::number().named("Amount")),
        _ => None,
    }
}

/// A registered domain type (note, product, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EntityTypeDefinition {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub fields: IndexMap<String, FieldDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_fields: Option<DefaultFields>,
}

impl EntityTypeDefinition {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            fields: IndexMap::new(),
            default_fields: None,
        }
    }

    pub fn field(mut self, name: impl Into<String>, def: FieldDefinition) -> Self {
        self.fields.insert(name.into(), def);
        self
    }

    pub fn with_default_fields(mut self, defaults: DefaultFields) -> Self {
        self.default_fields = Some(defaults);
        self
    }

    /// Effective definition of one field.
    ///
    /// Explicit fields win: an implicit default is only used when `fields`
    /// does not already declare the name.
    pub fn effective_field(&self, name: &str) -> Option<FieldDefinition> {
        if let Some(def) = self.fields.get(name) {
            return Some(def.clone());
        }
        match self.default_fields {
            Some(defaults) if defaults.enabled(name) => default_field(name),
            _ => None,
        }
    }

    /// Effective field map: explicit fields in declaration order, then the
    /// enabled implicit fields that were not declared explicitly.
    pub fn effective_fields(&self) -> IndexMap<String, FieldDefinition> {
        let mut fields = self.fields.clone();
        if let Some(defaults) = self.default_fields {
            for name in DEFAULT_FIELD_NAMES {
                if defaults.enabled(name) && !fields.contains_key(name) {
                    if let Some(def) = default_field(name) {
                        fields.insert(name.to_string(), def);
                    }
                }
            }
        }
        fields
    }
}

/// Catalog of entity types keyed by id.
#[derive(Debug, Clone, Default)]
pub struct EntityTypeRegistry {
    types: HashMap<String, EntityTypeDefinition>,
}

impl EntityTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a definition under its id. Re-registering an id replaces the
    /// previous definition (last write wins). Field shapes are not validated.
    pub fn register(&mut self, def: EntityTypeDefinition) {
        let id = def.id.clone();
        let field_count = def.fields.len();
        if self.types.insert(id.clone(), def).is_some() {
            debug!(entity_type = %id, "replaced existing entity type definition");
        }
        info!(entity_type = %id, fields = field_count, "registered entity type");
    }

    pub fn get(&self, type_id: &str) -> Option<&EntityTypeDefinition> {
        self.types.get(type_id)
    }

    /// All registered definitions, sorted by id.
    pub fn get_all(&self) -> Vec<&EntityTypeDefinition> {
        let mut all: Vec<_> = self.types.values().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// Effective field map of a type, `None` for unknown types.
    pub fn get_fields(&self, type_id: &str) -> Option<IndexMap<String, FieldDefinition>> {
        self.get(type_id).map(EntityTypeDefinition::effective_fields)
    }

    /// Effective definition of a single field.
    pub fn field(&self, type_id: &str, field: &str) -> Option<FieldDefinition> {
        self.get(type_id)?.effective_field(field)
    }

    pub fn field_type(&self, type_id: &str, field: &str) -> Option<FieldType> {
        self.field(type_id, field).map(|def| def.field_type)
    }

    pub fn contains(&self, type_id: &str) -> bool {
        self.types.contains_key(type_id)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
