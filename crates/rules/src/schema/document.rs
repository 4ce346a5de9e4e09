//! Concrete document types and the multi-kind container.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{DocumentKind, DocumentMetadata};
use crate::action::ActionDef;
use crate::condition::ConditionDef;
use crate::registry::{DefaultFields, EntityTypeDefinition, FieldDefinition};
use crate::rule::{ConditionsOp, RuleDefinition, Stage};

/// The only schema version understood so far.
pub const API_VERSION: &str = "v1";

// ── EntityType ──────────────────────────────────────────────────────

/// An entity type declared in YAML.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EntityTypeDocument {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: DocumentMetadata,
    pub spec: EntityTypeSpec,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EntityTypeSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_fields: Option<DefaultFields>,
    /// Explicit fields in declaration order.
    #[serde(default)]
    pub fields: IndexMap<String, FieldDefinition>,
}

impl EntityTypeDocument {
    pub fn from_definition(def: &EntityTypeDefinition) -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: DocumentKind::EntityType.to_string(),
            metadata: DocumentMetadata::new(def.id.clone(), def.display_name.clone()),
            spec: EntityTypeSpec {
                default_fields: def.default_fields,
                fields: def.fields.clone(),
            },
        }
    }

    /// Check what serde cannot: version, id and field names.
    pub fn validate(&self) -> std::result::Result<(), String> {
        validate_header(&self.api_version, &self.metadata)?;
        if let Some(name) = self.spec.fields.keys().find(|name| !is_valid_name(name)) {
            return Err(format!(
                "entity type '{}' has an invalid field name '{}'",
                self.metadata.id, name
            ));
        }
        Ok(())
    }

    pub fn into_definition(self) -> EntityTypeDefinition {
        EntityTypeDefinition {
            id: self.metadata.id,
            display_name: self.metadata.name,
            fields: self.spec.fields,
            default_fields: self.spec.default_fields,
        }
    }
}

// ── Rule ────────────────────────────────────────────────────────────

/// A rule declared in YAML; `metadata.id` is the rule id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RuleDocument {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: DocumentMetadata,
    pub spec: RuleSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RuleSpec {
    pub entity_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    #[serde(default)]
    pub conditions_op: ConditionsOp,
    #[serde(default)]
    pub conditions: Vec<ConditionDef>,
    #[serde(default)]
    pub actions: Vec<ActionDef>,
}

impl RuleDocument {
    pub fn validate(&self) -> std::result::Result<(), String> {
        validate_header(&self.api_version, &self.metadata)?;
        if self.spec.entity_type.is_empty() {
            return Err(format!("rule '{}' has no entityType", self.metadata.id));
        }
        Ok(())
    }

    pub fn to_definition(&self) -> RuleDefinition {
        RuleDefinition {
            id: Some(self.metadata.id.clone()),
            entity_type: self.spec.entity_type.clone(),
            stage: self.spec.stage,
            conditions_op: self.spec.conditions_op,
            conditions: self.spec.conditions.clone(),
            actions: self.spec.actions.clone(),
        }
    }
}

// ── Container ───────────────────────────────────────────────────────

/// A fully deserialized document of any supported kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    EntityType(EntityTypeDocument),
    Rule(RuleDocument),
}

impl Document {
    pub fn metadata(&self) -> &DocumentMetadata {
        match self {
            Document::EntityType(doc) => &doc.metadata,
            Document::Rule(doc) => &doc.metadata,
        }
    }

    pub fn kind(&self) -> DocumentKind {
        match self {
            Document::EntityType(_) => DocumentKind::EntityType,
            Document::Rule(_) => DocumentKind::Rule,
        }
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        match self {
            Document::EntityType(doc) => doc.validate(),
            Document::Rule(doc) => doc.validate(),
        }
    }

    pub fn to_yaml(&self) -> std::result::Result<String, serde_yaml::Error> {
        match self {
            Document::EntityType(doc) => serde_yaml::to_string(doc),
            Document::Rule(doc) => serde_yaml::to_string(doc),
        }
    }
}

fn validate_header(api_version: &str, metadata: &DocumentMetadata) -> std::result::Result<(), String> {
    if api_version != API_VERSION {
        return Err(format!(
            "unsupported apiVersion '{}' (expected '{}')",
            api_version, API_VERSION
        ));
    }
    if !is_valid_name(&metadata.id) {
        return Err(format!("invalid metadata.id '{}'", metadata.id));
    }
    Ok(())
}

/// Ids and field names: non-empty, ASCII alphanumerics plus `_` and `-`.
fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
