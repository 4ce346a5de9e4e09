//! Rule actions: mutations applied to a matched entity.

use std::fmt;
use std::str::FromStr;

use rulebook_core::{display_value, Record, MARKED_FOR_DELETION};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::condition::{check_field, known_entity_type};
use crate::error::{Result, RuleError};
use crate::registry::EntityTypeRegistry;

/// What an action does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionOp {
    #[serde(rename = "set")]
    Set,
    #[serde(rename = "delete-entity")]
    DeleteEntity,
}

impl ActionOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionOp::Set => "set",
            ActionOp::DeleteEntity => "delete-entity",
        }
    }
}

impl fmt::Display for ActionOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionOp {
    type Err = RuleError;

    /// Empty input is an invalid operation; anything else unrecognised is
    /// an unknown action.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "" => Err(RuleError::InvalidOperation(String::new())),
            "set" => Ok(ActionOp::Set),
            "delete-entity" => Ok(ActionOp::DeleteEntity),
            other => Err(RuleError::UnknownAction(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOptions {
    /// Format string with `{{field}}` placeholders, resolved against the
    /// executing entity. Takes precedence over the action's value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

/// Persisted form of an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDef {
    #[serde(default)]
    pub op: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<ActionOptions>,
}

/// A validated mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    op: ActionOp,
    field: Option<String>,
    value: Value,
    options: ActionOptions,
}

impl Action {
    pub fn new(
        op: ActionOp,
        field: Option<String>,
        value: Value,
        options: ActionOptions,
        entity_type: Option<&str>,
        registry: &EntityTypeRegistry,
    ) -> Result<Self> {
        let field = field.filter(|f| !f.is_empty());

        if let Some(f) = &field {
            check_field(registry, known_entity_type(entity_type), f)?;
            if value == Value::String(String::new()) {
                return Err(RuleError::EmptyField(f.clone()));
            }
        }

        if op == ActionOp::Set && field.is_none() {
            return Err(RuleError::MissingField(op.to_string()));
        }

        Ok(Self {
            op,
            field,
            value,
            options,
        })
    }

    pub fn from_def(
        def: &ActionDef,
        entity_type: Option<&str>,
        registry: &EntityTypeRegistry,
    ) -> Result<Self> {
        let op: ActionOp = def.op.parse()?;
        Self::new(
            op,
            def.field.clone(),
            def.value.clone().unwrap_or(Value::Null),
            def.options.clone().unwrap_or_default(),
            entity_type,
            registry,
        )
    }

    pub fn op(&self) -> ActionOp {
        self.op
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn options(&self) -> &ActionOptions {
        &self.options
    }

    /// Apply the action to `entity` in place.
    pub fn exec(&self, entity: &mut Record) {
        match self.op {
            ActionOp::Set => {
                let Some(field) = &self.field else {
                    return;
                };
                let value = match &self.options.template {
                    Some(template) => Value::String(apply_template(template, entity)),
                    None => self.value.clone(),
                };
                entity.insert(field.clone(), value);
            }
            ActionOp::DeleteEntity => {
                entity.insert(MARKED_FOR_DELETION.to_string(), Value::Bool(true));
            }
        }
    }

    /// Minimal persisted form: `delete-entity` keeps only its optional
    /// target value.
    pub fn serialize(&self) -> ActionDef {
        match self.op {
            ActionOp::DeleteEntity => ActionDef {
                op: self.op.to_string(),
                field: None,
                value: Some(self.value.clone()).filter(|v| !v.is_null()),
                options: None,
            },
            ActionOp::Set => ActionDef {
                op: self.op.to_string(),
                field: self.field.clone(),
                value: Some(self.value.clone()),
                options: Some(self.options.clone()).filter(|o| o.template.is_some()),
            },
        }
    }
}

// ── Templates ───────────────────────────────────────────────────────

/// A segment of a parsed `{{field}}` template.
#[derive(Debug, Clone, PartialEq)]
enum TemplateSegment<'a> {
    Literal(&'a str),
    Field(&'a str),
}

fn is_field_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Split a template into literal text and `{{name}}` placeholders. Anything
/// that is not a well-formed placeholder stays literal.
fn parse_template(template: &str) -> Vec<TemplateSegment<'_>> {
    let mut segments = Vec::new();
    let mut remaining = template;

    while let Some(start) = remaining.find("{{") {
        let after_open = &remaining[start + 2..];
        match after_open.find("}}") {
            Some(end) if is_field_name(&after_open[..end]) => {
                if start > 0 {
                    segments.push(TemplateSegment::Literal(&remaining[..start]));
                }
                segments.push(TemplateSegment::Field(&after_open[..end]));
                remaining = &after_open[end + 2..];
            }
            _ => {
                // Not a placeholder: keep the first brace and rescan after it.
                segments.push(TemplateSegment::Literal(&remaining[..start + 1]));
                remaining = &remaining[start + 1..];
            }
        }
    }

    if !remaining.is_empty() {
        segments.push(TemplateSegment::Literal(remaining));
    }

    segments
}

/// Resolve `{{field}}` placeholders against `entity`. Missing and null
/// fields render as the empty string.
pub fn apply_template(template: &str, entity: &Record) -> String {
    parse_template(template)
        .into_iter()
        .map(|segment| match segment {
            TemplateSegment::Literal(text) => text.to_string(),
            TemplateSegment::Field(name) => display_value(entity.get(name)),
        })
        .collect()
}
