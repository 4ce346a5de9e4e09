//! Rule storage providers and the stored record format.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::error::{LoadError, LoadResult, LoadStatus, Result};
use super::files::{ensure_dir, scan_documents};
use crate::error::RuleError;
use crate::rule::{ConditionsOp, RuleDefinition, Stage};
use crate::schema::Document;

/// Source of stored rule records.
pub trait RuleStorage {
    /// Every stored record, tombstoned ones included.
    fn list(&self) -> Result<Vec<RuleRecord>>;
}

/// A rule as a storage provider hands it over.
///
/// Column names may be snake_case (`entity_type`, `conditions_op`) or
/// camelCase; the snake_case column wins when both are present and
/// non-empty. `conditions`/`actions` may be JSON text or already-decoded
/// JSON. `tombstone` may be a boolean or `0`/`1`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(default, rename = "entityType", skip_serializing_if = "Option::is_none")]
    pub entity_type_camel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions_op: Option<String>,
    #[serde(default, rename = "conditionsOp", skip_serializing_if = "Option::is_none")]
    pub conditions_op_camel: Option<String>,
    #[serde(default)]
    pub conditions: Value,
    #[serde(default)]
    pub actions: Value,
    #[serde(default)]
    pub tombstone: Value,
}

/// First present, non-empty value.
fn first_non_empty<'a>(a: &'a Option<String>, b: &'a Option<String>) -> Option<&'a str> {
    a.as_deref()
        .filter(|s| !s.is_empty())
        .or_else(|| b.as_deref().filter(|s| !s.is_empty()))
}

/// Decode a JSON column into a list, accepting text or structured JSON.
fn decode_list<T: serde::de::DeserializeOwned>(column: &str, value: &Value) -> std::result::Result<Vec<T>, RuleError> {
    let decoded = match value {
        Value::Null => return Ok(Vec::new()),
        Value::String(text) if text.trim().is_empty() => return Ok(Vec::new()),
        Value::String(text) => serde_json::from_str(text),
        other => serde_json::from_value(other.clone()),
    };
    decoded.map_err(|e| RuleError::Decode(format!("{column}: {e}")))
}

impl RuleRecord {
    pub fn is_tombstoned(&self) -> bool {
        match &self.tombstone {
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().map(|n| n != 0.0).unwrap_or(false),
            Value::String(s) => matches!(s.as_str(), "1" | "true"),
            _ => false,
        }
    }

    /// Reconcile column naming and decode the JSON columns.
    pub fn to_definition(&self) -> std::result::Result<RuleDefinition, RuleError> {
        let entity_type = first_non_empty(&self.entity_type, &self.entity_type_camel)
            .unwrap_or_default()
            .to_string();

        let stage = match self.stage.as_deref() {
            None | Some("") => None,
            Some("pre") => Some(Stage::Pre),
            Some("post") => Some(Stage::Post),
            Some(other) => return Err(RuleError::Decode(format!("stage: unknown stage '{other}'"))),
        };

        let conditions_op = match first_non_empty(&self.conditions_op, &self.conditions_op_camel) {
            None | Some("and") => ConditionsOp::And,
            Some("or") => ConditionsOp::Or,
            Some(other) => {
                return Err(RuleError::Decode(format!(
                    "conditions_op: unknown conjunction '{other}'"
                )))
            }
        };

        Ok(RuleDefinition {
            id: self.id.clone(),
            entity_type,
            stage,
            conditions_op,
            conditions: decode_list("conditions", &self.conditions)?,
            actions: decode_list("actions", &self.actions)?,
        })
    }

    /// Storage form of a definition: snake_case columns, JSON text columns.
    pub fn from_definition(def: &RuleDefinition) -> Self {
        let encode = |value: serde_json::Result<String>| {
            value.map(Value::String).unwrap_or(Value::Null)
        };
        Self {
            id: def.id.clone(),
            entity_type: Some(def.entity_type.clone()),
            entity_type_camel: None,
            stage: def.stage.map(|s| s.as_str().to_string()),
            conditions_op: Some(
                match def.conditions_op {
                    ConditionsOp::And => "and",
                    ConditionsOp::Or => "or",
                }
                .to_string(),
            ),
            conditions_op_camel: None,
            conditions: encode(serde_json::to_string(&def.conditions)),
            actions: encode(serde_json::to_string(&def.actions)),
            tombstone: Value::Bool(false),
        }
    }
}

// ── In-memory storage ───────────────────────────────────────────────

/// Rule records held in memory. Deletes set the tombstone.
#[derive(Debug, Clone, Default)]
pub struct MemoryRuleStorage {
    records: Vec<RuleRecord>,
    next_id: u64,
}

impl MemoryRuleStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<RuleRecord>) -> Self {
        Self {
            records,
            next_id: 0,
        }
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.records
            .iter()
            .position(|r| r.id.as_deref() == Some(id))
    }

    /// Store a new rule and return its id. Definitions without an id get a
    /// generated one.
    pub fn insert(&mut self, def: &RuleDefinition) -> String {
        let id = match def.id.as_deref().filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => loop {
                self.next_id += 1;
                let candidate = format!("rule-{}", self.next_id);
                if self.position(&candidate).is_none() {
                    break candidate;
                }
            },
        };
        let mut record = RuleRecord::from_definition(def);
        record.id = Some(id.clone());
        self.records.push(record);
        id
    }

    /// Replace the stored record with the same id.
    pub fn update(&mut self, def: &RuleDefinition) -> Result<()> {
        let id = def
            .id
            .as_deref()
            .ok_or_else(|| LoadError::Storage("cannot update a rule without an id".to_string()))?;
        let index = self
            .position(id)
            .ok_or_else(|| LoadError::Storage(format!("no rule with id '{id}'")))?;
        self.records[index] = RuleRecord::from_definition(def);
        Ok(())
    }

    /// Tombstone a rule. Returns whether it existed.
    pub fn delete(&mut self, id: &str) -> bool {
        match self.position(id) {
            Some(index) => {
                self.records[index].tombstone = Value::Bool(true);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RuleStorage for MemoryRuleStorage {
    fn list(&self) -> Result<Vec<RuleRecord>> {
        Ok(self.records.clone())
    }
}

// ── Directory storage ───────────────────────────────────────────────

/// Rules read from `kind: Rule` YAML documents under a directory. A
/// document with `metadata.enabled: false` is listed as tombstoned.
#[derive(Debug, Clone)]
pub struct DirRuleStorage {
    dir: PathBuf,
}

impl DirRuleStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Scan the directory, returning the records and the per-file results.
    pub fn scan(&self) -> Result<(Vec<RuleRecord>, Vec<LoadResult>)> {
        ensure_dir(&self.dir)?;
        let mut records = Vec::new();
        let mut results = Vec::new();
        scan_documents(&self.dir, &mut results, &mut |_, doc| match doc {
            Document::Rule(doc) => {
                let id = doc.metadata.id.clone();
                let mut record = RuleRecord::from_definition(&doc.to_definition());
                record.tombstone = Value::Bool(!doc.metadata.enabled);
                records.push(record);
                LoadStatus::Loaded { id }
            }
            other => LoadStatus::Skipped {
                reason: format!("{} document", other.kind()),
            },
        })?;
        info!(path = %self.dir.display(), rules = records.len(), "scanned rule directory");
        Ok((records, results))
    }
}

impl RuleStorage for DirRuleStorage {
    fn list(&self) -> Result<Vec<RuleRecord>> {
        self.scan().map(|(records, _)| records)
    }
}
