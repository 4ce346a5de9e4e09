//! Tests for schema and rule-set loading.

use std::fs;
use std::path::PathBuf;

use pretty_assertions::assert_eq;
use rulebook_core::{EngineConfig, FieldType, Record};
use serde_json::{json, Value};
use tempfile::TempDir;

use super::*;
use crate::registry::EntityTypeRegistry;
use crate::rule::{RuleDefinition, Stage};
use crate::schema::builtin_registry;

const GADGET_YAML: &str = r#"
apiVersion: v1
kind: EntityType
metadata:
  id: gadget
  name: Gadget
spec:
  fields:
    serial:
      type: id
    voltage:
      type: number
"#;

const RULE_YAML: &str = r#"
apiVersion: v1
kind: Rule
metadata:
  id: flag-cheap
  name: Flag cheap products
spec:
  entityType: product
  conditions:
    - field: price
      op: lt
      value: 5
  actions:
    - op: set
      field: category
      value: bargain
"#;

fn record(value: Value) -> Record {
    value.as_object().cloned().unwrap()
}

fn definition(value: Value) -> RuleDefinition {
    serde_json::from_value(value).unwrap()
}

fn stored(value: Value) -> RuleRecord {
    serde_json::from_value(value).unwrap()
}

/// Show loader logs with `RUST_LOG=rulebook_rules=debug cargo test`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

// ── Schema files ────────────────────────────────────────────────────

#[test]
fn load_dir_registers_entity_types_and_skips_the_rest() {
    init_tracing();
    let dir = TempDir::new().expect("create tempdir");
    fs::write(dir.path().join("gadget.yml"), GADGET_YAML).unwrap();
    fs::write(dir.path().join(".hidden.yml"), GADGET_YAML).unwrap();
    fs::write(dir.path().join("readme.txt"), "not a schema").unwrap();
    fs::write(dir.path().join("flag-cheap.yaml"), RULE_YAML).unwrap();
    fs::write(dir.path().join("broken.yml"), "apiVersion: v1\nkind: [").unwrap();

    let mut registry = EntityTypeRegistry::new();
    let results = registry.load_dir(dir.path()).unwrap();

    let loaded = results.iter().filter(|r| r.status.is_loaded()).count();
    let failed = results.iter().filter(|r| r.status.is_failed()).count();
    let skipped = results
        .iter()
        .filter(|r| matches!(r.status, LoadStatus::Skipped { .. }))
        .count();
    assert_eq!((loaded, failed, skipped), (1, 1, 3));

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.field_type("gadget", "serial"), Some(FieldType::Id));
}

#[test]
fn load_dir_recurses_into_subdirectories() {
    let dir = TempDir::new().expect("create tempdir");
    let nested = dir.path().join("hardware");
    fs::create_dir(&nested).unwrap();
    fs::write(nested.join("gadget.yml"), GADGET_YAML).unwrap();

    let mut registry = EntityTypeRegistry::new();
    let results = registry.load_dir(dir.path()).unwrap();
    assert_eq!(results.len(), 1);
    assert!(registry.contains("gadget"));
}

#[test]
fn load_file_rejects_other_kinds() {
    let dir = TempDir::new().expect("create tempdir");
    let path = dir.path().join("rule.yml");
    fs::write(&path, RULE_YAML).unwrap();

    let mut registry = EntityTypeRegistry::new();
    let err = registry.load_file(&path).unwrap_err();
    assert!(matches!(err, LoadError::Validation(_)));
    assert!(registry.is_empty());

    let gadget = dir.path().join("gadget.yml");
    fs::write(&gadget, GADGET_YAML).unwrap();
    assert_eq!(registry.load_file(&gadget).unwrap(), "gadget");
}

#[test]
fn parse_document_rejects_empty_id() {
    let yaml = GADGET_YAML.replace("id: gadget", "id: \"\"");
    let err = parse_document(&yaml).unwrap_err();
    assert!(err.to_string().contains("metadata.id"));
}

#[test]
fn registry_from_config_overlays_schema_dir() {
    let dir = TempDir::new().expect("create tempdir");
    fs::write(dir.path().join("gadget.yml"), GADGET_YAML).unwrap();

    let config = EngineConfig {
        schema_dir: Some(PathBuf::from(dir.path())),
        ..EngineConfig::default()
    };
    let registry = registry_from_config(&config).unwrap();
    let ids: Vec<_> = registry.get_all().iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["gadget", "note", "product"]);

    let builtin_only = registry_from_config(&EngineConfig::default()).unwrap();
    assert_eq!(builtin_only.len(), 2);
}

// ── Storage records ─────────────────────────────────────────────────

#[test]
fn record_reconciles_column_names() {
    let snake = stored(json!({
        "id": "r1",
        "entity_type": "note",
        "conditions_op": "or",
        "conditions": "[{\"field\":\"priority\",\"op\":\"is\",\"value\":\"high\"}]",
        "actions": "[]",
        "tombstone": 0
    }));
    let def = snake.to_definition().unwrap();
    assert_eq!(def.entity_type, "note");
    assert_eq!(def.conditions.len(), 1);
    assert!(!snake.is_tombstoned());

    let camel = stored(json!({
        "id": "r2",
        "entity_type": "",
        "entityType": "product",
        "conditionsOp": "and",
        "stage": "post",
        "conditions": [{"field": "price", "op": "gt", "value": 1}],
        "tombstone": true
    }));
    let def = camel.to_definition().unwrap();
    assert_eq!(def.entity_type, "product");
    assert_eq!(def.stage, Some(Stage::Post));
    assert!(def.actions.is_empty());
    assert!(camel.is_tombstoned());
}

#[test]
fn record_decode_errors() {
    let bad_json = stored(json!({"entity_type": "note", "conditions": "[{"}));
    assert_eq!(bad_json.to_definition().unwrap_err().code(), "decode");

    let bad_stage = stored(json!({"entity_type": "note", "stage": "middle"}));
    assert_eq!(bad_stage.to_definition().unwrap_err().code(), "decode");
}

#[test]
fn record_round_trips_definition() {
    let def = definition(json!({
        "id": "r1",
        "entityType": "note",
        "stage": "pre",
        "conditionsOp": "or",
        "conditions": [{"field": "priority", "op": "oneOf", "value": ["high"]}],
        "actions": [{"op": "delete-entity"}]
    }));
    let record = RuleRecord::from_definition(&def);
    assert!(record.conditions.is_string());
    assert_eq!(record.to_definition().unwrap(), def);
}

#[test]
fn memory_storage_insert_update_delete() {
    let mut storage = MemoryRuleStorage::new();
    let mut def = definition(json!({
        "entityType": "note",
        "conditions": [{"field": "priority", "op": "is", "value": "high"}],
        "actions": [{"op": "set", "field": "status", "value": "triaged"}]
    }));

    let id = storage.insert(&def);
    assert_eq!(id, "rule-1");
    assert_eq!(storage.insert(&def), "rule-2");

    def.id = Some(id.clone());
    def.actions[0].value = Some(json!("escalated"));
    storage.update(&def).unwrap();

    def.id = Some("missing".into());
    assert!(matches!(storage.update(&def), Err(LoadError::Storage(_))));

    assert!(storage.delete("rule-2"));
    assert!(!storage.delete("rule-9"));

    let records = storage.list().unwrap();
    assert_eq!(records.len(), 2);
    assert!(!records[0].is_tombstoned());
    assert!(records[1].is_tombstoned());
    assert_eq!(
        records[0].to_definition().unwrap().actions[0].value,
        Some(json!("escalated"))
    );
}

// ── Rule sets ───────────────────────────────────────────────────────

fn sample_storage() -> MemoryRuleStorage {
    MemoryRuleStorage::with_records(vec![
        stored(json!({
            "id": "post-archive",
            "entity_type": "note",
            "stage": "post",
            "conditions": [{"field": "status", "op": "is", "value": "triaged"}],
            "actions": [{"op": "set", "field": "content", "value": "archived"}]
        })),
        stored(json!({
            "id": "triage",
            "entityType": "note",
            "conditions": [{"field": "priority", "op": "is", "value": "high"}],
            "actions": [{"op": "set", "field": "status", "value": "triaged"}]
        })),
        stored(json!({
            "id": "bad-field",
            "entity_type": "note",
            "conditions": [{"field": "colour", "op": "is", "value": "red"}]
        })),
        stored(json!({
            "id": "deleted",
            "entity_type": "note",
            "conditions": [{"field": "priority", "op": "is", "value": "high"}],
            "actions": [{"op": "delete-entity"}],
            "tombstone": 1
        })),
        stored(json!({
            "id": "pre-title",
            "entity_type": "note",
            "stage": "pre",
            "conditions": [{"field": "title", "op": "contains", "value": "!"}],
            "actions": [{"op": "set", "field": "priority", "value": "high"}]
        })),
        stored(json!({
            "id": "product-rule",
            "entity_type": "product",
            "conditions": [{"field": "price", "op": "lt", "value": 5}],
            "actions": [{"op": "set", "field": "category", "value": "bargain"}]
        })),
    ])
}

#[test]
fn load_skips_and_reports_bad_rules() {
    init_tracing();
    let set = RuleSet::load(&sample_storage(), &builtin_registry(), false).unwrap();

    let ids: Vec<_> = set.rules().iter().filter_map(|r| r.get_id()).collect();
    assert_eq!(ids, vec!["pre-title", "triage", "product-rule", "post-archive"]);

    let report = |id: &str| {
        set.reports()
            .iter()
            .find(|r| r.rule_id == id)
            .map(|r| r.status.clone())
            .unwrap()
    };
    assert_eq!(
        report("bad-field"),
        LoadStatus::Failed {
            error: "invalid field colour for entity type note".into()
        }
    );
    assert!(matches!(report("deleted"), LoadStatus::Skipped { .. }));
    assert!(report("triage").is_loaded());
    assert_eq!(set.reports().len(), 6);
}

#[test]
fn strict_load_aborts() {
    let err = RuleSet::load(&sample_storage(), &builtin_registry(), true).unwrap_err();
    match err {
        LoadError::Rule { rule_id, source } => {
            assert_eq!(rule_id, "bad-field");
            assert_eq!(source.code(), "invalid-field");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn run_chains_rules_in_stage_order() {
    init_tracing();
    let set = RuleSet::load(&sample_storage(), &builtin_registry(), false).unwrap();
    let entity = record(json!({"id": "n1", "title": "Fix now!", "priority": "low", "status": "new"}));

    let diff = set.run("note", &entity);
    assert_eq!(
        diff,
        record(json!({"priority": "high", "status": "triaged", "content": "archived"}))
    );

    let untouched = record(json!({"title": "calm", "priority": "low"}));
    assert!(set.run("note", &untouched).is_empty());
}

#[test]
fn rules_for_filters_by_entity_type() {
    let set = RuleSet::load(&sample_storage(), &builtin_registry(), false).unwrap();
    let product: Vec<_> = set.rules_for("product").filter_map(|r| r.get_id()).collect();
    assert_eq!(product, vec!["product-rule"]);
    assert_eq!(set.rules_for("note").count(), 3);
    assert_eq!(set.rules_for("invoice").count(), 0);

    let applied = set.apply("product", &record(json!({"name": "pen", "price": 2})));
    assert_eq!(applied["category"], json!("bargain"));
    assert!(set.get("triage").is_some());
}

#[test]
fn dir_storage_reads_rule_documents() {
    let dir = TempDir::new().expect("create tempdir");
    fs::write(dir.path().join("flag-cheap.yml"), RULE_YAML).unwrap();
    fs::write(
        dir.path().join("disabled.yml"),
        RULE_YAML
            .replace("id: flag-cheap", "id: disabled")
            .replace("name: Flag cheap products", "name: Disabled\n  enabled: false"),
    )
    .unwrap();
    fs::write(dir.path().join("gadget.yml"), GADGET_YAML).unwrap();

    let storage = DirRuleStorage::new(dir.path());
    let (records, results) = storage.scan().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(results.iter().filter(|r| r.status.is_loaded()).count(), 2);

    let set = RuleSet::load(&storage, &builtin_registry(), true).unwrap();
    let ids: Vec<_> = set.rules().iter().filter_map(|r| r.get_id()).collect();
    assert_eq!(ids, vec!["flag-cheap"]);
}

#[test]
fn load_with_config_uses_strictness_and_window() {
    let config = EngineConfig {
        strict_load: true,
        ..EngineConfig::default()
    };
    assert!(RuleSet::load_with_config(&sample_storage(), &builtin_registry(), &config).is_err());

    let config = EngineConfig {
        date_approx_days: 5,
        ..EngineConfig::default()
    };
    let mut storage = MemoryRuleStorage::new();
    storage.insert(&definition(json!({
        "id": "around-launch",
        "entityType": "note",
        "conditions": [{"field": "date", "op": "isapprox", "value": "2024-06-10"}],
        "actions": [{"op": "set", "field": "status", "value": "launch"}]
    })));
    let set = RuleSet::load_with_config(&storage, &builtin_registry(), &config).unwrap();
    let diff = set.run("note", &record(json!({"date": "2024-06-14"})));
    assert_eq!(diff["status"], json!("launch"));
}

#[test]
fn missing_directories_are_errors() {
    let dir = TempDir::new().expect("create tempdir");
    let missing = dir.path().join("no-such-dir");

    let storage = DirRuleStorage::new(&missing);
    assert!(matches!(storage.scan(), Err(LoadError::Io(_))));
    assert!(matches!(storage.list(), Err(LoadError::Io(_))));

    let config = EngineConfig {
        schema_dir: Some(missing),
        ..EngineConfig::default()
    };
    assert!(matches!(registry_from_config(&config), Err(LoadError::Io(_))));

    let file = dir.path().join("types.yml");
    fs::write(&file, GADGET_YAML).unwrap();
    let mut registry = EntityTypeRegistry::new();
    assert!(matches!(registry.load_dir(&file), Err(LoadError::Io(_))));
}
