//! Tests for schema documents.

use super::*;
use crate::rule::{ConditionsOp, Stage};
use rulebook_core::{FieldType, Operator};

const WIDGET_YAML: &str = r#"
apiVersion: v1
kind: EntityType
metadata:
  id: widget
  name: Widget
  tags: [inventory]
spec:
  defaultFields:
    amount: true
  fields:
    label:
      type: string
      required: true
      displayName: Label
    weight:
      type: number
    memo:
      type: string
      disallowedOps: [oneOf, notOneOf]
"#;

const RULE_YAML: &str = r#"
apiVersion: v1
kind: Rule
metadata:
  id: triage-high
  name: Triage high priority notes
spec:
  entityType: note
  stage: pre
  conditionsOp: or
  conditions:
    - field: priority
      op: is
      value: high
    - field: title
      op: contains
      value: urgent
  actions:
    - op: set
      field: status
      value: triaged
"#;

fn parse(yaml: &str) -> Document {
    let envelope: DocumentEnvelope = serde_yaml::from_str(yaml).unwrap();
    envelope.parse_full().unwrap()
}

#[test]
fn entity_type_document_parses() {
    let doc = parse(WIDGET_YAML);
    assert_eq!(doc.kind(), DocumentKind::EntityType);
    assert_eq!(doc.metadata().id, "widget");
    assert!(doc.metadata().enabled);
    assert!(doc.validate().is_ok());

    let Document::EntityType(doc) = doc else {
        panic!("expected an entity type document");
    };
    let def = doc.into_definition();
    assert_eq!(def.display_name, "Widget");
    let names: Vec<_> = def.fields.keys().cloned().collect();
    assert_eq!(names, vec!["label", "weight", "memo"]);
    assert!(def.fields["label"].required);
    assert!(def.fields["memo"].disallowed_ops.contains(&Operator::OneOf));

    let effective = def.effective_fields();
    assert_eq!(effective["amount"].field_type, FieldType::Number);
    assert!(!effective.contains_key("date"));
}

#[test]
fn rule_document_parses() {
    let doc = parse(RULE_YAML);
    assert_eq!(doc.kind(), DocumentKind::Rule);
    let Document::Rule(doc) = doc else {
        panic!("expected a rule document");
    };
    assert!(doc.validate().is_ok());

    let def = doc.to_definition();
    assert_eq!(def.id.as_deref(), Some("triage-high"));
    assert_eq!(def.entity_type, "note");
    assert_eq!(def.stage, Some(Stage::Pre));
    assert_eq!(def.conditions_op, ConditionsOp::Or);
    assert_eq!(def.conditions.len(), 2);
    assert_eq!(def.actions[0].field.as_deref(), Some("status"));
}

#[test]
fn unknown_kind_is_rejected() {
    let yaml = WIDGET_YAML.replace("kind: EntityType", "kind: Dashboard");
    let envelope: DocumentEnvelope = serde_yaml::from_str(&yaml).unwrap();
    let err = envelope.parse_full().unwrap_err();
    assert!(err.contains("unknown document kind"));
}

#[test]
fn unknown_field_keys_are_rejected() {
    let yaml = WIDGET_YAML.replace("displayName: Label", "label: Label");
    let envelope: DocumentEnvelope = serde_yaml::from_str(&yaml).unwrap();
    assert!(envelope.parse_full().is_err());
}

#[test]
fn unknown_field_type_is_rejected() {
    let yaml = WIDGET_YAML.replace("type: number", "type: decimal");
    let envelope: DocumentEnvelope = serde_yaml::from_str(&yaml).unwrap();
    assert!(envelope.parse_full().is_err());
}

#[test]
fn validation_checks_version_and_names() {
    let Document::EntityType(mut doc) = parse(WIDGET_YAML) else {
        panic!("expected an entity type document");
    };

    doc.api_version = "v2".into();
    assert!(doc.validate().unwrap_err().contains("apiVersion"));

    doc.api_version = API_VERSION.into();
    doc.metadata.id = "has space".into();
    assert!(doc.validate().unwrap_err().contains("metadata.id"));

    doc.metadata.id = "widget".into();
    doc.spec
        .fields
        .insert(String::new(), crate::registry::FieldDefinition::string());
    assert!(doc.validate().unwrap_err().contains("invalid field name"));
}

#[test]
fn rule_without_entity_type_fails_validation() {
    let Document::Rule(mut doc) = parse(RULE_YAML) else {
        panic!("expected a rule document");
    };
    doc.spec.entity_type.clear();
    assert!(doc.validate().is_err());
}

#[test]
fn definition_round_trips_through_yaml() {
    let registry = builtin_registry();
    let def = registry.get("product").unwrap().clone();
    let yaml = Document::EntityType(EntityTypeDocument::from_definition(&def))
        .to_yaml()
        .unwrap();
    let parsed = parse_entity_type(&yaml).unwrap().into_definition();
    assert_eq!(parsed, def);
}

#[test]
fn parse_entity_type_rejects_rules() {
    let err = parse_entity_type(RULE_YAML).unwrap_err();
    assert!(err.contains("expected an EntityType document"));
}

#[test]
fn builtin_types_are_registered() {
    let registry = builtin_registry();
    let ids: Vec<_> = registry.get_all().iter().map(|d| d.id.clone()).collect();
    assert_eq!(ids, vec!["note", "product"]);

    for (name, contents) in BUILTIN_DOCUMENTS {
        assert!(parse_entity_type(contents).is_ok(), "{name} should parse");
    }

    let note = registry.get_fields("note").unwrap();
    let names: Vec<_> = note.keys().cloned().collect();
    assert_eq!(names, vec!["title", "content", "priority", "status", "date", "notes"]);
    assert_eq!(registry.field_type("product", "price"), Some(FieldType::Number));
    assert!(registry.field("product", "amount").is_none());
}
