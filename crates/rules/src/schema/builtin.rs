//! Entity types shipped with the crate.

use super::{Document, DocumentEnvelope, EntityTypeDocument};
use crate::registry::EntityTypeRegistry;

/// `(file name, contents)` of every built-in entity type document.
pub const BUILTIN_DOCUMENTS: &[(&str, &str)] = &[
    (
        "note.yml",
        include_str!("../../../../data/entity-types/note.yml"),
    ),
    (
        "product.yml",
        include_str!("../../../../data/entity-types/product.yml"),
    ),
];

/// Parse and validate an entity type document from YAML text.
pub fn parse_entity_type(contents: &str) -> std::result::Result<EntityTypeDocument, String> {
    let envelope: DocumentEnvelope = serde_yaml::from_str(contents).map_err(|e| e.to_string())?;
    match envelope.parse_full()? {
        Document::EntityType(doc) => {
            doc.validate()?;
            Ok(doc)
        }
        other => Err(format!(
            "expected an EntityType document, found {}",
            other.kind()
        )),
    }
}

/// A registry holding the built-in `note` and `product` types.
pub fn builtin_registry() -> EntityTypeRegistry {
    let mut registry = EntityTypeRegistry::new();
    for (name, contents) in BUILTIN_DOCUMENTS {
        match parse_entity_type(contents) {
            Ok(doc) => registry.register(doc.into_definition()),
            Err(e) => tracing::error!(file = %name, error = %e, "invalid built-in entity type"),
        }
    }
    registry
}
