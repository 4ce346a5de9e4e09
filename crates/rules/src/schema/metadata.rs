//! Metadata shared by every document kind.

use serde::{Deserialize, Serialize};

/// Header metadata of a document.
///
/// For an entity type `id` is the type id rules refer to and `name` its
/// display name. For a rule `id` becomes the rule id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DocumentMetadata {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Disabled rules are treated as deleted by file-backed storage.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl DocumentMetadata {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            tags: None,
            enabled: true,
        }
    }
}

pub(crate) fn default_true() -> bool {
    true
}
