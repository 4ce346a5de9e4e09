//! Document envelope for lightweight first-pass deserialization.

use serde::{Deserialize, Serialize};

use super::{Document, DocumentKind, DocumentMetadata};

/// Reads only the header fields of a document.
///
/// Used during two-pass loading: first extract `kind` to pick the concrete
/// type, then deserialize the full document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentEnvelope {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: DocumentMetadata,
    /// Remaining fields captured as raw YAML for second-pass deserialization.
    #[serde(flatten)]
    pub rest: serde_yaml::Value,
}

impl DocumentEnvelope {
    pub fn document_kind(&self) -> std::result::Result<DocumentKind, String> {
        self.kind.parse()
    }

    /// Two-pass: reconstruct the full YAML and deserialize into the concrete type.
    pub fn parse_full(&self) -> std::result::Result<Document, String> {
        let kind = self.document_kind()?;
        let yaml = serde_yaml::to_string(self).map_err(|e| e.to_string())?;
        match kind {
            DocumentKind::EntityType => serde_yaml::from_str(&yaml)
                .map(Document::EntityType)
                .map_err(|e| e.to_string()),
            DocumentKind::Rule => serde_yaml::from_str(&yaml)
                .map(Document::Rule)
                .map_err(|e| e.to_string()),
        }
    }
}
