//! Document kind enum for two-pass deserialization dispatch.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported document kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentKind {
    EntityType,
    Rule,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::EntityType => write!(f, "EntityType"),
            DocumentKind::Rule => write!(f, "Rule"),
        }
    }
}

impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "EntityType" => Ok(DocumentKind::EntityType),
            "Rule" => Ok(DocumentKind::Rule),
            other => Err(format!("unknown document kind: '{}'", other)),
        }
    }
}
