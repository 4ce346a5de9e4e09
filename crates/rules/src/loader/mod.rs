//! Loading entity types and rule sets.
//!
//! Entity types come from YAML documents (see [`crate::schema`]). Rules come
//! from a [`RuleStorage`] provider: in memory, a directory of `kind: Rule`
//! documents, or any host-side adapter producing [`RuleRecord`]s. Invalid
//! rules are reported per record rather than failing the whole set.

mod core;
mod error;
mod files;
mod storage;

#[cfg(test)]
mod tests;

pub use self::core::{LoadOptions, RuleSet};
pub use self::error::{LoadError, LoadResult, LoadStatus, Result, RuleLoadReport};
pub use self::files::{load_document_file, parse_document, registry_from_config};
pub use self::storage::{DirRuleStorage, MemoryRuleStorage, RuleRecord, RuleStorage};
