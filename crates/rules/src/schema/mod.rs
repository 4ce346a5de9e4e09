//! YAML documents declaring entity types and rules.
//!
//! Every document carries the same header:
//! - `apiVersion`: currently `v1`
//! - `kind`: `EntityType` or `Rule`
//! - `metadata`: id, name, optional description/tags, `enabled`
//!
//! followed by a kind-specific `spec`. Loading is two-pass: the
//! [`DocumentEnvelope`] reads the header, then the full [`Document`] is
//! deserialized for the kind it names.

mod builtin;
mod document;
mod envelope;
mod kind;
mod metadata;

pub use builtin::*;
pub use document::*;
pub use envelope::*;
pub use kind::*;
pub use metadata::*;

#[cfg(test)]
mod tests;
