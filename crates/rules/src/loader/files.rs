//! Reading YAML documents from disk.

use std::fs;
use std::path::Path;

use rulebook_core::EngineConfig;
use tracing::{info, warn};

use super::error::{LoadError, LoadResult, LoadStatus, Result};
use crate::registry::EntityTypeRegistry;
use crate::schema::{builtin_registry, Document, DocumentEnvelope};

/// Parse YAML text into a validated [`Document`] via two-pass deserialization.
pub fn parse_document(contents: &str) -> Result<Document> {
    // First pass: extract envelope (kind + metadata).
    let envelope: DocumentEnvelope = serde_yaml::from_str(contents)?;

    if envelope.metadata.id.is_empty() {
        return Err(LoadError::Validation(
            "document metadata.id must not be empty".to_string(),
        ));
    }

    // Second pass: deserialize into the kind-specific type.
    let doc = envelope.parse_full().map_err(|e| {
        LoadError::Validation(format!(
            "failed to parse document '{}': {}",
            envelope.metadata.id, e
        ))
    })?;
    doc.validate().map_err(LoadError::Validation)?;
    Ok(doc)
}

/// Read and parse a single YAML document file.
pub fn load_document_file(path: &Path) -> Result<Document> {
    let contents = fs::read_to_string(path)?;
    parse_document(&contents)
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "yml" || e == "yaml")
        .unwrap_or(false)
}

/// Fail with [`LoadError::Io`] unless `dir` is an existing directory.
pub(crate) fn ensure_dir(dir: &Path) -> Result<()> {
    if fs::metadata(dir)?.is_dir() {
        Ok(())
    } else {
        Err(LoadError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} is not a directory", dir.display()),
        )))
    }
}

/// Recursively visit every YAML document under `dir`.
///
/// Dotfiles and dot-directories are skipped, as are non-YAML files. Parse
/// errors are reported per file and do not abort the scan. `visit` decides
/// the status of each parsed document.
pub(crate) fn scan_documents(
    dir: &Path,
    results: &mut Vec<LoadResult>,
    visit: &mut dyn FnMut(&Path, Document) -> LoadStatus,
) -> Result<()> {
    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            warn!(path = %dir.display(), error = %e, "failed to read directory");
            return Ok(());
        }
    };

    let mut paths = entries
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    // Deterministic order: later files override earlier ones on id clashes.
    paths.sort();

    for path in paths {
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.starts_with('.') {
                if path.is_file() {
                    results.push(LoadResult {
                        path,
                        status: LoadStatus::Skipped {
                            reason: "dotfile".to_string(),
                        },
                    });
                }
                continue;
            }
        }

        if path.is_dir() {
            scan_documents(&path, results, visit)?;
            continue;
        }

        if !is_yaml(&path) {
            results.push(LoadResult {
                path,
                status: LoadStatus::Skipped {
                    reason: "not a YAML file".to_string(),
                },
            });
            continue;
        }

        let status = match load_document_file(&path) {
            Ok(doc) => visit(&path, doc),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load document");
                LoadStatus::Failed {
                    error: e.to_string(),
                }
            }
        };
        results.push(LoadResult { path, status });
    }

    Ok(())
}

impl EntityTypeRegistry {
    /// Register the entity type declared in one YAML file and return its id.
    pub fn load_file(&mut self, path: &Path) -> Result<String> {
        match load_document_file(path)? {
            Document::EntityType(doc) => {
                let id = doc.metadata.id.clone();
                self.register(doc.into_definition());
                Ok(id)
            }
            other => Err(LoadError::Validation(format!(
                "{} is a {} document, expected EntityType",
                path.display(),
                other.kind()
            ))),
        }
    }

    /// Register every entity type document under `dir`. Documents of other
    /// kinds are skipped.
    pub fn load_dir(&mut self, dir: &Path) -> Result<Vec<LoadResult>> {
        ensure_dir(dir)?;
        let mut results = Vec::new();
        scan_documents(dir, &mut results, &mut |path, doc| match doc {
            Document::EntityType(doc) => {
                let id = doc.metadata.id.clone();
                info!(entity_type = %id, path = %path.display(), "loaded entity type document");
                self.register(doc.into_definition());
                LoadStatus::Loaded { id }
            }
            other => LoadStatus::Skipped {
                reason: format!("{} document", other.kind()),
            },
        })?;
        Ok(results)
    }
}

/// The built-in entity types plus any documents in the configured schema
/// directory. Directory documents replace built-ins with the same id.
pub fn registry_from_config(config: &EngineConfig) -> Result<EntityTypeRegistry> {
    let mut registry = builtin_registry();
    if let Some(dir) = &config.schema_dir {
        let results = registry.load_dir(dir)?;
        let failed = results.iter().filter(|r| r.status.is_failed()).count();
        info!(
            path = %dir.display(),
            files = results.len(),
            failed,
            entity_types = registry.len(),
            "loaded schema directory"
        );
    }
    Ok(registry)
}
