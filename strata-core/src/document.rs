/// Whole-document JSON export and import.
///
/// Export writes the current shape as pretty JSON. Import accepts any older
/// version, upgrades it, and rejects documents with malformed geometry or
/// duplicate ids.
use std::collections::HashSet;

use serde_json::Value;

use crate::migrate;
use crate::store::{validate_edge, validate_element, ValidationError};
use crate::types::CanvasDocument;

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("Invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Document root is not a JSON object")]
    NotAnObject,

    #[error("Invalid document version: {0}")]
    InvalidVersion(String),

    #[error("Unsupported document version {found} (newest supported is {supported})")]
    UnsupportedVersion { found: u64, supported: u32 },

    #[error("Invalid document: {0}")]
    Invalid(#[from] ValidationError),
}

pub fn export_json(document: &CanvasDocument) -> Result<String, DocumentError> {
    Ok(serde_json::to_string_pretty(document)?)
}

pub fn import_json(text: &str) -> Result<CanvasDocument, DocumentError> {
    let value: Value = serde_json::from_str(text)?;
    from_value(value)
}

/// Upgrade, deserialize and validate a raw document.
pub fn from_value(mut value: Value) -> Result<CanvasDocument, DocumentError> {
    migrate::upgrade(&mut value)?;
    let document: CanvasDocument = serde_json::from_value(value)?;
    validate_document(&document)?;
    Ok(document)
}

pub fn validate_document(document: &CanvasDocument) -> Result<(), ValidationError> {
    let mut seen: HashSet<&str> = HashSet::new();
    for element in &document.elements {
        validate_element(element)?;
        if !seen.insert(element.id.as_str()) {
            return Err(ValidationError::DuplicateId(element.id.clone()));
        }
    }
    let mut seen: HashSet<&str> = HashSet::new();
    for edge in &document.edges {
        validate_edge(edge)?;
        if !seen.insert(edge.id.as_str()) {
            return Err(ValidationError::DuplicateId(edge.id.clone()));
        }
    }
    Ok(())
}
