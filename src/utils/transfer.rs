//! Shared shapes for JSON/CSV import endpoints.

use serde::Serialize;
use utoipa::ToSchema;

/// A row the import rejected, with its 1-based position in the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RowError {
    pub row: usize,
    pub message: String,
}

impl RowError {
    pub fn new(row: usize, message: impl Into<String>) -> Self {
        Self {
            row,
            message: message.into(),
        }
    }
}

/// Import outcome. Valid rows land even when others fail; the caller sees
/// exactly which rows were rejected and why.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ImportReport {
    pub imported: usize,
    pub rejected: usize,
    pub errors: Vec<RowError>,
}

impl ImportReport {
    pub fn new(imported: usize, errors: Vec<RowError>) -> Self {
        Self {
            imported,
            rejected: errors.len(),
            errors,
        }
    }
}
