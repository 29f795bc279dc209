//! # Error Types
//!
//! Structured error types for forge_core. Each variant carries the SKU, row
//! or file involved so a caller can report the problem verbatim and the
//! person maintaining the BOM data knows exactly what to fix.
//!
//! ## Example
//!
//! ```rust
//! use forge_core::errors::{ForgeError, ForgeResult};
//!
//! fn validate_min_yield(min_yield: f64) -> ForgeResult<()> {
//!     if !(min_yield > 0.0 && min_yield <= 1.0) {
//!         return Err(ForgeError::invalid_input(
//!             "min_yield",
//!             min_yield.to_string(),
//!             "Yield floor must be in (0, 1]",
//!         ));
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::snapshot::Sku;

/// Result type alias for forge_core operations
pub type ForgeResult<T> = Result<T, ForgeError>;

/// Structured error type for explosion, loading and settings operations.
///
/// The buildability calculator never produces one of these; missing stock
/// degrades to zero availability instead.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum ForgeError {
    /// A SKU reappeared on its own traversal path
    #[error("Circular BOM: '{sku}' is its own ancestor (path: {})", .path.join(" -> "))]
    CircularBom { sku: Sku, path: Vec<Sku> },

    /// A BOM row has a quantity, scrap rate or yield that cannot be used
    #[error("Invalid BOM row {parent} -> {component}: {field} = {value} - {reason}")]
    InvalidBomRow {
        parent: Sku,
        component: Sku,
        field: String,
        value: String,
        reason: String,
    },

    /// Nesting went deeper than the configured bound
    #[error("BOM nesting exceeds {max_depth} levels at '{sku}'")]
    DepthExceeded { sku: Sku, max_depth: usize },

    /// SKU is neither a known assembly nor a known part
    #[error("Unknown SKU: '{sku}' is not in the assembly or part catalog")]
    UnknownSku { sku: Sku },

    /// An input value is invalid (out of range, wrong type, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// CSV or JSON parse error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },
}

impl ForgeError {
    /// Create a CircularBom error
    pub fn circular_bom(sku: impl Into<Sku>, path: Vec<Sku>) -> Self {
        ForgeError::CircularBom {
            sku: sku.into(),
            path,
        }
    }

    /// Create an InvalidBomRow error
    pub fn invalid_bom_row(
        parent: impl Into<Sku>,
        component: impl Into<Sku>,
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ForgeError::InvalidBomRow {
            parent: parent.into(),
            component: component.into(),
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an UnknownSku error
    pub fn unknown_sku(sku: impl Into<Sku>) -> Self {
        ForgeError::UnknownSku { sku: sku.into() }
    }

    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        ForgeError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        ForgeError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// True for errors caused by the BOM data itself (fix the data, don't retry)
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            ForgeError::CircularBom { .. }
                | ForgeError::InvalidBomRow { .. }
                | ForgeError::DepthExceeded { .. }
        )
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ForgeError::CircularBom { .. } => "CIRCULAR_BOM",
            ForgeError::InvalidBomRow { .. } => "INVALID_BOM_ROW",
            ForgeError::DepthExceeded { .. } => "DEPTH_EXCEEDED",
            ForgeError::UnknownSku { .. } => "UNKNOWN_SKU",
            ForgeError::InvalidInput { .. } => "INVALID_INPUT",
            ForgeError::FileError { .. } => "FILE_ERROR",
            ForgeError::SerializationError { .. } => "SERIALIZATION_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = ForgeError::circular_bom("A", vec!["A".to_string(), "B".to_string()]);
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"type\":\"CircularBom\""));
        let roundtrip: ForgeError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_circular_message_names_sku_and_path() {
        let error = ForgeError::circular_bom("A", vec!["A".to_string(), "B".to_string()]);
        assert_eq!(
            error.to_string(),
            "Circular BOM: 'A' is its own ancestor (path: A -> B)"
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(ForgeError::unknown_sku("X").error_code(), "UNKNOWN_SKU");
        assert_eq!(
            ForgeError::invalid_bom_row("P", "C", "qty_per", "0", "must be positive").error_code(),
            "INVALID_BOM_ROW"
        );
    }

    #[test]
    fn test_data_errors() {
        assert!(ForgeError::circular_bom("A", vec![]).is_data_error());
        assert!(!ForgeError::unknown_sku("A").is_data_error());
        assert!(!ForgeError::file_error("open", "x.csv", "missing").is_data_error());
    }
}
