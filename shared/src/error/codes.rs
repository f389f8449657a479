//! Unified error codes for the regalia catalog
//!
//! This module defines all error codes used across regalia-server and the storefront.
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 6xxx: Catalog errors (products, taxonomy)
//! - 7xxx: Aggregation and synchronization errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 6xxx: Catalog ====================
    /// Product not found
    ProductNotFound = 6001,
    /// Product has invalid price
    ProductInvalidPrice = 6002,
    /// Product slug already exists
    ProductSlugExists = 6003,
    /// Category not found
    CategoryNotFound = 6101,
    /// Category slug already exists
    CategorySlugExists = 6102,
    /// Category cannot be its own ancestor
    CategoryParentInvalid = 6103,
    /// Rite not found
    RiteNotFound = 6201,
    /// Obedience not found
    ObedienceNotFound = 6301,
    /// Degree order not found
    DegreeOrderNotFound = 6401,
    /// Taxonomy code already exists
    TaxonomyCodeExists = 6501,
    /// Reference points to the wrong table or is malformed
    InvalidReference = 6502,

    // ==================== 7xxx: Aggregation / Sync ====================
    /// Facet aggregation failed
    FacetComputationFailed = 7001,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Catalog
            ErrorCode::ProductNotFound => "Product not found",
            ErrorCode::ProductInvalidPrice => "Product has invalid price",
            ErrorCode::ProductSlugExists => "Product slug already exists",
            ErrorCode::CategoryNotFound => "Category not found",
            ErrorCode::CategorySlugExists => "Category slug already exists",
            ErrorCode::CategoryParentInvalid => "Category parent is invalid",
            ErrorCode::RiteNotFound => "Rite not found",
            ErrorCode::ObedienceNotFound => "Obedience not found",
            ErrorCode::DegreeOrderNotFound => "Degree order not found",
            ErrorCode::TaxonomyCodeExists => "Taxonomy code already exists",
            ErrorCode::InvalidReference => "Invalid reference",

            // Aggregation / Sync
            ErrorCode::FacetComputationFailed => "Failed to compute catalog filters",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Catalog
            6001 => Ok(ErrorCode::ProductNotFound),
            6002 => Ok(ErrorCode::ProductInvalidPrice),
            6003 => Ok(ErrorCode::ProductSlugExists),
            6101 => Ok(ErrorCode::CategoryNotFound),
            6102 => Ok(ErrorCode::CategorySlugExists),
            6103 => Ok(ErrorCode::CategoryParentInvalid),
            6201 => Ok(ErrorCode::RiteNotFound),
            6301 => Ok(ErrorCode::ObedienceNotFound),
            6401 => Ok(ErrorCode::DegreeOrderNotFound),
            6501 => Ok(ErrorCode::TaxonomyCodeExists),
            6502 => Ok(ErrorCode::InvalidReference),

            // Aggregation / Sync
            7001 => Ok(ErrorCode::FacetComputationFailed),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::NotFound.code(), 3);

        assert_eq!(ErrorCode::ProductNotFound.code(), 6001);
        assert_eq!(ErrorCode::CategoryNotFound.code(), 6101);
        assert_eq!(ErrorCode::RiteNotFound.code(), 6201);
        assert_eq!(ErrorCode::InvalidReference.code(), 6502);

        assert_eq!(ErrorCode::FacetComputationFailed.code(), 7001);

        assert_eq!(ErrorCode::InternalError.code(), 9001);
        assert_eq!(ErrorCode::DatabaseError.code(), 9002);
    }

    #[test]
    fn test_try_from_round_trips_every_variant() {
        let all = [
            ErrorCode::Success,
            ErrorCode::Unknown,
            ErrorCode::ValidationFailed,
            ErrorCode::NotFound,
            ErrorCode::AlreadyExists,
            ErrorCode::InvalidRequest,
            ErrorCode::InvalidFormat,
            ErrorCode::RequiredField,
            ErrorCode::ValueOutOfRange,
            ErrorCode::ProductNotFound,
            ErrorCode::ProductInvalidPrice,
            ErrorCode::ProductSlugExists,
            ErrorCode::CategoryNotFound,
            ErrorCode::CategorySlugExists,
            ErrorCode::CategoryParentInvalid,
            ErrorCode::RiteNotFound,
            ErrorCode::ObedienceNotFound,
            ErrorCode::DegreeOrderNotFound,
            ErrorCode::TaxonomyCodeExists,
            ErrorCode::InvalidReference,
            ErrorCode::FacetComputationFailed,
            ErrorCode::InternalError,
            ErrorCode::DatabaseError,
        ];
        for code in all {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
    }

    #[test]
    fn test_invalid_code() {
        assert_eq!(ErrorCode::try_from(4242), Err(InvalidErrorCode(4242)));
    }

    #[test]
    fn test_serde_as_number() {
        let json = serde_json::to_string(&ErrorCode::RiteNotFound).unwrap();
        assert_eq!(json, "6201");
        let code: ErrorCode = serde_json::from_str("7001").unwrap();
        assert_eq!(code, ErrorCode::FacetComputationFailed);
        assert!(serde_json::from_str::<ErrorCode>("12345").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(ErrorCode::DatabaseError.to_string(), "9002");
    }
}
