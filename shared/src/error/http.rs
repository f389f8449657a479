//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::ProductNotFound
            | Self::CategoryNotFound
            | Self::RiteNotFound
            | Self::ObedienceNotFound
            | Self::DegreeOrderNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::AlreadyExists
            | Self::ProductSlugExists
            | Self::CategorySlugExists
            | Self::TaxonomyCodeExists => StatusCode::CONFLICT,

            // 500 Internal Server Error
            Self::Unknown
            | Self::FacetComputationFailed
            | Self::InternalError
            | Self::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request (default for validation errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}
