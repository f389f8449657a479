//! Unified error system for the regalia catalog
//!
//! This module provides:
//! - [`ErrorCode`]: Standardized error codes for all error types
//! - [`ErrorCategory`]: Classification of errors by domain
//! - [`AppError`]: Rich error type with codes, messages, and details
//! - [`ApiResponse`]: Unified API response format
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 6xxx: Catalog errors (products, rites, obediences, degrees, categories)
//! - 7xxx: Facet aggregation and denormalization errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode, ApiResponse};
//!
//! let err = AppError::new(ErrorCode::RiteNotFound);
//!
//! let err = AppError::validation("Name is required")
//!     .with_detail("field", "name");
//!
//! let response = ApiResponse::<()>::error(&err);
//! assert_eq!(response.code, Some(2));
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError, AppResult};
