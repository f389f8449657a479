//! Input validation helpers
//!
//! Centralized text length constants and validation functions used by the
//! admin catalog handlers before anything reaches the repositories.

use surrealdb::RecordId;

use crate::utils::AppError;

// ── Text length limits ──────────────────────────────────────────────

/// Entity names: product, category, rite, obedience, degree
pub const MAX_NAME_LEN: usize = 200;

/// Product and category descriptions
pub const MAX_DESCRIPTION_LEN: usize = 5000;

/// Short identifiers: codes, abbreviations, slugs, lodge types, tags
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Upper bound on references per relation field
pub const MAX_RELATIONS: usize = 100;

/// Implemented by every create/update payload
pub trait Validate {
    fn validate(&self) -> Result<(), AppError>;
}

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")).with_detail("field", field));
    }
    if value.chars().count() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.chars().count()
        ))
        .with_detail("field", field));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    match value {
        Some(v) => validate_required_text(v, field, max_len),
        None => Ok(()),
    }
}

/// Validate every tag in a free-form tag list
pub fn validate_tags(values: &[String], field: &str) -> Result<(), AppError> {
    for v in values {
        validate_required_text(v, field, MAX_SHORT_TEXT_LEN)?;
    }
    Ok(())
}

/// Prices are integer cents and never negative
pub fn validate_price(value: i64, field: &str) -> Result<(), AppError> {
    if value < 0 {
        return Err(AppError::with_message(
            shared::error::ErrorCode::ProductInvalidPrice,
            format!("{field} must not be negative"),
        )
        .with_detail("field", field));
    }
    Ok(())
}

/// Every reference must point into `table`
pub fn validate_references(ids: &[RecordId], table: &str, field: &str) -> Result<(), AppError> {
    if ids.len() > MAX_RELATIONS {
        return Err(AppError::validation(format!(
            "{field} has too many references ({}, max {MAX_RELATIONS})",
            ids.len()
        )));
    }
    for id in ids {
        if id.table() != table {
            return Err(AppError::invalid_reference(id.to_string()).with_detail("field", field));
        }
    }
    Ok(())
}
