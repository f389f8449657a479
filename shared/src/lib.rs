//! Shared types for the regalia catalog
//!
//! Common types used by the server and its API consumers: error codes,
//! response structures, filter DTOs and time utilities.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};
