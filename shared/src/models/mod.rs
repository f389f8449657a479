//! Data models
//!
//! Shared between regalia-server and the storefront (via API).

pub mod filters;

// Re-exports
pub use filters::*;
