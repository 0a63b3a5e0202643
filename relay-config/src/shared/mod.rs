//! Shared configuration types for relay routing components.

mod admission;
mod cache;

pub use admission::AdmissionConfig;
pub use cache::CacheConfig;

use thiserror::Error;

/// Errors returned when validating configuration values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid value for `{field}`: {constraint}")]
    InvalidFieldValue { field: String, constraint: String },
}
