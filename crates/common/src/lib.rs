//! Common types and utilities for kuadrantctl
//!
//! This crate contains the error taxonomy shared by every stage of the
//! pipeline and the AuthPolicy output model produced by the generator.

pub mod authpolicy;

pub use authpolicy::*;

use thiserror::Error;

/// Errors that can occur while generating an AuthPolicy
#[derive(Error, Debug)]
pub enum GeneratorError {
    /// The OpenAPI source could not be read
    #[error("Resource error: {0}")]
    Resource(String),

    /// The document is not a valid OpenAPI 3.0.x document
    #[error("OpenAPI validation error: {0}")]
    Validation(String),

    /// A required piece of the policy could not be derived from the document
    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Extraction error: unsupported security scheme type '{scheme_type}' for scheme '{name}'")]
    UnsupportedSecurityScheme { name: String, scheme_type: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for generator operations
pub type Result<T> = std::result::Result<T, GeneratorError>;

/// Route identity derived from the OpenAPI document
///
/// Used both as the name of the generated HTTPRoute and as the target of the
/// AuthPolicy. An absent namespace means "inherit", never the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteMeta {
    pub name: String,
    pub namespace: Option<String>,
}
