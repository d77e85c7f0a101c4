//! OpenAPI loading for kuadrantctl
//!
//! This crate is the front half of the pipeline: it acquires the raw
//! document, decodes and validates it, and extracts the fragments an
//! AuthPolicy is assembled from.
//!
//! ## Extraction
//!
//! - route identity: `info.x-kuadrant.route`, falling back to `info.title`
//! - authentication: one rule per `components.securitySchemes` entry
//! - route selectors: one per enabled (path, method) pair

pub mod openapi;
pub mod resource;

pub use openapi::OpenApiParser;
pub use resource::{
    read_external_resource, ExternalResourceReader, ResourceReader, ResourceSource,
};
