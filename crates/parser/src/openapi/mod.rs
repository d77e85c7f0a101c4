//! OpenAPI 3.0 document loading and AuthPolicy field extraction
//!
//! ## Sources
//! - Local file: `./petstore.yaml`
//! - Remote document: `https://example.com/openapi.json`
//! - Standard input: `-`
//!
//! ## Kuadrant extension
//!
//! ```yaml
//! info:
//!   x-kuadrant:
//!     route:
//!       name: petstore
//!       namespace: petstore
//! paths:
//!   /internal:
//!     x-kuadrant:
//!       disable: true
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! use kuadrantctl_parser::openapi::{route_selectors, OpenApiParser};
//!
//! let parser = OpenApiParser::from_source("petstore.yaml")?;
//! let selectors = route_selectors(parser.spec());
//! ```

mod converter;
mod parser;
mod types;
mod validate;

pub use converter::{
    auth_policy_object_meta, authentication_scheme, route_object_meta, route_selectors,
    to_resource_name,
};
pub use parser::OpenApiParser;
pub use types::*;
pub use validate::validate;
