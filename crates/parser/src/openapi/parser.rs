//! OpenAPI document loader

use super::types::OpenApiSpec;
use super::validate::validate;
use crate::resource::{ExternalResourceReader, ResourceReader, ResourceSource};
use kuadrantctl_common::{GeneratorError, Result};
use std::path::Path;
use tracing::debug;

/// OpenAPI specification parser
///
/// Reads, decodes and validates OpenAPI 3.0.x documents in JSON or YAML. A
/// parser only exists for a document that passed validation.
#[derive(Debug, Clone)]
pub struct OpenApiParser {
    /// Loaded OpenAPI spec
    spec: OpenApiSpec,
}

impl OpenApiParser {
    /// Load an OpenAPI spec from a path, an `http(s)` URL or `-` for stdin
    ///
    /// # Example
    /// ```rust,ignore
    /// let parser = OpenApiParser::from_source("https://example.com/petstore.yaml")?;
    /// ```
    pub fn from_source(location: &str) -> Result<Self> {
        Self::from_reader(&ExternalResourceReader, &ResourceSource::parse(location))
    }

    /// Load an OpenAPI spec through a custom resource reader
    pub fn from_reader(reader: &dyn ResourceReader, source: &ResourceSource) -> Result<Self> {
        let data = reader.read(source)?;
        debug!(%source, "loading OpenAPI document");
        Self::from_bytes(&data)
    }

    /// Load an OpenAPI spec from a file path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_reader(
            &ExternalResourceReader,
            &ResourceSource::File(path.as_ref().to_path_buf()),
        )
    }

    /// Decode and validate an OpenAPI document (JSON or YAML)
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let spec = decode(data)?;
        validate(&spec)?;

        debug!(
            title = %spec.info.title,
            paths = spec.paths.len(),
            "validated OpenAPI document"
        );

        Ok(Self { spec })
    }

    /// Get reference to the underlying OpenAPI spec
    pub fn spec(&self) -> &OpenApiSpec {
        &self.spec
    }
}

fn decode(data: &[u8]) -> Result<OpenApiSpec> {
    let is_json = data
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| *b == b'{');

    if is_json {
        serde_json::from_slice(data)
            .map_err(|e| GeneratorError::Validation(format!("failed to decode JSON: {}", e)))
    } else {
        serde_yaml::from_slice(data)
            .map_err(|e| GeneratorError::Validation(format!("failed to decode YAML: {}", e)))
    }
}
