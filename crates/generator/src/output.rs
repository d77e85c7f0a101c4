//! Output rendering
//!
//! The policy is marshalled exactly once into a JSON value. Both output
//! formats are encodings of that value, so they always agree on which
//! optional fields are present.

use kuadrantctl_common::{AuthPolicy, GeneratorError, Result};
use serde_json::Value;

/// Output encoding of the generated policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Yaml => write!(f, "yaml"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Canonical structured form of a policy
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalDocument(Value);

impl CanonicalDocument {
    pub fn from_policy(policy: &AuthPolicy) -> Result<Self> {
        serde_json::to_value(policy)
            .map(Self)
            .map_err(|e| GeneratorError::Serialization(format!("failed to encode policy: {}", e)))
    }

    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => self.to_json(),
            OutputFormat::Yaml => self.to_yaml(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.0)
            .map_err(|e| GeneratorError::Serialization(format!("failed to render JSON: {}", e)))
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(&self.0)
            .map_err(|e| GeneratorError::Serialization(format!("failed to render YAML: {}", e)))
    }
}
