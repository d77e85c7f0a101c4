//! External resource acquisition
//!
//! An OpenAPI document can come from a local file, an `http(s)` URL or
//! standard input (`-`). Every failure, including an empty document, is a
//! [`GeneratorError::Resource`].

use kuadrantctl_common::{GeneratorError, Result};
use std::fmt;
use std::fs;
use std::io::Read;
use std::path::PathBuf;
use tracing::debug;

/// Location meaning "read from standard input"
pub const STDIN_SENTINEL: &str = "-";

/// Where the raw document bytes come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceSource {
    Stdin,
    Url(String),
    File(PathBuf),
}

impl ResourceSource {
    /// Classify a user-provided location
    pub fn parse(location: &str) -> Self {
        if location == STDIN_SENTINEL {
            ResourceSource::Stdin
        } else if is_remote(location) {
            ResourceSource::Url(location.to_string())
        } else {
            ResourceSource::File(PathBuf::from(location))
        }
    }
}

impl fmt::Display for ResourceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceSource::Stdin => f.write_str("<stdin>"),
            ResourceSource::Url(url) => f.write_str(url),
            ResourceSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

fn is_remote(location: &str) -> bool {
    let lower = location.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Reads the raw bytes of a resource
#[cfg_attr(test, mockall::automock)]
pub trait ResourceReader {
    fn read(&self, source: &ResourceSource) -> Result<Vec<u8>>;
}

/// Reads from the filesystem, over blocking HTTP, or from stdin
#[derive(Debug, Default, Clone, Copy)]
pub struct ExternalResourceReader;

impl ResourceReader for ExternalResourceReader {
    fn read(&self, source: &ResourceSource) -> Result<Vec<u8>> {
        let data = match source {
            ResourceSource::Stdin => {
                let mut data = Vec::new();
                std::io::stdin().lock().read_to_end(&mut data).map_err(|e| {
                    GeneratorError::Resource(format!("Failed to read standard input: {}", e))
                })?;
                data
            }
            ResourceSource::Url(url) => fetch(url)?,
            ResourceSource::File(path) => fs::read(path).map_err(|e| {
                GeneratorError::Resource(format!("Failed to read {}: {}", path.display(), e))
            })?,
        };

        if data.iter().all(u8::is_ascii_whitespace) {
            return Err(GeneratorError::Resource(format!("{} is empty", source)));
        }

        debug!(%source, bytes = data.len(), "read OpenAPI document");
        Ok(data)
    }
}

fn fetch(url: &str) -> Result<Vec<u8>> {
    let response = reqwest::blocking::get(url)
        .and_then(|response| response.error_for_status())
        .map_err(|e| GeneratorError::Resource(format!("Failed to fetch {}: {}", url, e)))?;

    let body = response
        .bytes()
        .map_err(|e| GeneratorError::Resource(format!("Failed to read body of {}: {}", url, e)))?;

    Ok(body.to_vec())
}

/// Read a resource from a user-provided location
pub fn read_external_resource(location: &str) -> Result<Vec<u8>> {
    ExternalResourceReader.read(&ResourceSource::parse(location))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_source() {
        assert_eq!(ResourceSource::parse("-"), ResourceSource::Stdin);
        assert_eq!(
            ResourceSource::parse("https://example.com/openapi.yaml"),
            ResourceSource::Url("https://example.com/openapi.yaml".to_string())
        );
        assert_eq!(
            ResourceSource::parse("HTTP://example.com/openapi.yaml"),
            ResourceSource::Url("HTTP://example.com/openapi.yaml".to_string())
        );
        assert_eq!(
            ResourceSource::parse("./petstore.yaml"),
            ResourceSource::File(PathBuf::from("./petstore.yaml"))
        );
        assert_eq!(
            ResourceSource::parse("--"),
            ResourceSource::File(PathBuf::from("--"))
        );
    }

    #[test]
    fn test_read_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "openapi: 3.0.3").unwrap();

        let data = read_external_resource(file.path().to_str().unwrap()).unwrap();
        assert_eq!(data, b"openapi: 3.0.3\n");
    }

    #[test]
    fn test_missing_file_is_resource_error() {
        let err = read_external_resource("/definitely/not/here/openapi.yaml").unwrap_err();
        assert!(matches!(err, GeneratorError::Resource(_)));
        assert!(err.to_string().starts_with("Resource error: Failed to read"));
    }

    #[test]
    fn test_empty_file_is_resource_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "   ").unwrap();

        let err = read_external_resource(file.path().to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("is empty"));
    }
}
