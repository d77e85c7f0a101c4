//! Semantic validation of a decoded OpenAPI document
//!
//! Decoding only guarantees the document has the right shape. These checks
//! reject documents the extractor cannot trust: wrong version, dangling
//! references, undeclared path parameters or security schemes.

use super::types::{
    OpenApiSpec, Operation, ParameterOrRef, PathItem, ReferenceOr, SecurityRequirement,
};
use kuadrantctl_common::{GeneratorError, Result};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static PATH_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}/]+)\}").expect("path parameter pattern is valid"));

/// Names of the `{param}` placeholders in a path template
pub(crate) fn path_template_params(path: &str) -> impl Iterator<Item = &str> {
    PATH_PARAM
        .captures_iter(path)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
}

/// Validate an OpenAPI 3.0.x document
pub fn validate(spec: &OpenApiSpec) -> Result<()> {
    validate_version(&spec.openapi)?;

    if spec.info.title.trim().is_empty() {
        return Err(invalid("value of info.title must be a non-empty string"));
    }
    if spec.info.version.trim().is_empty() {
        return Err(invalid("value of info.version must be a non-empty string"));
    }

    validate_components(spec)?;

    if let Some(ref requirements) = spec.security {
        validate_security_requirements(spec, requirements, "security")?;
    }

    for (path, item) in &spec.paths {
        validate_path(spec, path, item)?;
    }

    Ok(())
}

fn invalid(message: impl Into<String>) -> GeneratorError {
    GeneratorError::Validation(message.into())
}

fn validate_version(version: &str) -> Result<()> {
    let mut parts = version.split('.');
    let supported = parts.next() == Some("3")
        && parts.next() == Some("0")
        && parts
            .next()
            .is_some_and(|patch| !patch.is_empty() && patch.chars().all(|c| c.is_ascii_digit()))
        && parts.next().is_none();

    if supported {
        Ok(())
    } else {
        Err(invalid(format!(
            "unsupported OpenAPI version '{}', expected 3.0.x",
            version
        )))
    }
}

fn validate_components(spec: &OpenApiSpec) -> Result<()> {
    let Some(ref components) = spec.components else {
        return Ok(());
    };

    for (name, param) in &components.parameters {
        if let ReferenceOr::Reference { ref_path } = param {
            if spec.resolve_parameter_ref(ref_path).is_none() {
                return Err(invalid(format!(
                    "components.parameters.{}: unresolved reference '{}'",
                    name, ref_path
                )));
            }
        }
    }

    for (name, scheme) in &components.security_schemes {
        let scheme = match scheme {
            ReferenceOr::Item(scheme) => scheme,
            ReferenceOr::Reference { ref_path } => {
                match spec.resolve_security_scheme_ref(ref_path) {
                    Some(scheme) => scheme,
                    None => {
                        return Err(invalid(format!(
                            "components.securitySchemes.{}: unresolved reference '{}'",
                            name, ref_path
                        )))
                    }
                }
            }
        };

        let missing = |field: &str| {
            invalid(format!(
                "security scheme '{}' of type '{}' requires '{}'",
                name, scheme.scheme_type, field
            ))
        };

        // Unknown types are rejected during extraction
        match scheme.scheme_type.as_str() {
            "apiKey" => {
                if scheme.name.as_deref().unwrap_or("").is_empty() {
                    return Err(missing("name"));
                }
                match scheme.location.as_deref() {
                    Some("header" | "query" | "cookie") => {}
                    Some(other) => {
                        return Err(invalid(format!(
                            "security scheme '{}': 'in' must be one of header, query or cookie, got '{}'",
                            name, other
                        )))
                    }
                    None => return Err(missing("in")),
                }
            }
            "http" => {
                if scheme.scheme.as_deref().unwrap_or("").is_empty() {
                    return Err(missing("scheme"));
                }
            }
            "oauth2" => {
                if scheme.flows.is_none() {
                    return Err(missing("flows"));
                }
            }
            "openIdConnect" => {
                if scheme.open_id_connect_url.as_deref().unwrap_or("").is_empty() {
                    return Err(missing("openIdConnectUrl"));
                }
            }
            _ => {}
        }
    }

    Ok(())
}

fn validate_security_requirements(
    spec: &OpenApiSpec,
    requirements: &[SecurityRequirement],
    location: &str,
) -> Result<()> {
    for requirement in requirements {
        for scheme_name in requirement.keys() {
            if spec.security_scheme(scheme_name).is_none() {
                return Err(invalid(format!(
                    "{}: security requirement references undeclared security scheme '{}'",
                    location, scheme_name
                )));
            }
        }
    }
    Ok(())
}

fn validate_path(spec: &OpenApiSpec, path: &str, item: &PathItem) -> Result<()> {
    if !path.starts_with('/') {
        return Err(invalid(format!("path '{}' must begin with '/'", path)));
    }

    let shared = declared_path_params(spec, path, &item.parameters)?;

    for (method, operation) in item.operations() {
        let location = format!("paths.{}.{}", path, method);
        let own = declared_path_params(spec, &location, &operation.parameters)?;

        for param in path_template_params(path) {
            if !shared.contains(param) && !own.contains(param) {
                return Err(invalid(format!(
                    "{}: path parameter '{}' is not declared",
                    location, param
                )));
            }
        }

        validate_operation(spec, &location, operation)?;
    }

    Ok(())
}

fn validate_operation(spec: &OpenApiSpec, location: &str, operation: &Operation) -> Result<()> {
    match operation.security {
        Some(ref requirements) => validate_security_requirements(spec, requirements, location),
        None => Ok(()),
    }
}

fn declared_path_params<'a>(
    spec: &'a OpenApiSpec,
    location: &str,
    params: &'a [ParameterOrRef],
) -> Result<HashSet<&'a str>> {
    let mut names = HashSet::new();
    for param in params {
        let resolved = spec.parameter(param).ok_or_else(|| {
            let ref_path = match param {
                ReferenceOr::Reference { ref_path } => ref_path.as_str(),
                ReferenceOr::Item(_) => "",
            };
            invalid(format!("{}: unresolved reference '{}'", location, ref_path))
        })?;
        if resolved.location == "path" {
            names.insert(resolved.name.as_str());
        }
    }
    Ok(names)
}
