//! Extracts AuthPolicy fragments from a validated OpenAPI spec
//!
//! Every function here is independent and side-effect free: it reads the
//! document and returns one piece of the policy, so each piece can be tested
//! without assembling a whole AuthPolicy.

use super::types::{Method, OAuthFlows, OpenApiSpec, SecurityScheme};
use super::validate::path_template_params;
use indexmap::{IndexMap, IndexSet};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kuadrantctl_common::{
    ApiKeyAuthenticationSpec, AuthenticationMethod, AuthenticationSpec, Credentials,
    GeneratorError, HttpMethod, HttpPathMatch, HttpRouteMatch, JwtAuthenticationSpec,
    OAuth2IntrospectionSpec, PathMatchType, Result, RouteMeta, RouteSelector, SecretReference,
};
use tracing::{debug, warn};

/// Maximum length of a Kubernetes resource name (DNS subdomain)
const MAX_NAME_LENGTH: usize = 253;

const OIDC_DISCOVERY_SUFFIX: &str = "/.well-known/openid-configuration";

/// Route name and namespace
///
/// `info.x-kuadrant.route` wins when it carries a name; otherwise the title is
/// normalized into a resource name. The name may be empty when the title has
/// no usable characters; callers decide whether that is fatal.
pub fn route_object_meta(spec: &OpenApiSpec) -> RouteMeta {
    let route_ext = spec
        .info
        .kuadrant
        .as_ref()
        .and_then(|ext| ext.route.as_ref());

    let name = route_ext
        .and_then(|route| route.name.as_deref())
        .filter(|name| !name.is_empty())
        .map(String::from)
        .unwrap_or_else(|| to_resource_name(&spec.info.title));

    let namespace = route_ext
        .and_then(|route| route.namespace.as_deref())
        .filter(|ns| !ns.is_empty())
        .map(String::from);

    RouteMeta { name, namespace }
}

/// AuthPolicy object metadata
///
/// The policy reuses the route's name and namespace. Policy and route are
/// different kinds, so the shared name never collides.
pub fn auth_policy_object_meta(spec: &OpenApiSpec) -> ObjectMeta {
    let route = route_object_meta(spec);
    ObjectMeta {
        name: Some(route.name),
        namespace: route.namespace,
        ..Default::default()
    }
}

/// One authentication rule per security scheme that an enabled operation requires
///
/// Every declared scheme is classified, so an unsupported type fails even when
/// nothing requires it. Schemes no enabled operation requires are left out: a
/// rule without route selectors would apply to the whole route, public
/// operations included.
pub fn authentication_scheme(spec: &OpenApiSpec) -> Result<IndexMap<String, AuthenticationSpec>> {
    let all_selectors = route_selectors(spec);
    let scheme_selectors = selectors_by_scheme(spec)?;

    let mut authentication = IndexMap::new();
    for name in spec.security_scheme_names() {
        let scheme = spec.security_scheme(name).ok_or_else(|| {
            GeneratorError::Extraction(format!("security scheme '{}' cannot be resolved", name))
        })?;

        let (method, credentials) = authentication_method(name, scheme)?;

        let Some(selectors) = scheme_selectors.get(name) else {
            warn!(scheme = name, "security scheme is not required by any operation, skipping");
            continue;
        };

        // Required by every enabled operation: the rule covers the whole route
        let route_selectors = if selectors.len() < all_selectors.len() {
            selectors.iter().cloned().collect()
        } else {
            Vec::new()
        };

        debug!(
            scheme = name,
            scheme_type = %scheme.scheme_type,
            selectors = route_selectors.len(),
            "extracted authentication rule"
        );

        authentication.insert(
            name.to_string(),
            AuthenticationSpec {
                method,
                credentials,
                route_selectors,
            },
        );
    }

    Ok(authentication)
}

/// One selector per enabled (path, method) pair, in document order
pub fn route_selectors(spec: &OpenApiSpec) -> Vec<RouteSelector> {
    let base_path = spec.base_path();
    let selectors: IndexSet<RouteSelector> = spec
        .enabled_operations()
        .map(|(path, method, _)| operation_selector(&base_path, path, method))
        .collect();

    selectors.into_iter().collect()
}

/// Selectors of the operations whose effective requirements name each scheme
///
/// Requirement objects are alternatives and each maps onto one rule. An object
/// naming several schemes demands all of them at once, which alternative
/// rules cannot express, so it is rejected.
fn selectors_by_scheme(spec: &OpenApiSpec) -> Result<IndexMap<&str, IndexSet<RouteSelector>>> {
    let base_path = spec.base_path();
    let mut by_scheme: IndexMap<&str, IndexSet<RouteSelector>> = IndexMap::new();

    for (path, method, operation) in spec.enabled_operations() {
        let requirements = spec.effective_security(operation);
        if requirements.is_empty() {
            continue;
        }

        if let Some(combined) = requirements.iter().find(|req| req.len() > 1) {
            let names: Vec<&str> = combined.keys().map(String::as_str).collect();
            return Err(GeneratorError::Extraction(format!(
                "operation {} {} requires security schemes {} together, which cannot be expressed as alternative authentication rules",
                method,
                path,
                names.join(" + ")
            )));
        }

        let selector = operation_selector(&base_path, path, method);
        for scheme_name in requirements.iter().flat_map(|req| req.keys()) {
            by_scheme
                .entry(scheme_name.as_str())
                .or_default()
                .insert(selector.clone());
        }
    }

    Ok(by_scheme)
}

fn operation_selector(base_path: &str, path: &str, method: Method) -> RouteSelector {
    RouteSelector::single(HttpRouteMatch {
        path: path_match(&format!("{}{}", base_path, path)),
        method: http_method(method),
    })
}

/// Translate an OpenAPI path template into a Gateway API path match
///
/// e.g., "/pets/{petId}" -> RegularExpression "^/pets/[^/]+$"
fn path_match(path: &str) -> HttpPathMatch {
    if path_template_params(path).next().is_none() {
        return HttpPathMatch {
            match_type: PathMatchType::Exact,
            value: path.to_string(),
        };
    }

    let mut pattern = String::from("^");
    let mut rest = path;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        pattern.push_str(&regex::escape(&rest[..start]));
        pattern.push_str("[^/]+");
        rest = &rest[start + len + 1..];
    }
    pattern.push_str(&regex::escape(rest));
    pattern.push('$');

    HttpPathMatch {
        match_type: PathMatchType::RegularExpression,
        value: pattern,
    }
}

fn http_method(method: Method) -> HttpMethod {
    match method {
        Method::Get => HttpMethod::Get,
        Method::Put => HttpMethod::Put,
        Method::Post => HttpMethod::Post,
        Method::Delete => HttpMethod::Delete,
        Method::Options => HttpMethod::Options,
        Method::Head => HttpMethod::Head,
        Method::Patch => HttpMethod::Patch,
        Method::Trace => HttpMethod::Trace,
    }
}

/// Classify a security scheme into an authentication method
fn authentication_method(
    name: &str,
    scheme: &SecurityScheme,
) -> Result<(AuthenticationMethod, Option<Credentials>)> {
    let unsupported = || GeneratorError::UnsupportedSecurityScheme {
        name: name.to_string(),
        scheme_type: scheme.scheme_type.clone(),
    };

    match scheme.scheme_type.as_str() {
        "apiKey" => {
            let key = scheme.name.clone().unwrap_or_default();
            let credentials = match scheme.location.as_deref() {
                Some("header") => Credentials::custom_header(key),
                Some("query") => Credentials::query_string(key),
                Some("cookie") => Credentials::cookie(key),
                _ => return Err(unsupported()),
            };
            Ok((
                AuthenticationMethod::ApiKey(ApiKeyAuthenticationSpec::for_scheme(name)),
                Some(credentials),
            ))
        }
        "http" => {
            let prefix = match scheme.scheme.as_deref().map(str::to_ascii_lowercase).as_deref() {
                Some("bearer") => "Bearer",
                Some("basic") => "Basic",
                other => {
                    return Err(GeneratorError::UnsupportedSecurityScheme {
                        name: name.to_string(),
                        scheme_type: format!("http/{}", other.unwrap_or_default()),
                    })
                }
            };
            Ok((
                AuthenticationMethod::ApiKey(ApiKeyAuthenticationSpec::for_scheme(name)),
                Some(Credentials::authorization_header(prefix)),
            ))
        }
        "openIdConnect" => {
            let url = scheme.open_id_connect_url.as_deref().unwrap_or_default();
            let url = url.trim_end_matches('/');
            let issuer_url = url.strip_suffix(OIDC_DISCOVERY_SUFFIX).unwrap_or(url);
            Ok((
                AuthenticationMethod::Jwt(JwtAuthenticationSpec {
                    issuer_url: issuer_url.to_string(),
                }),
                None,
            ))
        }
        "oauth2" => {
            let token_url = scheme
                .flows
                .as_ref()
                .and_then(token_url)
                .ok_or_else(|| {
                    GeneratorError::Extraction(format!(
                        "oauth2 security scheme '{}' declares no flow with a tokenUrl",
                        name
                    ))
                })?;
            let secret_prefix = to_resource_name(name);
            if secret_prefix.is_empty() {
                return Err(GeneratorError::Extraction(format!(
                    "oauth2 security scheme '{}' has no characters usable in a Secret name",
                    name
                )));
            }
            Ok((
                AuthenticationMethod::OAuth2Introspection(OAuth2IntrospectionSpec {
                    endpoint: format!("{}/introspect", token_url.trim_end_matches('/')),
                    credentials_ref: SecretReference {
                        name: format!("{}-introspection", secret_prefix),
                    },
                }),
                Some(Credentials::authorization_header("Bearer")),
            ))
        }
        _ => Err(unsupported()),
    }
}

/// Token endpoint of the first flow that has one
fn token_url(flows: &OAuthFlows) -> Option<&str> {
    [
        flows.client_credentials.as_ref(),
        flows.password.as_ref(),
        flows.authorization_code.as_ref(),
    ]
    .into_iter()
    .flatten()
    .filter_map(|flow| flow.token_url.as_deref())
    .find(|url| !url.is_empty())
}

/// Normalize free text into a Kubernetes resource name
///
/// Lowercase alphanumerics are kept; every other run of characters becomes a
/// single hyphen. Leading and trailing hyphens are stripped.
pub fn to_resource_name(s: &str) -> String {
    let mut result = String::with_capacity(s.len());

    for ch in s.chars() {
        if ch.is_ascii_alphanumeric() {
            result.push(ch.to_ascii_lowercase());
        } else if !result.is_empty() && !result.ends_with('-') {
            result.push('-');
        }
    }

    result.truncate(MAX_NAME_LENGTH);
    result.trim_matches('-').to_string()
}
