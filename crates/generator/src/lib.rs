//! AuthPolicy assembly and rendering
//!
//! This crate combines the fragments extracted from an OpenAPI document into
//! a Kuadrant AuthPolicy and renders it as JSON or YAML.

mod output;

pub use output::{CanonicalDocument, OutputFormat};

use indexmap::IndexMap;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kuadrantctl_common::{
    AuthPolicy, AuthPolicySpec, AuthSchemeSpec, AuthenticationSpec, GeneratorError,
    PolicyTargetReference, Result, RouteMeta, RouteSelector, AUTH_POLICY_API_VERSION,
    AUTH_POLICY_KIND, GATEWAY_API_GROUP, HTTP_ROUTE_KIND,
};
use kuadrantctl_parser::openapi::{
    auth_policy_object_meta, authentication_scheme, route_object_meta, route_selectors,
    OpenApiSpec, KUADRANT_EXTENSION,
};
use tracing::debug;

/// AuthPolicy generator
///
/// Holds a fully assembled policy; construction fails instead of producing a
/// partially populated one.
#[derive(Debug, Clone)]
pub struct AuthPolicyGenerator {
    policy: AuthPolicy,
}

impl AuthPolicyGenerator {
    /// Create a generator from a validated OpenAPI spec
    pub fn new(spec: &OpenApiSpec) -> Result<Self> {
        let policy = build_auth_policy(spec)?;
        Ok(Self { policy })
    }

    pub fn policy(&self) -> &AuthPolicy {
        &self.policy
    }

    /// Render the policy in the requested format
    pub fn render(&self, format: OutputFormat) -> Result<String> {
        CanonicalDocument::from_policy(&self.policy)?.render(format)
    }
}

/// Extract every fragment from the OpenAPI document and assemble the AuthPolicy
pub fn build_auth_policy(spec: &OpenApiSpec) -> Result<AuthPolicy> {
    let route_meta = route_object_meta(spec);
    if route_meta.name.is_empty() {
        return Err(GeneratorError::Extraction(format!(
            "cannot derive a route name from title '{}'; set info.{}.route.name",
            spec.info.title, KUADRANT_EXTENSION
        )));
    }

    let policy_meta = auth_policy_object_meta(spec);
    let authentication = authentication_scheme(spec)?;
    let selectors = route_selectors(spec);

    debug!(
        route = %route_meta.name,
        rules = authentication.len(),
        selectors = selectors.len(),
        "assembling AuthPolicy"
    );

    Ok(assemble(route_meta, policy_meta, authentication, selectors))
}

/// Combine extracted fragments into an AuthPolicy
///
/// The target namespace is only set when the route has one, so consumers see
/// "unspecified" rather than an empty namespace.
pub fn assemble(
    route_meta: RouteMeta,
    policy_meta: ObjectMeta,
    authentication: IndexMap<String, AuthenticationSpec>,
    selectors: Vec<RouteSelector>,
) -> AuthPolicy {
    AuthPolicy {
        api_version: AUTH_POLICY_API_VERSION.to_string(),
        kind: AUTH_POLICY_KIND.to_string(),
        metadata: policy_meta,
        spec: AuthPolicySpec {
            target_ref: PolicyTargetReference {
                group: GATEWAY_API_GROUP.to_string(),
                kind: HTTP_ROUTE_KIND.to_string(),
                name: route_meta.name,
                namespace: route_meta.namespace.filter(|ns| !ns.is_empty()),
            },
            route_selectors: selectors,
            auth_scheme: AuthSchemeSpec { authentication },
        },
    }
}
