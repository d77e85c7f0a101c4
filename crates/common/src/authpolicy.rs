//! Kuadrant AuthPolicy (`kuadrant.io/v1beta2`) output model
//!
//! Only the subset of the AuthPolicy API that is derived from OpenAPI is
//! modelled: the target reference, route selectors and authentication rules.
//! Optional fields are `Option`/empty collections skipped at serialization so
//! that absent data never shows up as `null` or `""`.

use indexmap::IndexMap;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use serde::{Deserialize, Serialize};

pub const AUTH_POLICY_API_VERSION: &str = "kuadrant.io/v1beta2";
pub const AUTH_POLICY_KIND: &str = "AuthPolicy";

pub const GATEWAY_API_GROUP: &str = "gateway.networking.k8s.io";
pub const HTTP_ROUTE_KIND: &str = "HTTPRoute";

/// Label selecting the Secrets that hold API keys for a security scheme
pub const API_KEY_SELECTOR_LABEL: &str = "kuadrant.io/apikeys-by";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPolicy {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: AuthPolicySpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPolicySpec {
    pub target_ref: PolicyTargetReference,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub route_selectors: Vec<RouteSelector>,

    /// Currently only authentication rules are generated
    #[serde(rename = "rules", default)]
    pub auth_scheme: AuthSchemeSpec,
}

/// Gateway API policy target reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyTargetReference {
    pub group: String,
    pub kind: String,
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthSchemeSpec {
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub authentication: IndexMap<String, AuthenticationSpec>,
}

/// A single authentication rule, keyed by the OpenAPI security scheme id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationSpec {
    #[serde(flatten)]
    pub method: AuthenticationMethod,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,

    /// Narrows the rule to the operations that require the scheme
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub route_selectors: Vec<RouteSelector>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AuthenticationMethod {
    #[serde(rename = "apiKey")]
    ApiKey(ApiKeyAuthenticationSpec),

    #[serde(rename = "jwt")]
    Jwt(JwtAuthenticationSpec),

    #[serde(rename = "oauth2Introspection")]
    OAuth2Introspection(OAuth2IntrospectionSpec),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyAuthenticationSpec {
    pub selector: LabelSelector,

    #[serde(default)]
    pub all_namespaces: bool,
}

impl ApiKeyAuthenticationSpec {
    /// API keys stored in Secrets labelled with the security scheme id
    pub fn for_scheme(scheme_name: &str) -> Self {
        let match_labels = [(API_KEY_SELECTOR_LABEL.to_string(), scheme_name.to_string())]
            .into_iter()
            .collect();

        Self {
            selector: LabelSelector {
                match_labels: Some(match_labels),
                ..Default::default()
            },
            all_namespaces: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtAuthenticationSpec {
    pub issuer_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuth2IntrospectionSpec {
    pub endpoint: String,
    pub credentials_ref: SecretReference,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretReference {
    pub name: String,
}

/// Where the authentication credential is read from in the request
///
/// Exactly one member is set by the constructors below.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_header: Option<Prefixed>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_header: Option<Named>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_string: Option<Named>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie: Option<Named>,
}

/// `Authorization: <prefix> <credential>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prefixed {
    pub prefix: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Named {
    pub name: String,
}

impl Credentials {
    pub fn authorization_header(prefix: impl Into<String>) -> Self {
        Self {
            authorization_header: Some(Prefixed {
                prefix: prefix.into(),
            }),
            ..Default::default()
        }
    }

    pub fn custom_header(name: impl Into<String>) -> Self {
        Self {
            custom_header: Some(Named { name: name.into() }),
            ..Default::default()
        }
    }

    pub fn query_string(name: impl Into<String>) -> Self {
        Self {
            query_string: Some(Named { name: name.into() }),
            ..Default::default()
        }
    }

    pub fn cookie(name: impl Into<String>) -> Self {
        Self {
            cookie: Some(Named { name: name.into() }),
            ..Default::default()
        }
    }
}

/// Narrows a policy (or a rule) to a subset of the route's requests
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteSelector {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matches: Vec<HttpRouteMatch>,
}

impl RouteSelector {
    pub fn single(route_match: HttpRouteMatch) -> Self {
        Self {
            matches: vec![route_match],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HttpRouteMatch {
    pub path: HttpPathMatch,
    pub method: HttpMethod,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HttpPathMatch {
    #[serde(rename = "type")]
    pub match_type: PathMatchType,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathMatchType {
    Exact,
    RegularExpression,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target_ref(namespace: Option<&str>) -> PolicyTargetReference {
        PolicyTargetReference {
            group: GATEWAY_API_GROUP.to_string(),
            kind: HTTP_ROUTE_KIND.to_string(),
            name: "petstore".to_string(),
            namespace: namespace.map(String::from),
        }
    }

    #[test]
    fn test_target_ref_omits_absent_namespace() {
        let value = serde_json::to_value(target_ref(None)).unwrap();
        assert!(value.get("namespace").is_none());

        let value = serde_json::to_value(target_ref(Some("apps"))).unwrap();
        assert_eq!(value["namespace"], "apps");
    }

    #[test]
    fn test_authentication_method_is_flattened() {
        let spec = AuthenticationSpec {
            method: AuthenticationMethod::ApiKey(ApiKeyAuthenticationSpec::for_scheme("api_key")),
            credentials: Some(Credentials::custom_header("X-API-KEY")),
            route_selectors: vec![],
        };

        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(
            value["apiKey"]["selector"]["matchLabels"][API_KEY_SELECTOR_LABEL],
            "api_key"
        );
        assert_eq!(value["apiKey"]["allNamespaces"], false);
        assert_eq!(
            value["credentials"],
            serde_json::json!({ "customHeader": { "name": "X-API-KEY" } })
        );
        assert!(value.get("routeSelectors").is_none());
    }

    #[test]
    fn test_credentials_serialize_single_location() {
        let cases = [
            (
                Credentials::authorization_header("Bearer"),
                serde_json::json!({ "authorizationHeader": { "prefix": "Bearer" } }),
            ),
            (
                Credentials::query_string("api_key"),
                serde_json::json!({ "queryString": { "name": "api_key" } }),
            ),
            (
                Credentials::cookie("session"),
                serde_json::json!({ "cookie": { "name": "session" } }),
            ),
        ];

        for (credentials, expected) in cases {
            assert_eq!(serde_json::to_value(&credentials).unwrap(), expected);
        }
    }

    #[test]
    fn test_route_match_wire_names() {
        let selector = RouteSelector::single(HttpRouteMatch {
            path: HttpPathMatch {
                match_type: PathMatchType::RegularExpression,
                value: "^/pets/[^/]+$".to_string(),
            },
            method: HttpMethod::Delete,
        });

        let value = serde_json::to_value(&selector).unwrap();
        assert_eq!(value["matches"][0]["method"], "DELETE");
        assert_eq!(value["matches"][0]["path"]["type"], "RegularExpression");
        assert_eq!(value["matches"][0]["path"]["value"], "^/pets/[^/]+$");
    }
}
