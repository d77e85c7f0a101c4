//! OpenAPI 3.0 type definitions
//!
//! Simplified representation focusing on what an AuthPolicy is derived from:
//! document identity, servers, paths and security. Unknown fields are ignored.

use indexmap::IndexMap;
use serde::Deserialize;

/// Name of the Kuadrant vendor extension
pub const KUADRANT_EXTENSION: &str = "x-kuadrant";

/// OpenAPI document root
#[derive(Debug, Clone, Deserialize)]
pub struct OpenApiSpec {
    /// OpenAPI version (e.g., "3.0.3")
    pub openapi: String,

    /// API metadata
    pub info: Info,

    /// Servers
    #[serde(default)]
    pub servers: Vec<Server>,

    /// API paths (endpoints), in document order
    #[serde(default)]
    pub paths: IndexMap<String, PathItem>,

    /// Reusable components
    #[serde(default)]
    pub components: Option<Components>,

    /// Document-wide security requirements
    #[serde(default)]
    pub security: Option<Vec<SecurityRequirement>>,
}

/// API information
#[derive(Debug, Clone, Deserialize)]
pub struct Info {
    /// API title
    pub title: String,

    /// API version
    pub version: String,

    #[serde(rename = "x-kuadrant", default)]
    pub kuadrant: Option<KuadrantInfoExtension>,
}

/// `info.x-kuadrant`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KuadrantInfoExtension {
    #[serde(default)]
    pub route: Option<KuadrantRouteExtension>,
}

/// `info.x-kuadrant.route`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KuadrantRouteExtension {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub namespace: Option<String>,
}

/// `x-kuadrant` on a path item or an operation
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KuadrantOperationExtension {
    /// Excludes the path or operation from the generated policy
    #[serde(default)]
    pub disable: Option<bool>,
}

/// Server information
#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    /// Server URL, possibly templated with `{variable}`s
    pub url: String,

    #[serde(default)]
    pub variables: IndexMap<String, ServerVariable>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerVariable {
    pub default: String,
}

/// Path item (operations for a path)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathItem {
    #[serde(default)]
    pub get: Option<Operation>,

    #[serde(default)]
    pub put: Option<Operation>,

    #[serde(default)]
    pub post: Option<Operation>,

    #[serde(default)]
    pub delete: Option<Operation>,

    #[serde(default)]
    pub options: Option<Operation>,

    #[serde(default)]
    pub head: Option<Operation>,

    #[serde(default)]
    pub patch: Option<Operation>,

    #[serde(default)]
    pub trace: Option<Operation>,

    /// Parameters shared by every operation of the path
    #[serde(default)]
    pub parameters: Vec<ParameterOrRef>,

    #[serde(rename = "x-kuadrant", default)]
    pub kuadrant: Option<KuadrantOperationExtension>,
}

/// HTTP operation
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Operation {
    #[serde(default)]
    pub parameters: Vec<ParameterOrRef>,

    /// Overrides the document-wide requirements; `Some(vec![])` means unsecured
    #[serde(default)]
    pub security: Option<Vec<SecurityRequirement>>,

    #[serde(rename = "x-kuadrant", default)]
    pub kuadrant: Option<KuadrantOperationExtension>,
}

/// Parameter definition
#[derive(Debug, Clone, Deserialize)]
pub struct Parameter {
    /// Parameter name
    pub name: String,

    /// Location: query, header, path, cookie
    #[serde(rename = "in")]
    pub location: String,
}

/// Component or reference to a component
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ReferenceOr<T> {
    Reference {
        #[serde(rename = "$ref")]
        ref_path: String,
    },
    Item(T),
}

pub type ParameterOrRef = ReferenceOr<Parameter>;
pub type SecuritySchemeOrRef = ReferenceOr<SecurityScheme>;

/// Scheme name to required scopes
pub type SecurityRequirement = IndexMap<String, Vec<String>>;

/// Security scheme declaration
///
/// Kept loosely typed: the `type` is classified during extraction so that
/// unknown types surface as an explicit error instead of a decode failure.
#[derive(Debug, Clone, Deserialize)]
pub struct SecurityScheme {
    /// apiKey, http, oauth2, openIdConnect
    #[serde(rename = "type")]
    pub scheme_type: String,

    /// API key name (for type=apiKey)
    #[serde(default)]
    pub name: Option<String>,

    /// API key location (for type=apiKey)
    #[serde(rename = "in", default)]
    pub location: Option<String>,

    /// HTTP auth scheme name (for type=http)
    #[serde(default)]
    pub scheme: Option<String>,

    #[serde(default)]
    pub flows: Option<OAuthFlows>,

    #[serde(rename = "openIdConnectUrl", default)]
    pub open_id_connect_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OAuthFlows {
    #[serde(default)]
    pub password: Option<OAuthFlow>,

    #[serde(rename = "clientCredentials", default)]
    pub client_credentials: Option<OAuthFlow>,

    #[serde(rename = "authorizationCode", default)]
    pub authorization_code: Option<OAuthFlow>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OAuthFlow {
    #[serde(rename = "tokenUrl", default)]
    pub token_url: Option<String>,
}

/// Reusable components
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Components {
    #[serde(default)]
    pub parameters: IndexMap<String, ParameterOrRef>,

    #[serde(rename = "securitySchemes", default)]
    pub security_schemes: IndexMap<String, SecuritySchemeOrRef>,
}

/// HTTP methods an OpenAPI path item can declare, in specification order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl Method {
    pub const ALL: [Method; 8] = [
        Method::Get,
        Method::Put,
        Method::Post,
        Method::Delete,
        Method::Options,
        Method::Head,
        Method::Patch,
        Method::Trace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Put => "put",
            Method::Post => "post",
            Method::Delete => "delete",
            Method::Options => "options",
            Method::Head => "head",
            Method::Patch => "patch",
            Method::Trace => "trace",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PathItem {
    pub fn operation(&self, method: Method) -> Option<&Operation> {
        match method {
            Method::Get => self.get.as_ref(),
            Method::Put => self.put.as_ref(),
            Method::Post => self.post.as_ref(),
            Method::Delete => self.delete.as_ref(),
            Method::Options => self.options.as_ref(),
            Method::Head => self.head.as_ref(),
            Method::Patch => self.patch.as_ref(),
            Method::Trace => self.trace.as_ref(),
        }
    }

    /// Declared operations in specification method order
    pub fn operations(&self) -> impl Iterator<Item = (Method, &Operation)> {
        Method::ALL
            .into_iter()
            .filter_map(move |method| self.operation(method).map(|op| (method, op)))
    }

    fn is_disabled(&self) -> bool {
        self.kuadrant
            .as_ref()
            .and_then(|ext| ext.disable)
            .unwrap_or(false)
    }
}

impl Operation {
    /// Whether the operation takes part in the policy, given its path's state
    ///
    /// An operation-level `disable` wins over the path-level one.
    pub fn is_enabled(&self, path_item: &PathItem) -> bool {
        match self.kuadrant.as_ref().and_then(|ext| ext.disable) {
            Some(disable) => !disable,
            None => !path_item.is_disabled(),
        }
    }
}

impl OpenApiSpec {
    /// Get a security scheme by name, following one level of `$ref`
    pub fn security_scheme(&self, name: &str) -> Option<&SecurityScheme> {
        let components = self.components.as_ref()?;
        match components.security_schemes.get(name)? {
            ReferenceOr::Item(scheme) => Some(scheme),
            ReferenceOr::Reference { ref_path } => self.resolve_security_scheme_ref(ref_path),
        }
    }

    /// e.g., "#/components/securitySchemes/api_key" -> returns the api_key scheme
    pub fn resolve_security_scheme_ref(&self, ref_path: &str) -> Option<&SecurityScheme> {
        let name = ref_path.strip_prefix("#/components/securitySchemes/")?;
        match self.components.as_ref()?.security_schemes.get(name)? {
            ReferenceOr::Item(scheme) => Some(scheme),
            ReferenceOr::Reference { .. } => None,
        }
    }

    /// e.g., "#/components/parameters/petId" -> returns the petId parameter
    pub fn resolve_parameter_ref(&self, ref_path: &str) -> Option<&Parameter> {
        let name = ref_path.strip_prefix("#/components/parameters/")?;
        match self.components.as_ref()?.parameters.get(name)? {
            ReferenceOr::Item(param) => Some(param),
            ReferenceOr::Reference { .. } => None,
        }
    }

    pub fn parameter<'a>(&'a self, param: &'a ParameterOrRef) -> Option<&'a Parameter> {
        match param {
            ReferenceOr::Item(param) => Some(param),
            ReferenceOr::Reference { ref_path } => self.resolve_parameter_ref(ref_path),
        }
    }

    /// Declared security schemes in declaration order
    pub fn security_scheme_names(&self) -> impl Iterator<Item = &str> {
        self.components
            .iter()
            .flat_map(|c| c.security_schemes.keys())
            .map(String::as_str)
    }

    /// Security requirements in effect for an operation
    pub fn effective_security<'a>(&'a self, operation: &'a Operation) -> &'a [SecurityRequirement] {
        operation
            .security
            .as_deref()
            .or(self.security.as_deref())
            .unwrap_or(&[])
    }

    /// Enabled operations in document order
    pub fn enabled_operations(&self) -> impl Iterator<Item = (&str, Method, &Operation)> {
        self.paths.iter().flat_map(|(path, item)| {
            item.operations()
                .filter(move |(_, op)| op.is_enabled(item))
                .map(move |(method, op)| (path.as_str(), method, op))
        })
    }

    /// Base path of the first server, variables replaced by their defaults
    ///
    /// e.g., "https://{env}.example.com/api/v1/" -> "/api/v1"
    pub fn base_path(&self) -> String {
        let Some(server) = self.servers.first() else {
            return String::new();
        };

        let mut url = server.url.clone();
        for (name, variable) in &server.variables {
            url = url.replace(&format!("{{{}}}", name), &variable.default);
        }

        let path = match url.split_once("://") {
            Some((_, rest)) => rest.find('/').map(|idx| &rest[idx..]).unwrap_or(""),
            None if url.starts_with('/') => url.as_str(),
            None => "",
        };

        path.trim_end_matches('/').to_string()
    }
}
