//! Integration tests for AuthPolicy generation

use kuadrantctl_common::GeneratorError;
use kuadrantctl_generator::{AuthPolicyGenerator, OutputFormat};
use kuadrantctl_parser::OpenApiParser;
use serde_json::Value;
use std::io::Write;
use tempfile::NamedTempFile;

const PETSTORE: &str = r#"
openapi: 3.0.3
info:
  title: Swagger Petstore
  version: 1.0.0
  x-kuadrant:
    route:
      name: petstore
      namespace: petstore
servers:
  - url: https://petstore.example.com/v1
security:
  - api_key: []
paths:
  /pets:
    get:
      operationId: listPets
      security: []
    post:
      operationId: createPet
  /pets/{petId}:
    parameters:
      - $ref: '#/components/parameters/petId'
    get:
      operationId: showPetById
      security:
        - oidc: []
    delete:
      operationId: deletePet
  /admin:
    x-kuadrant:
      disable: true
    get:
      operationId: adminPanel
components:
  parameters:
    petId:
      name: petId
      in: path
      required: true
      schema:
        type: string
  securitySchemes:
    api_key:
      type: apiKey
      name: X-API-KEY
      in: header
    oidc:
      type: openIdConnect
      openIdConnectUrl: https://sso.example.com/realms/petstore/.well-known/openid-configuration
"#;

fn render(document: &str, format: OutputFormat) -> Result<String, GeneratorError> {
    let parser = OpenApiParser::from_bytes(document.as_bytes())?;
    AuthPolicyGenerator::new(parser.spec())?.render(format)
}

fn render_value(document: &str) -> Value {
    let json = render(document, OutputFormat::Json).unwrap();
    serde_json::from_str(&json).unwrap()
}

#[test]
fn test_generate_petstore_policy() {
    let policy = render_value(PETSTORE);

    assert_eq!(policy["apiVersion"], "kuadrant.io/v1beta2");
    assert_eq!(policy["kind"], "AuthPolicy");
    assert_eq!(policy["metadata"]["name"], "petstore");
    assert_eq!(policy["metadata"]["namespace"], "petstore");

    let target_ref = &policy["spec"]["targetRef"];
    assert_eq!(target_ref["group"], "gateway.networking.k8s.io");
    assert_eq!(target_ref["kind"], "HTTPRoute");
    assert_eq!(target_ref["name"], "petstore");
    assert_eq!(target_ref["namespace"], "petstore");

    let selectors = policy["spec"]["routeSelectors"].as_array().unwrap();
    let matches: Vec<(&str, &str, &str)> = selectors
        .iter()
        .map(|s| {
            let m = &s["matches"][0];
            (
                m["method"].as_str().unwrap(),
                m["path"]["type"].as_str().unwrap(),
                m["path"]["value"].as_str().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        matches,
        vec![
            ("GET", "Exact", "/v1/pets"),
            ("POST", "Exact", "/v1/pets"),
            ("GET", "RegularExpression", "^/v1/pets/[^/]+$"),
            ("DELETE", "RegularExpression", "^/v1/pets/[^/]+$"),
        ]
    );

    let authentication = &policy["spec"]["rules"]["authentication"];
    let api_key = &authentication["api_key"];
    assert_eq!(
        api_key["apiKey"]["selector"]["matchLabels"]["kuadrant.io/apikeys-by"],
        "api_key"
    );
    assert_eq!(
        api_key["credentials"],
        serde_json::json!({ "customHeader": { "name": "X-API-KEY" } })
    );
    let api_key_methods: Vec<&str> = api_key["routeSelectors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["matches"][0]["method"].as_str().unwrap())
        .collect();
    assert_eq!(api_key_methods, vec!["POST", "DELETE"]);

    let oidc = &authentication["oidc"];
    assert_eq!(
        oidc["jwt"]["issuerUrl"],
        "https://sso.example.com/realms/petstore"
    );
    assert_eq!(oidc["routeSelectors"].as_array().unwrap().len(), 1);
}

#[test]
fn test_public_operations_stay_unauthenticated() {
    let document = r#"
openapi: 3.0.3
info:
  title: Toy Store
  version: 1.0.0
paths:
  /public:
    get:
      security: []
  /toys:
    post:
      security:
        - api_key: []
components:
  securitySchemes:
    api_key:
      type: apiKey
      name: X-KEY
      in: header
    legacy:
      type: http
      scheme: basic
"#;

    let policy = render_value(document);
    let authentication = policy["spec"]["rules"]["authentication"]
        .as_object()
        .unwrap();
    assert_eq!(authentication.len(), 1);
    assert!(authentication.get("legacy").is_none());

    let api_key = &authentication["api_key"];
    assert_eq!(
        api_key["credentials"],
        serde_json::json!({ "customHeader": { "name": "X-KEY" } })
    );
    let selectors = api_key["routeSelectors"].as_array().unwrap();
    assert_eq!(selectors.len(), 1);
    assert_eq!(selectors[0]["matches"][0]["method"], "POST");
    assert_eq!(selectors[0]["matches"][0]["path"]["value"], "/toys");

    let yaml = render(document, OutputFormat::Yaml).unwrap();
    assert!(!yaml.contains("keySelector"));
}

#[test]
fn test_combined_requirement_produces_no_output() {
    let document = r#"
openapi: 3.0.3
info:
  title: Toy Store
  version: 1.0.0
security:
  - api_key: []
    oidc: []
paths:
  /toys:
    get: {}
components:
  securitySchemes:
    api_key:
      type: apiKey
      name: X-KEY
      in: header
    oidc:
      type: openIdConnect
      openIdConnectUrl: https://sso.example.com
"#;

    let err = render(document, OutputFormat::Yaml).unwrap_err();
    assert!(matches!(err, GeneratorError::Extraction(_)));
}

#[test]
fn test_yaml_and_json_outputs_are_equivalent() {
    let yaml = render(PETSTORE, OutputFormat::Yaml).unwrap();
    let json = render(PETSTORE, OutputFormat::Json).unwrap();

    let from_yaml: Value = serde_yaml::from_str(&yaml).unwrap();
    let from_json: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(from_yaml, from_json);
}

#[test]
fn test_output_is_idempotent() {
    for format in [OutputFormat::Yaml, OutputFormat::Json] {
        let first = render(PETSTORE, format).unwrap();
        let second = render(PETSTORE, format).unwrap();
        assert_eq!(first, second, "{} output differs between runs", format);
    }
}

#[test]
fn test_namespace_omitted_when_absent() {
    let document = r#"
openapi: 3.0.3
info:
  title: Toy Store
  version: 1.0.0
paths:
  /toys:
    get: {}
"#;

    let policy = render_value(document);
    assert_eq!(policy["metadata"]["name"], "toy-store");
    assert!(policy["metadata"].get("namespace").is_none());
    assert_eq!(policy["spec"]["targetRef"]["name"], "toy-store");
    assert!(policy["spec"]["targetRef"].get("namespace").is_none());

    let yaml = render(document, OutputFormat::Yaml).unwrap();
    assert!(!yaml.contains("namespace"));
}

#[test]
fn test_selector_count_matches_operations() {
    let document = r#"
openapi: 3.0.3
info:
  title: Toy Store
  version: 1.0.0
paths:
  /toys:
    get: {}
    post: {}
    put: {}
  /toys/{id}:
    parameters:
      - name: id
        in: path
        required: true
    get: {}
    patch: {}
"#;

    let policy = render_value(document);
    assert_eq!(policy["spec"]["routeSelectors"].as_array().unwrap().len(), 5);
}

#[test]
fn test_zero_operations_yield_no_selectors() {
    let document = r#"
openapi: 3.0.3
info:
  title: Toy Store
  version: 1.0.0
paths: {}
"#;

    let policy = render_value(document);
    assert!(policy["spec"].get("routeSelectors").is_none());
    assert!(policy["spec"]["rules"].get("authentication").is_none());
}

#[test]
fn test_unsupported_scheme_produces_no_output() {
    let document = r#"
openapi: 3.0.3
info:
  title: Toy Store
  version: 1.0.0
security:
  - mtls: []
paths:
  /toys:
    get: {}
components:
  securitySchemes:
    mtls:
      type: mutualTLS
"#;

    let err = render(document, OutputFormat::Yaml).unwrap_err();
    assert!(matches!(
        err,
        GeneratorError::UnsupportedSecurityScheme { ref name, .. } if name == "mtls"
    ));
}

#[test]
fn test_validation_failure_precedes_extraction() {
    // Missing `info`, and an unsupported scheme that extraction would reject
    let document = r#"
openapi: 3.0.3
paths: {}
components:
  securitySchemes:
    mtls:
      type: mutualTLS
"#;

    let err = render(document, OutputFormat::Yaml).unwrap_err();
    assert!(matches!(err, GeneratorError::Validation(_)));
    assert!(err.to_string().contains("OpenAPI validation error"));
}

#[test]
fn test_generate_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(PETSTORE.as_bytes()).unwrap();

    let parser = OpenApiParser::from_file(file.path()).unwrap();
    let generator = AuthPolicyGenerator::new(parser.spec()).unwrap();
    assert_eq!(generator.policy().spec.target_ref.name, "petstore");
    assert_eq!(generator.policy().spec.route_selectors.len(), 4);
}
