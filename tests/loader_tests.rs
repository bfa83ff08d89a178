mod utils;

use httpmock::{Method, MockServer};
use json_component_validator::error::JcvError;
use json_component_validator::load_registry;
use json_component_validator::loader::{Source, load_document};
use json_component_validator::openapi::SpecVersion;
use std::time::Duration;
use utils::{fixture, read_fixture, test_config};

#[test]
fn test_load_document_from_url() {
    let server = MockServer::start();
    let spec_mock = server.mock(|when, then| {
        when.method(Method::GET).path("/specs/petstore.yaml");
        then.status(200)
            .header("content-type", "application/yaml")
            .body(read_fixture("petstore.yaml"));
    });

    let url = format!("{}/specs/petstore.yaml", server.base_url());
    let (source, text) = load_document(&url, Duration::from_secs(5)).unwrap();

    spec_mock.assert();
    assert!(matches!(source, Source::Url(_)));
    assert!(text.contains("Petstore"));
}

#[test]
fn test_registry_from_url() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(Method::GET).path("/translator.json");
        then.status(200).body(read_fixture("translator_swagger.json"));
    });

    let url = format!("{}/translator.json", server.base_url());
    let (_, registry) = load_registry(&url, &test_config()).unwrap();
    assert_eq!(registry.version(), SpecVersion::Swagger2);
    assert_eq!(registry.title(), "Translator Reasoner API");
    assert!(registry.get("/validate_knowledge_graph").is_some());
}

#[test]
fn test_remote_external_reference_is_fetched() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(Method::GET).path("/split/api.yaml");
        then.status(200).body(read_fixture("external/api.yaml"));
    });
    let common_mock = server.mock(|when, then| {
        when.method(Method::GET).path("/split/common.yaml");
        then.status(200).body(read_fixture("external/common.yaml"));
    });

    let url = format!("{}/split/api.yaml", server.base_url());
    let (_, registry) = load_registry(&url, &test_config()).unwrap();
    common_mock.assert();

    let good = registry
        .validate("/validate_order", &serde_json::json!({"id": "ord-7"}))
        .unwrap();
    assert!(good.valid, "{:?}", good.issues);
}

#[test]
fn test_remote_references_can_be_disabled() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(Method::GET).path("/split/api.yaml");
        then.status(200).body(read_fixture("external/api.yaml"));
    });
    let common_mock = server.mock(|when, then| {
        when.method(Method::GET).path("/split/common.yaml");
        then.status(200).body(read_fixture("external/common.yaml"));
    });

    let mut config = test_config();
    config.set_remote_refs(false);
    let url = format!("{}/split/api.yaml", server.base_url());
    let err = load_registry(&url, &config).unwrap_err();

    common_mock.assert_hits(0);
    assert!(matches!(err, JcvError::SchemaCompileFailed { ref component, .. } if component == "Order"));
}

#[test]
fn test_http_error_status_fails_fetch() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(Method::GET).path("/missing.yaml");
        then.status(404).body("not here");
    });

    let url = format!("{}/missing.yaml", server.base_url());
    let err = load_document(&url, Duration::from_secs(5)).unwrap_err();
    match err {
        JcvError::FetchFailed { reason, .. } => assert!(reason.contains("404"), "{}", reason),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_unknown_version_fails() {
    let err = load_registry(&fixture("unknown_version.yaml"), &test_config()).unwrap_err();
    assert!(matches!(err, JcvError::UnsupportedSpecVersion { .. }));
    assert!(err.to_string().contains("Unrecognized OpenAPI version"));
}

#[test]
fn test_missing_components_fail() {
    let err = load_registry(&fixture("no_components.yaml"), &test_config()).unwrap_err();
    assert!(matches!(err, JcvError::ComponentsMissing { .. }));
}

#[test]
fn test_missing_file_fails() {
    let err = load_registry(&fixture("nope.yaml"), &test_config()).unwrap_err();
    assert!(matches!(err, JcvError::SourceNotFound { .. }));
}

#[test]
fn test_file_url_source() {
    let path = std::fs::canonicalize(fixture("petstore.yaml")).unwrap();
    let url = url::Url::from_file_path(path).unwrap();
    let (source, registry) = load_registry(url.as_str(), &test_config()).unwrap();
    assert!(matches!(source, Source::Url(_)));
    assert_eq!(registry.len(), 3);
}
