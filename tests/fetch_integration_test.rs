use httpmock::prelude::*;
use layer_harvester::domain::model::CredentialSet;
use layer_harvester::domain::ports::CapabilitySource;
use layer_harvester::{HarvestError, HttpCapabilitySource};

fn credentials_for(server: &MockServer) -> CredentialSet {
    CredentialSet {
        group: "quarticle".to_string(),
        environment: "dev".to_string(),
        username: "harvester".to_string(),
        password: "secret".to_string(),
        login_url: server.url("/api/v1/login"),
        get_capabilities_url: server.url("/api/v1/capabilities"),
        base_url: None,
        ssl_verify: true,
        full_layer_details: true,
    }
}

#[tokio::test]
async fn test_fetch_logs_in_and_sends_bearer_token() {
    let server = MockServer::start();

    let login_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/v1/login")
            .json_body(serde_json::json!({"username": "harvester", "password": "secret"}));
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({"access_token": "jwt-123", "expires_in": 3600}));
    });

    let caps_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/v1/capabilities")
            .header("authorization", "Bearer jwt-123");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({
                "capability": {
                    "layer": [{ "name": "a", "keyword_list": ["hazardlookup"] }]
                }
            }));
    });

    let document = HttpCapabilitySource::new()
        .fetch(&credentials_for(&server))
        .await
        .unwrap();

    login_mock.assert();
    caps_mock.assert();
    assert!(document.get("capability").is_some());
}

#[tokio::test]
async fn test_rejected_login_is_an_authentication_error() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST).path("/api/v1/login");
        then.status(401);
    });

    let err = HttpCapabilitySource::new()
        .fetch(&credentials_for(&server))
        .await
        .unwrap_err();

    assert!(matches!(err, HarvestError::Authentication { .. }));
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn test_login_without_recognizable_token_field() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST).path("/api/v1/login");
        then.status(200)
            .json_body(serde_json::json!({"session": "abc", "expires_in": 3600}));
    });

    let err = HttpCapabilitySource::new()
        .fetch(&credentials_for(&server))
        .await
        .unwrap_err();

    match err {
        HarvestError::TokenNotFound { keys, .. } => {
            assert!(keys.contains(&"session".to_string()));
        }
        other => panic!("expected TokenNotFound, got: {}", other),
    }
}

#[tokio::test]
async fn test_login_with_non_json_body() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST).path("/api/v1/login");
        then.status(200).body("<html>login page</html>");
    });

    let err = HttpCapabilitySource::new()
        .fetch(&credentials_for(&server))
        .await
        .unwrap_err();

    assert!(matches!(err, HarvestError::Authentication { .. }));
}

#[tokio::test]
async fn test_failed_capabilities_call_after_successful_login() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST).path("/api/v1/login");
        then.status(200).json_body(serde_json::json!({"token": "t"}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/v1/capabilities");
        then.status(500);
    });

    let err = HttpCapabilitySource::new()
        .fetch(&credentials_for(&server))
        .await
        .unwrap_err();

    assert!(matches!(err, HarvestError::CapabilitiesFetch { .. }));
}

#[tokio::test]
async fn test_capabilities_body_that_is_not_json() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST).path("/api/v1/login");
        then.status(200).json_body(serde_json::json!({"jwt": "t"}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/v1/capabilities");
        then.status(200).body("<WMS_Capabilities/>");
    });

    let err = HttpCapabilitySource::new()
        .fetch(&credentials_for(&server))
        .await
        .unwrap_err();

    assert!(matches!(err, HarvestError::CapabilitiesFetch { .. }));
}

#[tokio::test]
async fn test_token_precedence_over_the_wire() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST).path("/api/v1/login");
        then.status(200)
            .json_body(serde_json::json!({"access_token": "x", "jwt": "y"}));
    });
    let caps_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/v1/capabilities")
            .header("authorization", "Bearer x");
        then.status(200).json_body(serde_json::json!({"layer": []}));
    });

    HttpCapabilitySource::new()
        .fetch(&credentials_for(&server))
        .await
        .unwrap();

    caps_mock.assert();
}
