//! DockerClient against a mock Engine API over tcp

use std::collections::BTreeMap;
use serde_json::json;
use swarm_lib::{DockerClient, DockerConfig, DockerHost, OrchestratorClient, SwarmError};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> DockerClient {
    DockerClient::new(DockerConfig {
        host: DockerHost::Tcp(server.address().to_string()),
        api_version: "1.41".to_string(),
    })
}

#[tokio::test]
async fn test_list_secrets() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1.41/secrets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"ID": "s1", "Version": {"Index": 10}, "Spec": {"Name": "db-pass", "Labels": {"env": "prod"}}},
            {"ID": "s2", "Version": {"Index": 11}, "Spec": {"Name": "api-key"}}
        ])))
        .mount(&server)
        .await;

    let secrets = client(&server).list_secrets().await.unwrap();
    assert_eq!(secrets.len(), 2);
    assert_eq!(secrets[0].name(), "db-pass");
    assert_eq!(secrets[0].label("env"), Some("prod"));
    assert!(secrets[1].spec.labels.is_empty());
}

#[tokio::test]
async fn test_create_secret_sends_base64_data() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1.41/secrets/create"))
        .and(body_partial_json(json!({
            "Name": "db-pass-1700000000",
            "Labels": {"secrets-plugin.rotation-source": "db-pass"},
            "Data": "bmV3"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"ID": "new-id"})))
        .mount(&server)
        .await;

    let labels = BTreeMap::from([(
        "secrets-plugin.rotation-source".to_string(),
        "db-pass".to_string(),
    )]);
    let id = client(&server)
        .create_secret("db-pass-1700000000", &labels, b"new")
        .await
        .unwrap();
    assert_eq!(id, "new-id");
}

#[tokio::test]
async fn test_delete_secret() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1.41/secrets/s1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).delete_secret("s1").await.unwrap();
    server.verify().await;
}

#[tokio::test]
async fn test_delete_in_use_secret_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "rpc error: secret 'db-pass' is in use by the following service: api"
        })))
        .mount(&server)
        .await;

    let err = client(&server).delete_secret("s1").await.unwrap_err();
    match err {
        SwarmError::Api { status, message } => {
            assert_eq!(status, 400);
            assert!(message.contains("in use"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_update_service_round_trips_spec() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1.41/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "ID": "svc-a",
            "Version": {"Index": 42},
            "Spec": {
                "Name": "svc-a",
                "Mode": {"Replicated": {"Replicas": 1}},
                "TaskTemplate": {"ContainerSpec": {
                    "Image": "app:1",
                    "Secrets": [{"File": {"Name": "db", "UID": "0", "GID": "0", "Mode": 292},
                                 "SecretID": "s1", "SecretName": "db-pass"}]
                }}
            }
        }])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1.41/services/svc-a/update"))
        .and(query_param("version", "42"))
        .and(body_partial_json(json!({
            "Mode": {"Replicated": {"Replicas": 1}},
            "TaskTemplate": {"ContainerSpec": {"Image": "app:1"}}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Warnings": null})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let services = client.list_services().await.unwrap();
    let service = &services[0];
    assert_eq!(service.spec.secret_refs()[0].secret_id, "s1");

    let warnings = client
        .update_service(&service.id, service.version.index, &service.spec)
        .await
        .unwrap();
    assert!(warnings.is_empty());
    server.verify().await;
}

#[tokio::test]
async fn test_stale_version_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "message": "update out of sequence"
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .update_service("svc-a", 1, &Default::default())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn test_unreachable_host() {
    let client = DockerClient::new(DockerConfig {
        host: DockerHost::Tcp("127.0.0.1:1".to_string()),
        api_version: "1.41".to_string(),
    });
    let err = client.list_secrets().await.unwrap_err();
    assert!(matches!(err, SwarmError::Connect(_)));
}
