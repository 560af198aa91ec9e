//! Vault / OpenBao provider tests against a mock HTTP server

use secrecy::{ExposeSecret, SecretString};
use secrets::providers::VaultProvider;
use secrets::{Fingerprint, SecretInfo, SecretRequest, SecretsError, SecretsProvider, VaultConfig};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn token_config(server: &MockServer) -> VaultConfig {
    VaultConfig {
        address: format!("{}/", server.uri()),
        token: Some(SecretString::new("root".to_string())),
        ..Default::default()
    }
}

fn kv2_body(data: serde_json::Value) -> serde_json::Value {
    json!({ "data": { "data": data, "metadata": { "version": 1 } } })
}

#[tokio::test]
async fn test_kv2_read_uses_default_field_priority() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/data/api/db-password"))
        .and(header("X-Vault-Token", "root"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(kv2_body(json!({"password": "p1", "value": "v1"}))),
        )
        .mount(&server)
        .await;

    let provider = VaultProvider::new(token_config(&server)).await.unwrap();
    let secret = provider
        .get_secret(&SecretRequest::new("db-password", "api"))
        .await
        .unwrap();

    assert_eq!(secret.bytes(), b"v1");
    assert_eq!(secret.field, "value");
    assert_eq!(secret.path, "secret/data/api/db-password");
}

#[tokio::test]
async fn test_field_and_path_labels() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/data/database/mysql"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(kv2_body(json!({"password": "p1", "value": "v1"}))),
        )
        .mount(&server)
        .await;

    let provider = VaultProvider::new(token_config(&server)).await.unwrap();
    let request = SecretRequest::new("db-password", "api")
        .with_label("vault_path", "database/mysql")
        .with_label("vault_field", "password");
    let secret = provider.get_secret(&request).await.unwrap();

    assert_eq!(secret.bytes(), b"p1");
    assert_eq!(secret.field, "password");
}

#[tokio::test]
async fn test_kv1_mount_has_no_data_segment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/kv/db-password"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": {"secret": "s1"}})),
        )
        .mount(&server)
        .await;

    let config = VaultConfig {
        mount_path: "kv".to_string(),
        ..token_config(&server)
    };
    let provider = VaultProvider::new(config).await.unwrap();
    let secret = provider
        .get_secret(&SecretRequest::new("db-password", ""))
        .await
        .unwrap();

    assert_eq!(secret.bytes(), b"s1");
    assert_eq!(secret.path, "kv/db-password");
}

#[tokio::test]
async fn test_missing_secret_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"errors": []})))
        .mount(&server)
        .await;

    let provider = VaultProvider::new(token_config(&server)).await.unwrap();
    let err = provider
        .get_secret(&SecretRequest::new("missing", "api"))
        .await
        .unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_missing_explicit_field_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(kv2_body(json!({"value": "v1"}))))
        .mount(&server)
        .await;

    let provider = VaultProvider::new(token_config(&server)).await.unwrap();
    let request = SecretRequest::new("db", "api").with_label("vault_field", "username");
    let err = provider.get_secret(&request).await.unwrap_err();

    assert!(matches!(err, SecretsError::NotFound(_)));
}

#[tokio::test]
async fn test_approle_login_then_read() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/approle/login"))
        .and(body_json(json!({"role_id": "role", "secret_id": "sid"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"auth": {"client_token": "approle-token"}})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/data/db"))
        .and(header("X-Vault-Token", "approle-token"))
        .and(header("X-Vault-Namespace", "team-a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(kv2_body(json!({"value": "v1"}))))
        .mount(&server)
        .await;

    let config = VaultConfig {
        address: server.uri(),
        auth_method: "approle".to_string(),
        role_id: Some("role".to_string()),
        secret_id: Some(SecretString::new("sid".to_string())),
        namespace: Some("team-a".to_string()),
        ..Default::default()
    };
    let provider = VaultProvider::new(config).await.unwrap();
    let secret = provider.get_secret(&SecretRequest::new("db", "")).await.unwrap();

    assert_eq!(secret.bytes(), b"v1");
    server.verify().await;
}

#[tokio::test]
async fn test_invalid_client_identity_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let cert = dir.path().join("client.crt");
    let key = dir.path().join("client.key");
    std::fs::write(&cert, "not a certificate").unwrap();
    std::fs::write(&key, "not a key").unwrap();

    let config = VaultConfig {
        token: Some(SecretString::new("root".to_string())),
        client_cert: Some(cert),
        client_key: Some(key),
        ..Default::default()
    };
    let err = VaultProvider::new(config).await.err().unwrap();
    assert!(err.is_config());
    assert!(err.to_string().contains("TLS"));
}

#[tokio::test]
async fn test_missing_client_key_file() {
    let dir = tempfile::tempdir().unwrap();
    let cert = dir.path().join("client.crt");
    std::fs::write(&cert, "pem").unwrap();

    let config = VaultConfig {
        token: Some(SecretString::new("root".to_string())),
        client_cert: Some(cert),
        client_key: Some(dir.path().join("absent.key")),
        ..Default::default()
    };
    let err = VaultProvider::new(config).await.err().unwrap();
    assert!(err.is_config());
    assert!(err.to_string().contains("absent.key"));
}

#[tokio::test]
async fn test_token_auth_requires_token() {
    let config = VaultConfig {
        token: None,
        ..Default::default()
    };
    let err = VaultProvider::new(config).await.err().unwrap();
    assert!(err.is_config());
    assert!(err.to_string().contains("VAULT_TOKEN"));
}

#[tokio::test]
async fn test_unknown_auth_method() {
    let config = VaultConfig {
        auth_method: "kubernetes".to_string(),
        ..Default::default()
    };
    let err = VaultProvider::new(config).await.err().unwrap();
    assert!(err.to_string().contains("unsupported authentication method"));
}

#[tokio::test]
async fn test_check_secret_changed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/data/api/db"))
        .respond_with(ResponseTemplate::new(200).set_body_json(kv2_body(json!({"value": "new"}))))
        .mount(&server)
        .await;

    let provider = VaultProvider::new(token_config(&server)).await.unwrap();

    let stale = SecretInfo::new("db", "secret/data/api/db", "value", "vault", Fingerprint::of(b"old"));
    assert!(provider.check_secret_changed(&stale).await.unwrap());

    let current = SecretInfo::new("db", "secret/data/api/db", "value", "vault", Fingerprint::of(b"new"));
    assert!(!provider.check_secret_changed(&current).await.unwrap());

    let value = provider.fetch_tracked(&stale).await.unwrap();
    assert_eq!(value.expose_secret(), b"new");
}

#[tokio::test]
async fn test_openbao_uses_its_own_labels() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/data/shared/db"))
        .respond_with(ResponseTemplate::new(200).set_body_json(kv2_body(json!({"value": "bao"}))))
        .mount(&server)
        .await;

    let provider = VaultProvider::openbao(token_config(&server)).await.unwrap();
    assert_eq!(provider.name(), "openbao");

    let request = SecretRequest::new("db", "api")
        .with_label("vault_path", "ignored")
        .with_label("openbao_path", "shared/db");
    let secret = provider.get_secret(&request).await.unwrap();
    assert_eq!(secret.bytes(), b"bao");
}
