//! Docker Engine API client over a unix socket or tcp

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::client::conn::http1;
use hyper::header::{CONTENT_TYPE, HOST};
use hyper::{Method, Request, StatusCode};
use hyper_util::rt::TokioIo;
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::debug;

use crate::models::{ErrorResponse, IdResponse, SecretCreate, ServiceUpdateResponse};
use crate::{Labels, OrchestratorClient, ServiceSpec, SwarmError, SwarmSecret, SwarmService};

pub const DEFAULT_DOCKER_HOST: &str = "unix:///var/run/docker.sock";
pub const DEFAULT_API_VERSION: &str = "1.41";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const SERVICE_TIMEOUT: Duration = Duration::from_secs(60);

/// Where the Engine API listens
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DockerHost {
    Unix(PathBuf),
    /// `host:port`
    Tcp(String),
}

impl FromStr for DockerHost {
    type Err = SwarmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(path) = s.strip_prefix("unix://") {
            return Ok(DockerHost::Unix(PathBuf::from(path)));
        }
        let authority = s
            .strip_prefix("tcp://")
            .or_else(|| s.strip_prefix("http://"))
            .map(|a| a.trim_end_matches('/'))
            .filter(|a| !a.is_empty())
            .ok_or_else(|| SwarmError::InvalidConfig(format!("unsupported DOCKER_HOST: {s}")))?;
        Ok(DockerHost::Tcp(authority.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerConfig {
    pub host: DockerHost,
    /// Engine API version without the `v`, e.g. "1.41"
    pub api_version: String,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            host: DockerHost::Unix(PathBuf::from("/var/run/docker.sock")),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }
}

impl DockerConfig {
    /// Load from `DOCKER_HOST` and `DOCKER_API_VERSION`
    pub fn from_env() -> Result<Self, SwarmError> {
        let host = std::env::var("DOCKER_HOST")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_DOCKER_HOST.to_string());
        let api_version = std::env::var("DOCKER_API_VERSION")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());

        Ok(Self {
            host: host.parse()?,
            api_version: api_version.trim_start_matches('v').to_string(),
        })
    }
}

/// Engine API client. Opens one connection per request.
#[derive(Debug, Clone)]
pub struct DockerClient {
    config: DockerConfig,
}

impl DockerClient {
    pub fn new(config: DockerConfig) -> Self {
        Self { config }
    }

    pub fn from_env() -> Result<Self, SwarmError> {
        DockerConfig::from_env().map(Self::new)
    }

    pub fn config(&self) -> &DockerConfig {
        &self.config
    }

    async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
        timeout: Duration,
    ) -> Result<Bytes, SwarmError> {
        let uri = format!("/v{}{}", self.config.api_version, path);
        debug!(method = %method, uri = %uri, "Docker API request");

        let host = match self.config.host {
            DockerHost::Unix(_) => "localhost",
            DockerHost::Tcp(ref authority) => authority.as_str(),
        };
        let mut builder = Request::builder().method(method).uri(&uri).header(HOST, host);
        if body.is_some() {
            builder = builder.header(CONTENT_TYPE, "application/json");
        }
        let request = builder
            .body(Full::new(Bytes::from(body.unwrap_or_default())))
            .map_err(|e| SwarmError::InvalidConfig(e.to_string()))?;

        let exchange = async {
            match self.config.host {
                DockerHost::Unix(ref path) => {
                    #[cfg(unix)]
                    {
                        let stream = tokio::net::UnixStream::connect(path).await.map_err(|e| {
                            SwarmError::Connect(format!("{}: {e}", path.display()))
                        })?;
                        send(stream, request).await
                    }
                    #[cfg(not(unix))]
                    {
                        let _ = request;
                        Err(SwarmError::InvalidConfig(format!(
                            "unix sockets are not available: {}",
                            path.display()
                        )))
                    }
                }
                DockerHost::Tcp(ref authority) => {
                    let stream = TcpStream::connect(authority.as_str())
                        .await
                        .map_err(|e| SwarmError::Connect(format!("{authority}: {e}")))?;
                    send(stream, request).await
                }
            }
        };

        let (status, body) = tokio::time::timeout(timeout, exchange)
            .await
            .map_err(|_| SwarmError::Timeout(timeout))??;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorResponse>(&body)
                .map(|e| e.message)
                .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned());
            return Err(SwarmError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(body)
    }

    async fn call_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
        timeout: Duration,
    ) -> Result<T, SwarmError> {
        let bytes = self.call(method, path, body, timeout).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

async fn send<S>(stream: S, request: Request<Full<Bytes>>) -> Result<(StatusCode, Bytes), SwarmError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut sender, conn) = http1::handshake(TokioIo::new(stream))
        .await
        .map_err(|e| SwarmError::Connect(e.to_string()))?;
    tokio::spawn(async move {
        if let Err(e) = conn.await {
            debug!(error = %e, "Docker connection closed with error");
        }
    });

    let response = sender
        .send_request(request)
        .await
        .map_err(|e| SwarmError::Connect(e.to_string()))?;
    let status = response.status();
    let body = response
        .into_body()
        .collect()
        .await
        .map_err(|e| SwarmError::Connect(e.to_string()))?
        .to_bytes();
    Ok((status, body))
}

#[async_trait]
impl OrchestratorClient for DockerClient {
    async fn list_secrets(&self) -> Result<Vec<SwarmSecret>, SwarmError> {
        self.call_json(Method::GET, "/secrets", None, REQUEST_TIMEOUT)
            .await
    }

    async fn create_secret(
        &self,
        name: &str,
        labels: &Labels,
        data: &[u8],
    ) -> Result<String, SwarmError> {
        let body = serde_json::to_vec(&SecretCreate {
            name,
            labels,
            data: STANDARD.encode(data),
        })?;
        let created: IdResponse = self
            .call_json(Method::POST, "/secrets/create", Some(body), REQUEST_TIMEOUT)
            .await?;
        Ok(created.id)
    }

    async fn delete_secret(&self, id: &str) -> Result<(), SwarmError> {
        self.call(Method::DELETE, &format!("/secrets/{id}"), None, REQUEST_TIMEOUT)
            .await
            .map(|_| ())
    }

    async fn list_services(&self) -> Result<Vec<SwarmService>, SwarmError> {
        self.call_json(Method::GET, "/services", None, SERVICE_TIMEOUT)
            .await
    }

    async fn update_service(
        &self,
        id: &str,
        version: u64,
        spec: &ServiceSpec,
    ) -> Result<Vec<String>, SwarmError> {
        let body = serde_json::to_vec(spec)?;
        let path = format!("/services/{id}/update?version={version}");
        let bytes = self
            .call(Method::POST, &path, Some(body), SERVICE_TIMEOUT)
            .await?;
        if bytes.is_empty() {
            return Ok(Vec::new());
        }
        let response: ServiceUpdateResponse = serde_json::from_slice(&bytes)?;
        Ok(response.warnings)
    }
}
