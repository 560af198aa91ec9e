use std::collections::BTreeMap;

use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use secrets::SecretRequest;

use crate::methods::routes::PLUGIN_CONTENT_TYPE;

/// Body of `SecretProvider.GetSecret` as the Docker daemon sends it
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct GetSecretRequest {
    pub secret_name: String,
    pub secret_labels: Option<BTreeMap<String, String>>,
    pub service_name: String,
    #[serde(rename = "ServiceID")]
    pub service_id: Option<String>,
    pub service_labels: Option<BTreeMap<String, String>>,
    #[serde(rename = "TaskID")]
    pub task_id: Option<String>,
    pub task_name: Option<String>,
    pub task_image: Option<String>,
}

impl From<GetSecretRequest> for SecretRequest {
    fn from(request: GetSecretRequest) -> Self {
        SecretRequest {
            secret_name: request.secret_name,
            service_name: request.service_name,
            labels: request.secret_labels.unwrap_or_default(),
            service_id: request.service_id.filter(|s| !s.is_empty()),
            task_id: request.task_id.filter(|s| !s.is_empty()),
            task_name: request.task_name.filter(|s| !s.is_empty()),
            task_image: request.task_image.filter(|s| !s.is_empty()),
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct GetSecretResponse {
    /// Base64 of the secret bytes; null on error
    pub value: Option<String>,
    pub err: String,
    pub do_not_reuse: bool,
}

impl GetSecretResponse {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            value: None,
            err: message.into(),
            do_not_reuse: false,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct ActivateResponse {
    pub implements: Vec<String>,
}

/// JSON body tagged with the plugin protocol content type
#[derive(Debug)]
pub struct PluginJson<T>(pub T);

impl<T: Serialize> IntoResponse for PluginJson<T> {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self.0) {
            Ok(body) => ([(header::CONTENT_TYPE, PLUGIN_CONTENT_TYPE)], body).into_response(),
            Err(e) => {
                tracing::error!(error = %e, "failed to encode plugin response");
                let body = format!(r#"{{"Err":"failed to encode response: {e}"}}"#);
                ([(header::CONTENT_TYPE, PLUGIN_CONTENT_TYPE)], body).into_response()
            }
        }
    }
}
