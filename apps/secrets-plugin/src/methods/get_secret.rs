use axum::body::Bytes;
use axum::extract::State;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use secrecy::ExposeSecret;

use secrets::SecretRequest;

use crate::methods::entities::{GetSecretRequest, GetSecretResponse, PluginJson};
use crate::state::AppState;

/// The daemon reads failures from `Err`, so every outcome is a 200.
pub async fn get_secret(
    State(state): State<AppState>,
    body: Bytes,
) -> PluginJson<GetSecretResponse> {
    let request: GetSecretRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(error = %e, "malformed GetSecret request");
            return PluginJson(GetSecretResponse::error(format!("invalid request body: {e}")));
        }
    };
    let request = SecretRequest::from(request);

    match state.driver.get(&request).await {
        Ok(response) => PluginJson(GetSecretResponse {
            value: Some(STANDARD.encode(response.value.expose_secret())),
            err: String::new(),
            do_not_reuse: response.do_not_reuse,
        }),
        Err(e) => {
            tracing::error!(secret = %request.secret_name, error = %e, "GetSecret failed");
            PluginJson(GetSecretResponse::error(e.to_string()))
        }
    }
}
