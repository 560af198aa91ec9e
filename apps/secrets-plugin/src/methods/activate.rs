use crate::methods::entities::{ActivateResponse, PluginJson};
use crate::methods::routes::SECRET_PROVIDER_IMPLEMENTS;

pub async fn activate() -> PluginJson<ActivateResponse> {
    tracing::debug!("plugin activation requested");
    PluginJson(ActivateResponse {
        implements: vec![SECRET_PROVIDER_IMPLEMENTS.to_string()],
    })
}
