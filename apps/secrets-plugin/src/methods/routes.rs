// Docker plugin protocol endpoints
pub const ACTIVATE_PATH: &str = "/Plugin.Activate";
pub const GET_SECRET_PATH: &str = "/SecretProvider.GetSecret";

/// Content type every plugin response carries
pub const PLUGIN_CONTENT_TYPE: &str = "application/vnd.docker.plugins.v1.2+json";

/// Subsystem announced during activation
pub const SECRET_PROVIDER_IMPLEMENTS: &str = "secretprovider";
