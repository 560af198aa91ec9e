pub const SERVICE: &str = "secrets-plugin";
pub const ENV: &str = "ENV";

pub const LOCAL_ENV: &str = "local";

// Provider selection
pub const SECRETS_PROVIDER: &str = "SECRETS_PROVIDER";
pub const DEFAULT_PROVIDER: &str = "vault";

// Rotation
pub const SECRETS_ENABLE_ROTATION: &str = "SECRETS_ENABLE_ROTATION";
pub const VAULT_ENABLE_ROTATION: &str = "VAULT_ENABLE_ROTATION";
pub const SECRETS_ROTATION_INTERVAL: &str = "SECRETS_ROTATION_INTERVAL";
pub const VAULT_ROTATION_INTERVAL: &str = "VAULT_ROTATION_INTERVAL";

// Request handling
pub const REQUEST_TIMEOUT_SECS: &str = "REQUEST_TIMEOUT_SECS";
pub const SHUTDOWN_TIMEOUT_SECS: &str = "SHUTDOWN_TIMEOUT_SECS";

// Plugin socket
pub const PLUGIN_SOCKET_PATH: &str = "PLUGIN_SOCKET_PATH";
pub const DEFAULT_SOCKET_PATH: &str = "/run/docker/plugins/secrets-plugin.sock";

// Labels written to swarm objects during rotation
pub const ROTATION_SOURCE_LABEL: &str = "secrets-plugin.rotation-source";
pub const ROTATED_AT_LABEL: &str = "secrets-plugin.rotated-at";
