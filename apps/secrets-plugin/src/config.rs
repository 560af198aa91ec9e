use std::path::PathBuf;
use std::time::Duration;

use secrets::ProviderKind;

use crate::constants::{
    DEFAULT_PROVIDER, DEFAULT_SOCKET_PATH, ENV, PLUGIN_SOCKET_PATH, REQUEST_TIMEOUT_SECS,
    SECRETS_ENABLE_ROTATION, SECRETS_PROVIDER, SECRETS_ROTATION_INTERVAL, SHUTDOWN_TIMEOUT_SECS,
    VAULT_ENABLE_ROTATION, VAULT_ROTATION_INTERVAL,
};

pub const DEFAULT_ROTATION_INTERVAL: Duration = Duration::from_secs(5 * 60);

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse a duration such as `300ms`, `30s`, `5m`, `1h30m` or `1.5h`.
///
/// Units: `ns`, `us` (or `µs`), `ms`, `s`, `m`, `h`. A bare `0` is allowed.
pub fn parse_duration(input: &str) -> Option<Duration> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }
    if s == "0" {
        return Some(Duration::ZERO);
    }

    let mut total = 0f64;
    let mut rest = s;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_len == 0 {
            return None;
        }
        let value: f64 = rest[..number_len].parse().ok()?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let nanos_per_unit = match &rest[..unit_len] {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            _ => return None,
        };
        rest = &rest[unit_len..];
        total += value * nanos_per_unit;
    }

    Some(Duration::from_nanos(total as u64))
}

/// [`parse_duration`] falling back to five minutes when the value is absent,
/// unparsable, or zero.
pub fn parse_duration_or_default(input: Option<&str>) -> Duration {
    match input.and_then(parse_duration) {
        Some(d) if !d.is_zero() => d,
        Some(_) => {
            tracing::warn!("rotation interval must be positive, using default");
            DEFAULT_ROTATION_INTERVAL
        }
        None => {
            if let Some(raw) = input {
                tracing::warn!(value = %raw, "invalid rotation interval, using default");
            }
            DEFAULT_ROTATION_INTERVAL
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Settings the driver needs at runtime
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub enable_rotation: bool,
    pub rotation_interval: Duration,
    pub request_timeout: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            enable_rotation: true,
            rotation_interval: DEFAULT_ROTATION_INTERVAL,
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PluginConfig {
    pub provider: String,
    pub driver: DriverConfig,
    pub socket_path: PathBuf,
    pub shutdown_timeout: Duration,
    pub env: String,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            driver: DriverConfig::default(),
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            shutdown_timeout: Duration::from_secs(30),
            env: "production".to_string(),
        }
    }
}

impl PluginConfig {
    pub fn from_env() -> Self {
        let default = Self::default();

        let enable_rotation = env_var(SECRETS_ENABLE_ROTATION)
            .or_else(|| env_var(VAULT_ENABLE_ROTATION))
            .and_then(|v| parse_bool(&v))
            .unwrap_or(default.driver.enable_rotation);

        let interval = env_var(SECRETS_ROTATION_INTERVAL).or_else(|| env_var(VAULT_ROTATION_INTERVAL));
        let rotation_interval = parse_duration_or_default(interval.as_deref());

        let request_timeout_secs: u64 = env_var(REQUEST_TIMEOUT_SECS)
            .and_then(|v| v.parse().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(30);

        let shutdown_timeout_secs: u64 = env_var(SHUTDOWN_TIMEOUT_SECS)
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        Self {
            provider: env_var(SECRETS_PROVIDER).unwrap_or(default.provider),
            driver: DriverConfig {
                enable_rotation,
                rotation_interval,
                request_timeout: Duration::from_secs(request_timeout_secs),
            },
            socket_path: env_var(PLUGIN_SOCKET_PATH)
                .map(PathBuf::from)
                .unwrap_or(default.socket_path),
            shutdown_timeout: Duration::from_secs(shutdown_timeout_secs),
            env: env_var(ENV).unwrap_or(default.env),
        }
    }

    pub fn provider_kind(&self) -> Result<ProviderKind, secrets::SecretsError> {
        self.provider.parse()
    }
}
