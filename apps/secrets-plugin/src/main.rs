use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Arg, ArgAction, Command};
use tokio::net::UnixListener;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use secrets::{create_provider, ProviderConfig};
use swarm_lib::{DockerClient, OrchestratorClient};

use secrets_plugin::config::PluginConfig;
use secrets_plugin::constants::{LOCAL_ENV, SERVICE};
use secrets_plugin::driver::Driver;
use secrets_plugin::methods::router;
use secrets_plugin::shutdown::shutdown_signal;
use secrets_plugin::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let matches = Command::new(SERVICE)
        .about("Docker Swarm secrets plugin with automatic rotation")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("debug")
                .long("debug")
                .action(ArgAction::SetTrue)
                .help("Enable debug logging"),
        )
        .arg(
            Arg::new("socket")
                .long("socket")
                .value_name("PATH")
                .help("Unix socket to serve the plugin API on"),
        )
        .get_matches();

    let mut config = PluginConfig::from_env();
    if let Some(socket) = matches.get_one::<String>("socket") {
        config.socket_path = PathBuf::from(socket);
    }

    // Setup tracing subscriber
    let default_level = if matches.get_flag("debug") { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(filter);

    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true);

    if config.env == LOCAL_ENV {
        let pretty_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .pretty();
        registry.with(json_layer).with(pretty_layer).init();
    } else {
        registry.with(json_layer).init();
    }

    tracing::info!(service = SERVICE, env = %config.env, "tracing initialized");

    let kind = config.provider_kind()?;
    tracing::info!(
        provider = %kind,
        backend = kind.info().name,
        rotation = config.driver.enable_rotation,
        rotation_interval_secs = config.driver.rotation_interval.as_secs(),
        request_timeout_secs = config.driver.request_timeout.as_secs(),
        "plugin configuration loaded"
    );

    let provider = create_provider(ProviderConfig::from_env(kind))
        .await
        .map_err(|e| format!("Failed to initialize {} provider: {}", kind, e))?;

    let docker = DockerClient::from_env()?;
    let orchestrator: Arc<dyn OrchestratorClient> = Arc::new(docker);

    let driver = Arc::new(Driver::new(provider, orchestrator, config.driver.clone()));
    driver.start().await;

    let listener = bind_socket(&config.socket_path)?;
    tracing::info!(
        "{} is ready to accept requests at: {}",
        SERVICE,
        config.socket_path.display()
    );

    let app = router(AppState::new(Arc::clone(&driver)));
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.shutdown_timeout))
        .await;

    if tokio::time::timeout(config.shutdown_timeout, driver.stop())
        .await
        .is_err()
    {
        tracing::warn!(
            timeout_secs = config.shutdown_timeout.as_secs(),
            "driver did not stop in time"
        );
    }
    if let Err(e) = std::fs::remove_file(&config.socket_path) {
        tracing::debug!(error = %e, "socket file not removed");
    }

    served.map_err(|e| format!("Server error: {}", e))?;
    Ok(())
}

/// Bind the plugin socket, replacing a stale file left by a previous run.
fn bind_socket(path: &Path) -> Result<UnixListener, String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create {}: {}", parent.display(), e))?;
    }
    if path.exists() {
        std::fs::remove_file(path)
            .map_err(|e| format!("Failed to remove stale socket {}: {}", path.display(), e))?;
    }
    UnixListener::bind(path).map_err(|e| format!("Failed to bind to {}: {}", path.display(), e))
}
