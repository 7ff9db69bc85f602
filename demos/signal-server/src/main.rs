use anyhow::Context;
use axum::{Router, routing::get};
use meshestra_cfn_signal::prelude::*;
use serde::Deserialize;

/// Application config, read from the JSON file named by `APP_CONFIG`.
///
/// Without `APP_CONFIG` the signal settings come from `CFN_SIGNAL_*` variables.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppConfig {
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default)]
    cf_signal: SignalConfig,
}

fn default_port() -> u16 {
    3000
}

impl HasSignalConfig for AppConfig {
    fn signal_config(&self) -> &SignalConfig {
        &self.cf_signal
    }
}

impl AppConfig {
    fn load() -> anyhow::Result<Self> {
        match std::env::var("APP_CONFIG") {
            Ok(path) => {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file {}", path))?;
                serde_json::from_str(&raw).with_context(|| format!("Invalid config file {}", path))
            }
            Err(_) => {
                let env = ConfigService::from_env();
                let port = env
                    .get_non_blank("PORT")
                    .map(|p| p.parse::<u16>())
                    .transpose()
                    .context("PORT must be a port number")?
                    .unwrap_or_else(default_port);
                Ok(Self {
                    port,
                    cf_signal: SignalConfig::from_config_service(&env)?,
                })
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    tracing::info!("Starting signal server...");

    let config = AppConfig::load()?;

    // 1. Let bundles register their listeners before anything starts
    let mut lifecycle = LifecycleEnvironment::new();
    SignalBundle::new().run(&config, &mut lifecycle).await?;
    let lifecycle = Arc::new(lifecycle);

    // 2. Startup: binding the port is what decides SUCCESS or FAILURE
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = lifecycle
        .run_startup(tokio::net::TcpListener::bind(&addr))
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Server running on http://127.0.0.1:{}", config.port);

    let router = Router::new().route("/health", get(|| async { "ok" }));

    // 3. Serve until SIGINT/SIGTERM, then walk the lifecycle to stopped
    let shutdown_handler = ShutdownHandler::new(Arc::clone(&lifecycle));
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown_handler.wait_for_shutdown().await })
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}
