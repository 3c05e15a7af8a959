use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use promptgate_gateway::{server, spawn_template_watcher, GatewayState};
use promptgate_template::TemplateStore;
use promptgate_upstream::UpstreamClient;

#[tokio::main]
async fn main() -> Result<()> {
    let settings_path = promptgate_config::settings_path();
    let config = promptgate_config::load_and_validate(&settings_path).await?;

    promptgate_logging::init_logger(&config.log_level.0);

    info!(app = %config.app_name.0, "Starting up");
    info!(
        host = %config.server.host,
        port = config.server.port,
        "Listener configuration"
    );
    info!(
        with_input = %config.proxy.template_with_input,
        without_input = %config.proxy.template_without_input,
        "Template files"
    );
    info!(
        enabled = config.proxy.fake_streaming.enabled,
        heartbeat_secs = config.proxy.fake_streaming.heartbeat_interval_secs,
        "Fake streaming"
    );
    info!(
        timeout_secs = config.proxy.upstream_timeout_secs,
        "Upstream request timeout"
    );

    let templates = Arc::new(
        TemplateStore::open(
            config.proxy.template_with_input.clone(),
            config.proxy.template_without_input.clone(),
        )
        .await
        .context("Failed to load prompt templates")?,
    );
    spawn_template_watcher(templates.clone()).context("Failed to watch template files")?;

    let user_agent = format!("{}/{}", config.app_name.0, env!("CARGO_PKG_VERSION"));
    let backend = Arc::new(UpstreamClient::new(
        config.proxy.upstream_timeout_secs,
        &user_agent,
    )?);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server host/port")?;

    let state = GatewayState {
        config: Arc::new(config),
        templates,
        backend,
    };

    server::start_server(addr, state).await
}
