use std::sync::Arc;

use anyhow::Context;
use db::DBService;
use server::AppState;
use services::services::{config::Config, webhook::MessageSentWebhook};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    utils::logging::init_tracing();

    let config = Config::from_env()?;
    let db = DBService::new(&config.database_url)
        .await
        .with_context(|| format!("opening database {}", config.database_url))?;

    let webhook = MessageSentWebhook::new(config.webhook_url_message_sent.as_deref())?;
    if !webhook.is_enabled() {
        warn!("WEBHOOK_URL_MESSAGE_SENT not set, outgoing chat notifications are disabled");
    }

    let app = server::app(AppState::new(db, Arc::new(webhook)));

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
    }
}
