mod bootstrap;
mod health;

use std::time::Duration;

use anyhow::Result;
use reviewdesk_core::config::{AppConfig, LoadOptions};
use tracing_subscriber::EnvFilter;

fn init_logging(config: &AppConfig) {
    use reviewdesk_core::config::LogFormat::*;

    let filter = EnvFilter::try_new(&config.logging.level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_target(false).with_env_filter(filter);

    match config.logging.format {
        Compact => builder.compact().init(),
        Pretty => builder.pretty().init(),
        Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;

    health::spawn(
        &app.config.server.bind_address,
        app.config.server.health_check_port,
        app.db_pool.clone(),
    )
    .await?;

    let runner = app.slack_runner;
    let mut slack_task = tokio::spawn(async move { runner.start().await });

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        default_review_hours = ?app.scheduling.default_review_hours(),
        "reviewdesk-server started"
    );

    tokio::select! {
        signal = tokio::signal::ctrl_c() => signal?,
        finished = &mut slack_task => {
            finished??;
            tracing::info!(
                event_name = "system.server.slack_runner_finished",
                correlation_id = "bootstrap",
                "slack runner finished; waiting for shutdown signal"
            );
            tokio::signal::ctrl_c().await?;
        }
    }

    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        grace_secs = app.config.server.graceful_shutdown_secs,
        "reviewdesk-server stopping"
    );
    if !slack_task.is_finished() {
        let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
        if tokio::time::timeout(grace, &mut slack_task).await.is_err() {
            slack_task.abort();
        }
    }
    app.db_pool.close().await;

    Ok(())
}
