use std::sync::Arc;

use reviewdesk_core::codec::ActionInfoCodec;
use reviewdesk_core::config::{AppConfig, ConfigError};
use reviewdesk_core::errors::DomainError;
use reviewdesk_core::scheduling::SchedulingService;
use reviewdesk_db::repositories::{SqlChallengeRepository, SqlReviewerRepository};
use reviewdesk_db::{connect_with_config, migrations, DbPool};
use reviewdesk_slack::events::interaction_dispatcher;
use reviewdesk_slack::schedule::ScheduleInteractions;
use reviewdesk_slack::socket::{
    NoopResponseSink, NoopSocketTransport, ReconnectPolicy, SocketModeRunner,
};
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub scheduling: SchedulingService,
    pub slack_runner: SocketModeRunner,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("scheduling setup failed: {0}")]
    Scheduling(#[source] DomainError),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool =
        connect_with_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        max_connections = config.database.max_connections,
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let codec = ActionInfoCodec::new(config.scheduling.action_secret.expose_secret().as_bytes())
        .map_err(BootstrapError::Scheduling)?;
    let scheduling = SchedulingService::new(
        Arc::new(SqlReviewerRepository::new(db_pool.clone())),
        Arc::new(SqlChallengeRepository::new(db_pool.clone())),
        codec,
    )
    .with_default_review_hours(&config.scheduling.default_review_hours)
    .map_err(BootstrapError::Scheduling)?;
    info!(
        event_name = "system.bootstrap.scheduling_ready",
        correlation_id = "bootstrap",
        default_review_hours = ?scheduling.default_review_hours(),
        "scheduling service wired"
    );

    let dispatcher = interaction_dispatcher(ScheduleInteractions::new(scheduling.clone()));
    let slack_runner = SocketModeRunner::new(
        Arc::new(NoopSocketTransport),
        dispatcher,
        Arc::new(NoopResponseSink),
        ReconnectPolicy::default(),
    );

    Ok(Application { config, db_pool, scheduling, slack_runner })
}
