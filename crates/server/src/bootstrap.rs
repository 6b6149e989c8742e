use std::sync::Arc;

use stijnbot_core::clock::SystemClock;
use stijnbot_core::config::{AppConfig, ConfigError, LoadOptions};
use stijnbot_core::router::RouterError;
use stijnbot_db::{connect_with_settings, migrations, DbPool, SqlUserRepository};
use stijnbot_slack::api::{HttpSlackApi, SlackApi, SlackApiError};
use stijnbot_slack::socket::{NoopSocketTransport, ReconnectPolicy, SocketModeRunner};
use stijnbot_slack::{
    local_hostname, message_dispatcher, BotSession, Responder, ResponderSettings, ShutdownSignal,
};
use thiserror::Error;
use tracing::{info, warn};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub session: Arc<BotSession>,
    pub responder: Arc<Responder>,
    pub shutdown: ShutdownSignal,
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
    #[error("could not authenticate with slack: {0}")]
    SlackAuth(#[source] SlackApiError),
    #[error(transparent)]
    Router(#[from] RouterError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    let api = Arc::new(HttpSlackApi::new(
        config.slack.api_base_url.clone(),
        config.slack.bot_token.clone(),
    ));
    bootstrap_with_api(config, api).await
}

pub async fn bootstrap_with_api(
    config: AppConfig,
    api: Arc<dyn SlackApi>,
) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let identity = api.bot_identity().await.map_err(BootstrapError::SlackAuth)?;
    let member_count = match api.count_members().await {
        Ok(count) => count,
        Err(error) => {
            warn!(
                event_name = "system.bootstrap.member_count_failed",
                correlation_id = "bootstrap",
                error = %error,
                "could not count workspace members; team tally will report zero unknown"
            );
            0
        }
    };
    info!(
        event_name = "system.bootstrap.slack_identified",
        correlation_id = "bootstrap",
        bot_user_id = %identity.user_id,
        bot_name = %identity.name,
        member_count,
        "connected to slack"
    );

    let session = Arc::new(BotSession::new(member_count));
    let shutdown = ShutdownSignal::new();
    let settings = ResponderSettings::new(&config.bot, &identity, local_hostname());
    let responder = Arc::new(Responder::new(
        api,
        Arc::new(SqlUserRepository::new(db_pool.clone())),
        session.clone(),
        Arc::new(SystemClock),
        shutdown.clone(),
        settings,
    )?);

    let slack_runner = SocketModeRunner::new(
        Arc::new(NoopSocketTransport),
        message_dispatcher(responder.clone()),
        ReconnectPolicy::default(),
    );

    Ok(Application { config, db_pool, session, responder, shutdown, slack_runner })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use stijnbot_core::config::{AppConfig, ConfigOverrides, LoadOptions};
    use stijnbot_core::domain::user::UserId;
    use stijnbot_db::{SqlUserRepository, UserRepository};
    use stijnbot_slack::events::MessageService;
    use stijnbot_slack::{BotIdentity, EventContext, MessageEvent, RecordingSlackApi};

    use crate::bootstrap::{bootstrap, bootstrap_with_api};

    fn test_config() -> AppConfig {
        AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                slack_bot_token: Some("xoxb-test".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .expect("valid test config")
    }

    fn recording_api(member_count: usize) -> Arc<RecordingSlackApi> {
        Arc::new(RecordingSlackApi::new(
            BotIdentity { user_id: "UBOT".to_owned(), name: "stijnbot".to_owned() },
            member_count,
        ))
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_with_malformed_bot_token() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                slack_bot_token: Some("not-a-bot-token".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        let message = result.err().expect("bootstrap must fail").to_string();
        assert!(message.contains("slack.bot_token"));
    }

    #[tokio::test]
    async fn bootstrap_wires_store_session_and_identity() {
        let app = bootstrap_with_api(test_config(), recording_api(12))
            .await
            .expect("bootstrap should succeed");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'user_record'",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("user_record table should exist after bootstrap");
        assert_eq!(table_count, 1);

        assert_eq!(app.session.member_count(), 12);
        assert_eq!(app.responder.settings().bot_user_id, "UBOT");
        assert!(!app.shutdown.is_triggered());

        app.db_pool.close().await;
    }

    #[tokio::test]
    async fn nickname_reaches_the_sqlite_store() {
        let api = recording_api(3);
        let app = bootstrap_with_api(test_config(), api.clone()).await.expect("bootstrap");
        let event = MessageEvent {
            channel_id: "D1".to_owned(),
            channel_type: "im".to_owned(),
            user_id: "U1".to_owned(),
            text: "my name is Sam".to_owned(),
            ts: "1730000000.0001".to_owned(),
            bot_id: None,
        };

        app.responder.handle_message(&event, &EventContext::default()).await.expect("handled");

        let stored = SqlUserRepository::new(app.db_pool.clone())
            .find_by_id(&UserId::new("U1"))
            .await
            .expect("read back");
        assert_eq!(stored.and_then(|record| record.name), Some("Sam".to_owned()));
        assert_eq!(api.messages_in("D1").await, vec!["Got it. I will call you Sam from now on."]);

        app.db_pool.close().await;
    }
}
