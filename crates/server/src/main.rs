mod bootstrap;
mod health;

use std::time::Duration;

use anyhow::Result;
use stijnbot_core::config::{AppConfig, LoadOptions};
use tracing::{info, warn};

const DIALOGUE_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

fn init_logging(config: &AppConfig) {
    use stijnbot_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Logging needs the loaded config, so a config error goes straight to stderr.
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;

    health::spawn(
        &app.config.server.bind_address,
        app.config.server.health_check_port,
        app.db_pool.clone(),
        app.session.clone(),
    )
    .await?;

    let runner = app.slack_runner;
    let runner_task = tokio::spawn(async move {
        if let Err(error) = runner.start().await {
            warn!(
                event_name = "system.server.slack_runner_failed",
                correlation_id = "bootstrap",
                error = %error,
                "slack runner stopped with an error"
            );
        }
    });

    let responder = app.responder.clone();
    let sweeper_task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(DIALOGUE_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            match responder.expire_idle_dialogues().await {
                Ok(0) => {}
                Ok(expired) => info!(
                    event_name = "bot.dialogue.swept",
                    correlation_id = "sweeper",
                    expired,
                    "expired idle dialogues"
                ),
                Err(error) => warn!(
                    event_name = "bot.dialogue.sweep_failed",
                    correlation_id = "sweeper",
                    error = %error,
                    "failed to expire idle dialogues"
                ),
            }
        }
    });

    info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bot_name = %app.responder.settings().bot_name,
        "stijnbot started"
    );

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!(
                event_name = "system.server.interrupted",
                correlation_id = "shutdown",
                "received ctrl-c"
            );
        }
        _ = app.shutdown.triggered() => {
            info!(
                event_name = "system.server.shutdown_requested",
                correlation_id = "shutdown",
                "shutdown requested over slack"
            );
        }
    }

    info!(event_name = "system.server.stopping", correlation_id = "shutdown", "stijnbot stopping");
    sweeper_task.abort();
    runner_task.abort();
    app.db_pool.close().await;

    Ok(())
}
