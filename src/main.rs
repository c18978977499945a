use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use reelbase::config::AppConfig;
use reelbase::database::DatabaseManager;
use reelbase::mailer::SmtpMailer;
use reelbase::server;
use reelbase::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SMTP_*, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_args();
    tracing::info!("Starting Reelbase API in {} mode", config.environment);

    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to open database pool")?;

    if config.database.migrate {
        DatabaseManager::migrate(&pool)
            .await
            .context("failed to apply migrations")?;
    }

    let mailer = SmtpMailer::new(&config.smtp).context("invalid SMTP configuration")?;

    let state = AppState::new(config, pool, Arc::new(mailer));
    state.limiter.spawn_sweeper();

    server::serve(state).await?;
    Ok(())
}
