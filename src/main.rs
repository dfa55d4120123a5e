use anyhow::Context;
use userbase::app::Command;
use userbase::{config::Config, db::init_db, SessionFactory, UserService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let command = Command::from_args(std::env::args().skip(1))?;
    let config = Config::from_env().context("Configuration error")?;

    let pool = init_db(&config.database_path, config.max_connections)
        .await
        .context("Failed to initialize database")?;

    let users = UserService::new(SessionFactory::new(pool.clone()));
    command.run(&users).await;

    pool.close().await;
    Ok(())
}
