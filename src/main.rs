//! # Maré API Main Entry Point

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mare::{
    config::ConfigLoader,
    db::{init_pool, run_migrations},
    seeds::seed_demo,
    server::run_server,
    telemetry::init_tracing,
};

#[derive(Debug, Parser)]
#[command(name = "mare", version, about = "Maré business management API")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start the HTTP server (default)
    Serve,
    /// Apply pending database migrations and exit
    Migrate,
    /// Apply migrations and load the demo workspace
    Seed,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::new()
        .load()
        .context("loading configuration")?;
    init_tracing(&config).context("initializing telemetry")?;

    if let Ok(redacted_json) = config.redacted_json() {
        tracing::info!(profile = %config.profile, config = %redacted_json, "Loaded configuration");
    }

    let db = init_pool(&config)
        .await
        .context("initializing database connection pool")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            if config.run_migrations {
                run_migrations(&db).await?;
            }
            run_server(config, db).await
        }
        Command::Migrate => run_migrations(&db).await,
        Command::Seed => {
            run_migrations(&db).await?;
            seed_demo(&db).await?;
            Ok(())
        }
    }
}
