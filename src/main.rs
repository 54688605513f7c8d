use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use feedwatch::app::AppContext;
use feedwatch::cli::{commands, Cli, Commands};
use feedwatch::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(workers) = cli.workers {
        config.sync.workers = workers.max(1);
    }
    let ctx = AppContext::new(cli.db, config)?;

    match cli.command {
        Commands::Add { url } => {
            commands::add_feed(&ctx, &url).await?;
        }
        Commands::Remove { url } => {
            commands::remove_feed(&ctx, &url).await?;
        }
        Commands::Sync { url } => {
            commands::sync_feeds(&ctx, url.as_deref()).await?;
        }
        Commands::List { items } => match items {
            Some(url) => commands::list_items(&ctx, &url)?,
            None => commands::list_feeds(&ctx)?,
        },
        Commands::Favorite { url, off } => {
            commands::set_favorite(&ctx, &url, !off).await?;
        }
        Commands::Notifications { url, off } => {
            commands::set_notifications(&ctx, &url, !off).await?;
        }
        Commands::Daemon {
            interval,
            no_initial_update,
        } => {
            commands::run_daemon(&ctx, &interval, !no_initial_update).await?;
        }
    }

    Ok(())
}
