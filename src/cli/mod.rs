pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "feedwatch")]
#[command(about = "Keeps RSS/Atom subscriptions in sync and flags new articles", long_about = None)]
pub struct Cli {
    /// Number of parallel workers for fetching feeds (overrides config)
    #[arg(short, long, global = true)]
    pub workers: Option<usize>,

    /// Database path (default: platform data directory)
    #[arg(long, global = true)]
    pub db: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Subscribe to a feed and fetch it once
    Add {
        /// URL of the feed to add
        url: String,
    },
    /// Remove a feed and all its items
    Remove {
        /// URL of the feed to remove
        url: String,
    },
    /// Refresh one feed, or all feeds when no URL is given
    Sync {
        /// URL of a single feed to refresh
        url: Option<String>,
    },
    /// List feeds, or the items of one feed
    List {
        /// Show the items of this feed
        #[arg(long)]
        items: Option<String>,
    },
    /// Mark or unmark a feed as favorite
    Favorite {
        url: String,
        /// Remove the favorite mark
        #[arg(long)]
        off: bool,
    },
    /// Enable or disable new-article notifications for a feed
    Notifications {
        url: String,
        /// Disable notifications
        #[arg(long)]
        off: bool,
    },
    /// Run periodic background syncs until interrupted
    Daemon {
        /// Update interval (e.g., "1h", "30m", "6h", "1d")
        #[arg(short, long, default_value = "1h")]
        interval: String,

        /// Skip initial update on start
        #[arg(long)]
        no_initial_update: bool,
    },
}
