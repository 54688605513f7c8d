use url::Url;

use crate::app::{AppContext, PersistenceError, Result};
use crate::daemon::{Daemon, DaemonConfig};
use crate::store::FeedStore;
use crate::sync::{CancelToken, SyncReport, SyncScope};

pub async fn add_feed(ctx: &AppContext, url: &str) -> Result<()> {
    Url::parse(url)?;

    if ctx.store.get_by_identity(url)?.is_some() {
        println!("Feed already exists: {}", url);
        return Ok(());
    }

    let feed = ctx.sync.sync_one(url).await?;
    println!("Added feed: {}", feed.display_title());
    println!("Fetched {} items", feed.items.len());

    Ok(())
}

pub async fn remove_feed(ctx: &AppContext, url: &str) -> Result<()> {
    if !ctx.sync.delete_feed(url).await? {
        return Err(PersistenceError::FeedNotFound(url.to_string()).into());
    }

    println!("Removed feed: {}", url);
    Ok(())
}

/// Foreground refresh. Ctrl-C abandons feeds still in flight. Failures are
/// summarized in a single line.
pub async fn sync_feeds(ctx: &AppContext, url: Option<&str>) -> Result<()> {
    let scope = match url {
        Some(url) => SyncScope::Single(url.to_string()),
        None => SyncScope::All,
    };

    let cancel = CancelToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let report = ctx.sync.request_sync(scope, None, &cancel).await?;
    interrupt.abort();
    print_report(&report);
    Ok(())
}

fn print_report(report: &SyncReport) {
    if report.succeeded.is_empty() && report.failed.is_empty() && report.is_complete() {
        println!("No feeds to update");
        return;
    }

    for outcome in &report.succeeded {
        if outcome.added > 0 {
            println!(
                "  {} new items from {}",
                outcome.added,
                outcome.feed.display_title()
            );
        }
    }

    println!(
        "Update complete: {} new items, {} feeds refreshed",
        report.new_items(),
        report.succeeded.len()
    );

    if report.has_failures() {
        eprintln!(
            "{} feed(s) could not be refreshed: {}",
            report.failed.len(),
            report
                .failed
                .iter()
                .map(|failure| failure.url.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    if !report.is_complete() {
        eprintln!(
            "{} feed(s) abandoned before finishing",
            report.unfinished.len()
        );
    }
}

pub fn list_feeds(ctx: &AppContext) -> Result<()> {
    let feeds = ctx.store.get_all()?;

    if feeds.is_empty() {
        println!("No feeds");
        return Ok(());
    }

    for feed in feeds {
        let favorite = if feed.is_favorited { "*" } else { " " };
        let notify = if feed.is_notifications_enabled {
            " [notify]"
        } else {
            ""
        };
        println!(
            "{} {} ({} items){}\n    {}",
            favorite,
            feed.display_title(),
            feed.items.len(),
            notify,
            feed.source_url
        );
    }

    Ok(())
}

pub fn list_items(ctx: &AppContext, url: &str) -> Result<()> {
    let feed = ctx
        .store
        .get_by_identity(url)?
        .ok_or_else(|| PersistenceError::FeedNotFound(url.to_string()))?;

    if feed.items.is_empty() {
        println!("No items");
        return Ok(());
    }

    for item in feed.items_in_display_order() {
        let date = item
            .published_at
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "          ".to_string());

        println!("{} {}", date, item.display_title());
    }

    Ok(())
}

pub async fn set_favorite(ctx: &AppContext, url: &str, favorited: bool) -> Result<()> {
    let feed = ctx.sync.set_favorited(url, favorited).await?;
    let state = if feed.is_favorited { "Favorited" } else { "Unfavorited" };
    println!("{}: {}", state, feed.display_title());
    Ok(())
}

pub async fn set_notifications(ctx: &AppContext, url: &str, enabled: bool) -> Result<()> {
    let feed = ctx.sync.set_notifications_enabled(url, enabled).await?;
    let state = if feed.is_notifications_enabled {
        "enabled"
    } else {
        "disabled"
    };
    println!("Notifications {} for {}", state, feed.display_title());
    Ok(())
}

pub async fn run_daemon(ctx: &AppContext, interval: &str, update_on_start: bool) -> Result<()> {
    let update_interval_secs =
        DaemonConfig::parse_interval(interval).map_err(crate::app::FeedwatchError::Other)?;

    let config = DaemonConfig {
        update_interval_secs,
        update_on_start,
        budget: ctx.config.sync.background_budget(),
    };

    Daemon::new(ctx, config).run().await
}
