//! # feedwatch
//!
//! Feed synchronization and change detection for an RSS reader.
//!
//! ## Architecture
//!
//! ```text
//! trigger → SyncCoordinator → Fetcher → reconcile → FeedStore → NotificationDecider → Notifier
//! ```
//!
//! - [`fetcher`]: turns a URL into a [`FeedDocument`](domain::FeedDocument)
//! - [`sync`]: reconciliation engine and the concurrent sync coordinator
//! - [`store`]: persistence of feeds and items, with a change stream
//! - [`notify`]: decides and schedules "new articles" notifications
//!
//! ## Quick Start
//!
//! ```bash
//! # Subscribe to a feed
//! feedwatch add https://blog.rust-lang.org/feed.xml
//!
//! # Get notified when it publishes
//! feedwatch notifications https://blog.rust-lang.org/feed.xml
//!
//! # Refresh everything
//! feedwatch sync
//!
//! # Refresh hourly in the background
//! feedwatch daemon --interval 1h
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the store,
/// fetcher, notifier and sync coordinator.
pub mod app;

/// Command-line interface using clap.
///
/// - `add <url>` / `remove <url>`
/// - `sync [url]` - Refresh one or all feeds
/// - `list [--items <url>]`
/// - `favorite <url> [--off]` / `notifications <url> [--off]`
/// - `daemon [--interval 1h]`
pub mod cli;

/// Configuration loaded from `~/.config/feedwatch/config.toml`.
pub mod config;

/// Periodic background sync with a per-cycle time budget.
pub mod daemon;

/// Core domain models.
///
/// - [`FeedRecord`](domain::FeedRecord): a stored feed, identified by its URL
/// - [`ItemRecord`](domain::ItemRecord): one article, identified by GUID
/// - [`FeedDocument`](domain::FeedDocument): a freshly parsed remote feed
pub mod domain;

/// Feed fetching.
///
/// - [`Fetcher`](fetcher::Fetcher): async trait for the fetch collaborator
/// - [`HttpFetcher`](fetcher::http_fetcher::HttpFetcher): reqwest-based implementation
pub mod fetcher;

/// Converts RSS 0.9x/1.0/2.0, Atom and JSON Feed bytes into
/// [`FeedDocument`](domain::FeedDocument)s via feed-rs.
pub mod normalizer;

/// New-article detection and the notifier collaborator.
pub mod notify;

/// Feed persistence.
///
/// - [`FeedStore`](store::FeedStore): trait defining storage operations
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;

/// Reconciliation and sync coordination.
pub mod sync;
