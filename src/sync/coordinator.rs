use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;

use crate::app::{FetchError, PersistenceError, SyncError};
use crate::domain::{FeedDocument, FeedRecord};
use crate::fetcher::Fetcher;
use crate::notify::{NotificationDecider, NotificationRequest, Notifier};
use crate::store::FeedStore;
use crate::sync::cancel::CancelToken;
use crate::sync::locks::FeedLocks;
use crate::sync::reconcile::reconcile;
use crate::sync::report::{FeedFailure, FeedOutcome, SyncReport};

pub const DEFAULT_WORKERS: usize = 8;

/// Which feeds a trigger asks to refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncScope {
    All,
    Single(String),
}

struct Shared<S> {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    store: Arc<S>,
    notifier: Arc<dyn Notifier + Send + Sync>,
    decider: NotificationDecider,
    semaphore: Semaphore,
    locks: FeedLocks,
}

/// Drives fetch, reconcile, persist and notify for sets of feeds.
///
/// Fetches run concurrently up to the worker limit. Reconcile and persist
/// for one feed identity are serialized through [`FeedLocks`]; different
/// feeds write independently. Cloning is cheap and shares all state.
///
/// Each trigger passes its own [`CancelToken`], so abandoning one trigger
/// never affects another.
pub struct SyncCoordinator<S> {
    shared: Arc<Shared<S>>,
}

impl<S> Clone for SyncCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<S: FeedStore + Send + Sync + 'static> SyncCoordinator<S> {
    pub fn new(
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        store: Arc<S>,
        notifier: Arc<dyn Notifier + Send + Sync>,
        decider: NotificationDecider,
    ) -> Self {
        Self::with_workers(fetcher, store, notifier, decider, DEFAULT_WORKERS)
    }

    pub fn with_workers(
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        store: Arc<S>,
        notifier: Arc<dyn Notifier + Send + Sync>,
        decider: NotificationDecider,
        workers: usize,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                fetcher,
                store,
                notifier,
                decider,
                semaphore: Semaphore::new(workers.max(1)),
                locks: FeedLocks::new(),
            }),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.shared.store
    }

    /// Fetches, reconciles and persists a single feed.
    pub async fn sync_one(&self, url: &str) -> Result<FeedRecord, SyncError> {
        self.sync_one_cancellable(url, &CancelToken::new()).await
    }

    /// Like [`sync_one`](Self::sync_one), but gives up with
    /// [`SyncError::Cancelled`] if `cancel` fires before the fetch returns.
    pub async fn sync_one_cancellable(
        &self,
        url: &str,
        cancel: &CancelToken,
    ) -> Result<FeedRecord, SyncError> {
        self.run_pipeline(url, cancel).await.map(|outcome| outcome.feed)
    }

    /// Fetches every feed concurrently. Failed fetches are logged and left
    /// out of the result; the batch itself never fails.
    ///
    /// Fetches still in flight when `cancel` fires are dropped and likewise
    /// left out. Cancel the token on a timer to impose a budget.
    pub async fn sync_many(
        &self,
        feeds: &[FeedRecord],
        cancel: &CancelToken,
    ) -> Vec<(String, FeedDocument)> {
        let mut handles = Vec::with_capacity(feeds.len());

        for feed in feeds {
            let this = self.clone();
            let cancel = cancel.clone();
            let url = feed.source_url.clone();
            handles.push(tokio::spawn(async move {
                let result = tokio::select! {
                    result = this.fetch(&url) => Some(result),
                    _ = cancel.cancelled() => None,
                };
                (url, result)
            }));
        }

        let mut documents = Vec::new();
        for joined in futures::future::join_all(handles).await {
            match joined {
                Ok((url, Some(Ok(document)))) => documents.push((url, document)),
                Ok((url, Some(Err(e)))) => {
                    tracing::warn!(feed = %url, error = %e, "feed fetch failed");
                }
                Ok((url, None)) => {
                    tracing::debug!(feed = %url, "feed fetch cancelled");
                }
                Err(e) => {
                    tracing::error!("Task join error: {}", e);
                }
            }
        }

        documents
    }

    /// Runs full pipelines for `urls` concurrently.
    ///
    /// Returns once every feed has finished, the budget has elapsed, or
    /// `cancel` fired. Feeds still running at that point are abandoned and
    /// listed as unfinished. Notifications for feeds that were already
    /// persisted are delivered regardless.
    pub async fn sync_feeds(
        &self,
        urls: Vec<String>,
        budget: Option<Duration>,
        cancel: &CancelToken,
    ) -> SyncReport {
        let started = Instant::now();
        let deadline = budget.map(|budget| started + budget);
        let mut report = SyncReport::default();

        let mut pending: HashSet<String> = HashSet::new();
        let mut tasks = JoinSet::new();
        for url in urls {
            if !pending.insert(url.clone()) || cancel.is_cancelled() {
                continue;
            }
            let this = self.clone();
            let cancel = cancel.clone();
            tasks.spawn(async move {
                let result = this.run_pipeline(&url, &cancel).await;
                (url, result)
            });
        }

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    report.cancelled = true;
                    break;
                }
                _ = sleep_until(deadline) => {
                    report.timed_out = true;
                    break;
                }
                joined = tasks.join_next() => match joined {
                    None => break,
                    Some(Ok((url, result))) => {
                        pending.remove(&url);
                        match result {
                            Ok(outcome) => report.succeeded.push(outcome),
                            Err(error) => {
                                tracing::warn!(feed = %url, error = %error, "feed sync failed");
                                report.failed.push(FeedFailure { url, error });
                            }
                        }
                    }
                    Some(Err(e)) => {
                        tracing::error!("Task join error: {}", e);
                    }
                },
            }
        }

        tasks.abort_all();
        report.unfinished = pending.into_iter().collect();
        report.unfinished.sort();
        report.elapsed = started.elapsed();

        tracing::info!(
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            unfinished = report.unfinished.len(),
            new_items = report.new_items(),
            notifications = report.notifications(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "sync cycle finished"
        );

        report
    }

    /// Entry point for refresh triggers.
    pub async fn request_sync(
        &self,
        scope: SyncScope,
        budget: Option<Duration>,
        cancel: &CancelToken,
    ) -> Result<SyncReport, PersistenceError> {
        let urls = match scope {
            SyncScope::All => self.shared.store.identities()?,
            SyncScope::Single(identity) => vec![identity],
        };

        Ok(self.sync_feeds(urls, budget, cancel).await)
    }

    pub async fn set_favorited(
        &self,
        identity: &str,
        favorited: bool,
    ) -> Result<FeedRecord, PersistenceError> {
        self.update_flags(identity, |feed| feed.is_favorited = favorited)
            .await
    }

    pub async fn set_notifications_enabled(
        &self,
        identity: &str,
        enabled: bool,
    ) -> Result<FeedRecord, PersistenceError> {
        self.update_flags(identity, |feed| feed.is_notifications_enabled = enabled)
            .await
    }

    pub async fn delete_feed(&self, identity: &str) -> Result<bool, PersistenceError> {
        let _guard = self.shared.locks.acquire(identity).await;
        self.shared.store.delete(identity)
    }

    async fn update_flags<F>(&self, identity: &str, apply: F) -> Result<FeedRecord, PersistenceError>
    where
        F: FnOnce(&mut FeedRecord),
    {
        let _guard = self.shared.locks.acquire(identity).await;

        let mut feed = self
            .shared
            .store
            .get_by_identity(identity)?
            .ok_or_else(|| PersistenceError::FeedNotFound(identity.to_string()))?;
        apply(&mut feed);
        self.shared.store.upsert(&feed)?;

        Ok(feed)
    }

    async fn fetch(&self, url: &str) -> Result<FeedDocument, FetchError> {
        // The semaphore is never closed.
        let _permit = self.shared.semaphore.acquire().await.ok();
        self.shared.fetcher.fetch(url).await
    }

    async fn run_pipeline(&self, url: &str, cancel: &CancelToken) -> Result<FeedOutcome, SyncError> {
        let document = tokio::select! {
            result = self.fetch(url) => result?,
            _ = cancel.cancelled() => return Err(SyncError::Cancelled),
        };

        let (mut outcome, delivery) = {
            let _guard = self.shared.locks.acquire(url).await;

            let existing = self.shared.store.get_by_identity(url)?;
            let before = existing
                .as_ref()
                .map(|feed| feed.items.clone())
                .unwrap_or_default();

            let reconciled = reconcile(existing.as_ref(), &document, url);
            self.shared.store.upsert(&reconciled.feed)?;

            let notifications =
                self.shared
                    .decider
                    .decide(&before, &reconciled.feed.items, &reconciled.feed);
            // No await between persist and hand-off: once the items are
            // stored, their notification outlives this task.
            let delivery = self.deliver(url, notifications);

            tracing::debug!(
                feed = %url,
                added = reconciled.added.len(),
                total = reconciled.feed.items.len(),
                "feed reconciled"
            );

            let outcome = FeedOutcome {
                added: reconciled.added.len(),
                notified: 0,
                feed: reconciled.feed,
            };
            (outcome, delivery)
        };

        if let Some(delivery) = delivery {
            match delivery.await {
                Ok(delivered) => outcome.notified = delivered,
                Err(e) => tracing::error!(feed = %url, "notification task failed: {}", e),
            }
        }

        Ok(outcome)
    }

    /// Schedules `requests` on a detached task. Returns how many the
    /// notifier accepted, or `None` when there was nothing to send.
    fn deliver(&self, url: &str, requests: Vec<NotificationRequest>) -> Option<JoinHandle<usize>> {
        if requests.is_empty() {
            return None;
        }

        let notifier = self.shared.notifier.clone();
        let url = url.to_string();
        Some(tokio::spawn(async move {
            let mut delivered = 0;
            for request in requests {
                match notifier.schedule(request).await {
                    Ok(()) => delivered += 1,
                    Err(e) => tracing::warn!(feed = %url, error = %e, "notification failed"),
                }
            }
            delivered
        }))
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
