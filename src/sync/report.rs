use std::time::Duration;

use crate::app::SyncError;
use crate::domain::FeedRecord;

/// A feed whose pipeline completed.
#[derive(Debug, Clone)]
pub struct FeedOutcome {
    pub feed: FeedRecord,
    /// Items added by this sync.
    pub added: usize,
    /// Notifications successfully handed to the notifier.
    pub notified: usize,
}

#[derive(Debug)]
pub struct FeedFailure {
    pub url: String,
    pub error: SyncError,
}

/// Best-effort result of one sync cycle.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub succeeded: Vec<FeedOutcome>,
    pub failed: Vec<FeedFailure>,
    /// Feeds abandoned by a timeout or cancellation.
    pub unfinished: Vec<String>,
    pub timed_out: bool,
    pub cancelled: bool,
    pub elapsed: Duration,
}

impl SyncReport {
    pub fn new_items(&self) -> usize {
        self.succeeded.iter().map(|outcome| outcome.added).sum()
    }

    pub fn notifications(&self) -> usize {
        self.succeeded.iter().map(|outcome| outcome.notified).sum()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Every requested feed either succeeded or failed.
    pub fn is_complete(&self) -> bool {
        self.unfinished.is_empty()
    }
}
