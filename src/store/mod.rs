pub mod sqlite;

use tokio::sync::broadcast;

use crate::app::PersistenceError;
use crate::domain::FeedRecord;

pub use sqlite::SqliteStore;

/// Buffered change events per subscriber before lagging.
pub const CHANGE_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Upserted,
    Deleted,
}

/// Emitted once per successful write to a feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedChange {
    pub identity: String,
    pub kind: ChangeKind,
}

/// Durable collection of feeds and their items, keyed by feed identity.
pub trait FeedStore {
    fn get_by_identity(&self, identity: &str) -> Result<Option<FeedRecord>, PersistenceError>;
    fn get_all(&self) -> Result<Vec<FeedRecord>, PersistenceError>;

    /// Identities of all stored feeds, without loading their items.
    fn identities(&self) -> Result<Vec<String>, PersistenceError>;

    /// Inserts or replaces the feed row and adds any items not yet stored.
    /// Stored items are never removed or rewritten.
    fn upsert(&self, feed: &FeedRecord) -> Result<(), PersistenceError>;

    /// Removes the feed and all its items. Returns whether it existed.
    fn delete(&self, identity: &str) -> Result<bool, PersistenceError>;

    fn subscribe(&self) -> broadcast::Receiver<FeedChange>;
}
