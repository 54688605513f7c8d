use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rusqlite_migration::{Migrations, M};
use tokio::sync::broadcast;

use crate::app::PersistenceError;
use crate::domain::{FeedRecord, ItemRecord};
use crate::store::{ChangeKind, FeedChange, FeedStore, CHANGE_CHANNEL_CAPACITY};

const FEED_COLUMNS: &str = "identity, source_url, title, description, image_url, \
     is_favorited, is_notifications_enabled, last_updated_at";

const ITEM_COLUMNS: &str =
    "identity, feed_identity, title, description, image_url, link, published_at";

pub struct SqliteStore {
    conn: Mutex<Connection>,
    changes: broadcast::Sender<FeedChange>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        Self::with_connection(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self, PersistenceError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, PersistenceError> {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        let store = Self {
            conn: Mutex::new(conn),
            changes,
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<(), PersistenceError> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.lock()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        migrations
            .to_latest(&mut conn)
            .map_err(|e| PersistenceError::Migration(e.to_string()))?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, PersistenceError> {
        self.conn.lock().map_err(|_| PersistenceError::LockPoisoned)
    }

    fn notify(&self, identity: &str, kind: ChangeKind) {
        // No subscribers is not an error.
        let _ = self.changes.send(FeedChange {
            identity: identity.to_string(),
            kind,
        });
    }

    fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| s.parse::<DateTime<Utc>>().ok())
    }

    fn feed_from_row(row: &Row<'_>) -> rusqlite::Result<FeedRecord> {
        Ok(FeedRecord {
            identity: row.get(0)?,
            source_url: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            image_url: row.get(4)?,
            is_favorited: row.get(5)?,
            is_notifications_enabled: row.get(6)?,
            last_updated_at: row
                .get::<_, String>(7)
                .ok()
                .and_then(|s| Self::parse_datetime(&s))
                .unwrap_or_else(Utc::now),
            items: Vec::new(),
        })
    }

    fn item_from_row(row: &Row<'_>) -> rusqlite::Result<ItemRecord> {
        Ok(ItemRecord {
            identity: row.get(0)?,
            feed_identity: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            image_url: row.get(4)?,
            link: row.get(5)?,
            published_at: row
                .get::<_, Option<String>>(6)?
                .and_then(|s| Self::parse_datetime(&s)),
        })
    }

    fn items_for(conn: &Connection, feed_identity: &str) -> rusqlite::Result<Vec<ItemRecord>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE feed_identity = ?1"
        ))?;

        let items = stmt
            .query_map(params![feed_identity], Self::item_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(items)
    }
}

impl FeedStore for SqliteStore {
    fn get_by_identity(&self, identity: &str) -> Result<Option<FeedRecord>, PersistenceError> {
        let conn = self.lock()?;

        let feed = conn
            .query_row(
                &format!("SELECT {FEED_COLUMNS} FROM feeds WHERE identity = ?1"),
                params![identity],
                Self::feed_from_row,
            )
            .optional()?;

        match feed {
            Some(mut feed) => {
                feed.items = Self::items_for(&conn, identity)?;
                Ok(Some(feed))
            }
            None => Ok(None),
        }
    }

    fn get_all(&self) -> Result<Vec<FeedRecord>, PersistenceError> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {FEED_COLUMNS} FROM feeds ORDER BY title, identity"
        ))?;
        let mut feeds = stmt
            .query_map([], Self::feed_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(&format!("SELECT {ITEM_COLUMNS} FROM items"))?;
        let mut by_feed: HashMap<String, Vec<ItemRecord>> = HashMap::new();
        for item in stmt.query_map([], Self::item_from_row)? {
            let item = item?;
            by_feed
                .entry(item.feed_identity.clone())
                .or_default()
                .push(item);
        }

        for feed in &mut feeds {
            feed.items = by_feed.remove(&feed.identity).unwrap_or_default();
        }

        Ok(feeds)
    }

    fn identities(&self) -> Result<Vec<String>, PersistenceError> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare("SELECT identity FROM feeds ORDER BY identity")?;
        let identities = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;

        Ok(identities)
    }

    fn upsert(&self, feed: &FeedRecord) -> Result<(), PersistenceError> {
        {
            let mut conn = self.lock()?;
            let tx = conn.transaction()?;

            tx.execute(
                &format!(
                    "INSERT INTO feeds ({FEED_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                     ON CONFLICT(identity) DO UPDATE SET
                         source_url = excluded.source_url,
                         title = excluded.title,
                         description = excluded.description,
                         image_url = excluded.image_url,
                         is_favorited = excluded.is_favorited,
                         is_notifications_enabled = excluded.is_notifications_enabled,
                         last_updated_at = excluded.last_updated_at"
                ),
                params![
                    feed.identity,
                    feed.source_url,
                    feed.title,
                    feed.description,
                    feed.image_url,
                    feed.is_favorited,
                    feed.is_notifications_enabled,
                    feed.last_updated_at.to_rfc3339(),
                ],
            )?;

            let mut inserted = 0;
            {
                let mut stmt = tx.prepare(&format!(
                    "INSERT OR IGNORE INTO items ({ITEM_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
                ))?;
                for item in &feed.items {
                    inserted += stmt.execute(params![
                        item.identity,
                        feed.identity,
                        item.title,
                        item.description,
                        item.image_url,
                        item.link,
                        item.published_at.map(|dt| dt.to_rfc3339()),
                    ])?;
                }
            }

            tx.commit()?;
            tracing::debug!(feed = %feed.identity, inserted, "feed upserted");
        }

        self.notify(&feed.identity, ChangeKind::Upserted);
        Ok(())
    }

    fn delete(&self, identity: &str) -> Result<bool, PersistenceError> {
        let removed = {
            let conn = self.lock()?;
            conn.execute("DELETE FROM feeds WHERE identity = ?1", params![identity])?
        };

        if removed > 0 {
            self.notify(identity, ChangeKind::Deleted);
        }
        Ok(removed > 0)
    }

    fn subscribe(&self) -> broadcast::Receiver<FeedChange> {
        self.changes.subscribe()
    }
}
