use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::{FeedwatchError, Result};
use crate::config::Config;
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::Fetcher;
use crate::notify::{LogNotifier, NotificationDecider, Notifier};
use crate::store::SqliteStore;
use crate::sync::SyncCoordinator;

pub struct AppContext {
    pub config: Config,
    pub store: Arc<SqliteStore>,
    pub sync: SyncCoordinator<SqliteStore>,
}

impl AppContext {
    pub fn new(db_path: Option<PathBuf>, config: Config) -> Result<Self> {
        let db_path = match db_path {
            Some(p) => p,
            None => Self::default_db_path()?,
        };

        let store = Arc::new(SqliteStore::new(&db_path)?);
        Self::assemble(store, config)
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        let store = Arc::new(SqliteStore::in_memory()?);
        Self::assemble(store, config)
    }

    fn assemble(store: Arc<SqliteStore>, config: Config) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::new(&config.sync)?);
        let notifier: Arc<dyn Notifier + Send + Sync> = Arc::new(LogNotifier);
        Ok(Self::with_collaborators(store, fetcher, notifier, config))
    }

    /// Wires the context around caller-supplied collaborators.
    pub fn with_collaborators(
        store: Arc<SqliteStore>,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        notifier: Arc<dyn Notifier + Send + Sync>,
        config: Config,
    ) -> Self {
        let decider = NotificationDecider::from_config(&config.notifications);
        let sync = SyncCoordinator::with_workers(
            fetcher,
            store.clone(),
            notifier,
            decider,
            config.sync.workers,
        );

        Self {
            config,
            store,
            sync,
        }
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| FeedwatchError::Other("Could not find data directory".into()))?;
        let feedwatch_dir = data_dir.join("feedwatch");
        std::fs::create_dir_all(&feedwatch_dir)?;
        Ok(feedwatch_dir.join("feedwatch.db"))
    }
}
