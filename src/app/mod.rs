pub mod context;
pub mod error;

pub use context::AppContext;
pub use error::{FeedwatchError, FetchError, NotifyError, PersistenceError, Result, SyncError};
