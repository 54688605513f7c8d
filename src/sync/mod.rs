pub mod cancel;
pub mod coordinator;
pub mod locks;
pub mod reconcile;
pub mod report;

pub use cancel::CancelToken;
pub use coordinator::{SyncCoordinator, SyncScope, DEFAULT_WORKERS};
pub use locks::FeedLocks;
pub use reconcile::{reconcile, reconcile_at, Reconciliation};
pub use report::{FeedFailure, FeedOutcome, SyncReport};
