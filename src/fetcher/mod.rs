pub mod http_fetcher;

use async_trait::async_trait;

use crate::app::FetchError;
use crate::domain::FeedDocument;

/// Turns a feed URL into a parsed document.
///
/// Implementations must be idempotent and free of side effects so the
/// coordinator can retry or run them concurrently.
#[async_trait]
pub trait Fetcher {
    async fn fetch(&self, url: &str) -> Result<FeedDocument, FetchError>;
}
