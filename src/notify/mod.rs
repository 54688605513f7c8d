pub mod decider;

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::app::NotifyError;

pub use decider::{ItemComparison, NotificationDecider};

/// Payload key carrying the feed identity for deep links.
pub const FEED_ID_KEY: &str = "id";

/// A user-facing "new articles" notification for one feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationRequest {
    pub title: String,
    pub body: String,
    pub payload: BTreeMap<String, String>,
    pub trigger_delay: Duration,
}

impl NotificationRequest {
    pub fn feed_identity(&self) -> Option<&str> {
        self.payload.get(FEED_ID_KEY).map(String::as_str)
    }
}

#[async_trait]
pub trait Notifier {
    async fn schedule(&self, request: NotificationRequest) -> Result<(), NotifyError>;
}

/// Writes each request to the log instead of delivering it.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn schedule(&self, request: NotificationRequest) -> Result<(), NotifyError> {
        let payload = serde_json::to_string(&request.payload)
            .map_err(|e| NotifyError::Rejected(e.to_string()))?;

        tracing::info!(
            title = %request.title,
            body = %request.body,
            delay_secs = request.trigger_delay.as_secs(),
            payload = %payload,
            "notification scheduled"
        );
        Ok(())
    }
}
