use chrono::{DateTime, Utc};

/// A parsed remote feed, as handed over by the fetcher.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedDocument {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub items: Vec<DocumentItem>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentItem {
    pub guid: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub link: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

impl DocumentItem {
    /// The server-supplied GUID, ignoring blank values.
    pub fn stable_guid(&self) -> Option<&str> {
        self.guid
            .as_deref()
            .map(str::trim)
            .filter(|guid| !guid.is_empty())
    }
}
