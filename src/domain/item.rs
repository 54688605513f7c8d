use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Shown in place of a missing title.
pub const PLACEHOLDER_TITLE: &str = "[-]";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    /// Server GUID when the document supplied one, otherwise a random UUID.
    pub identity: String,
    pub feed_identity: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub link: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

impl ItemRecord {
    pub fn new(identity: &str, feed_identity: &str) -> Self {
        Self {
            identity: identity.to_string(),
            feed_identity: feed_identity.to_string(),
            title: None,
            description: None,
            image_url: None,
            link: None,
            published_at: None,
        }
    }

    /// Fresh identity for items that arrive without a GUID.
    ///
    /// These never match across syncs, so such items reappear as new on
    /// every fetch.
    pub fn generated_identity() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(PLACEHOLDER_TITLE)
    }

    /// Newest first, undated last, then title ascending, then identity.
    pub fn display_cmp(&self, other: &Self) -> Ordering {
        let by_date = match (self.published_at, other.published_at) {
            (Some(a), Some(b)) => b.cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };

        by_date
            .then_with(|| self.title.cmp(&other.title))
            .then_with(|| self.identity.cmp(&other.identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_identities_are_unique() {
        assert_ne!(
            ItemRecord::generated_identity(),
            ItemRecord::generated_identity()
        );
    }

    #[test]
    fn test_display_title_placeholder() {
        let mut item = ItemRecord::new("a", "https://example.com/feed.xml");
        assert_eq!(item.display_title(), "[-]");
        item.title = Some("My Article".into());
        assert_eq!(item.display_title(), "My Article");
    }

    #[test]
    fn test_dated_items_sort_before_undated() {
        let mut dated = ItemRecord::new("a", "f");
        dated.title = Some("Zzz".into());
        dated.published_at = Some(Utc::now());
        let mut undated = ItemRecord::new("b", "f");
        undated.title = Some("Aaa".into());

        assert_eq!(dated.display_cmp(&undated), Ordering::Less);
    }
}
