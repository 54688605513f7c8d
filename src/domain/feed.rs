use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::item::{ItemRecord, PLACEHOLDER_TITLE};

/// A locally persisted feed. The source URL doubles as its identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedRecord {
    pub identity: String,
    pub source_url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub is_favorited: bool,
    pub is_notifications_enabled: bool,
    pub last_updated_at: DateTime<Utc>,
    pub items: Vec<ItemRecord>,
}

impl FeedRecord {
    pub fn new(source_url: &str, now: DateTime<Utc>) -> Self {
        Self {
            identity: source_url.to_string(),
            source_url: source_url.to_string(),
            title: None,
            description: None,
            image_url: None,
            is_favorited: false,
            is_notifications_enabled: false,
            last_updated_at: now,
            items: Vec::new(),
        }
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(PLACEHOLDER_TITLE)
    }

    pub fn contains_item(&self, identity: &str) -> bool {
        self.items.iter().any(|item| item.identity == identity)
    }

    /// Items sorted for presentation. The stored collection stays unordered.
    pub fn items_in_display_order(&self) -> Vec<&ItemRecord> {
        let mut items: Vec<&ItemRecord> = self.items.iter().collect();
        items.sort_by(|a, b| a.display_cmp(b));
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item(identity: &str, title: Option<&str>, day: Option<u32>) -> ItemRecord {
        let mut item = ItemRecord::new(identity, "https://example.com/rss.xml");
        item.title = title.map(String::from);
        item.published_at = day.map(|d| Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap());
        item
    }

    #[test]
    fn test_new_feed_uses_url_as_identity() {
        let feed = FeedRecord::new("https://example.com/rss.xml", Utc::now());
        assert_eq!(feed.identity, "https://example.com/rss.xml");
        assert_eq!(feed.source_url, feed.identity);
        assert!(!feed.is_favorited);
        assert!(!feed.is_notifications_enabled);
        assert!(feed.items.is_empty());
    }

    #[test]
    fn test_display_title_placeholder() {
        let mut feed = FeedRecord::new("https://example.com/rss.xml", Utc::now());
        assert_eq!(feed.display_title(), "[-]");
        feed.title = Some("Example Feed".into());
        assert_eq!(feed.display_title(), "Example Feed");
    }

    #[test]
    fn test_display_order_by_date_descending() {
        let mut feed = FeedRecord::new("https://example.com/rss.xml", Utc::now());
        feed.items = vec![
            item("a", Some("A"), Some(3)),
            item("b", Some("B"), Some(1)),
            item("c", Some("C"), Some(2)),
        ];

        let days: Vec<u32> = feed
            .items_in_display_order()
            .iter()
            .map(|i| chrono::Datelike::day(&i.published_at.unwrap()))
            .collect();
        assert_eq!(days, vec![3, 2, 1]);
    }

    #[test]
    fn test_display_order_ties_fall_back_to_title() {
        let mut feed = FeedRecord::new("https://example.com/rss.xml", Utc::now());
        feed.items = vec![
            item("1", Some("Zebra"), Some(5)),
            item("2", Some("Apple"), Some(5)),
            item("3", Some("Mango"), None),
            item("4", Some("Banana"), None),
        ];

        let titles: Vec<&str> = feed
            .items_in_display_order()
            .into_iter()
            .map(|i| i.display_title())
            .collect();
        assert_eq!(titles, vec!["Apple", "Zebra", "Banana", "Mango"]);
    }

    #[test]
    fn test_display_order_is_stable_across_input_order() {
        let a = item("x", Some("Same"), None);
        let b = item("y", Some("Same"), None);

        let mut first = FeedRecord::new("https://example.com/rss.xml", Utc::now());
        first.items = vec![a.clone(), b.clone()];
        let mut second = first.clone();
        second.items = vec![b, a];

        let ids = |feed: &FeedRecord| -> Vec<String> {
            feed.items_in_display_order()
                .iter()
                .map(|i| i.identity.clone())
                .collect()
        };
        assert_eq!(ids(&first), ids(&second));
    }
}
