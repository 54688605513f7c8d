use chrono::Utc;
use feed_rs::model::Entry;
use feed_rs::parser;
use html_escape::decode_html_entities;

use crate::app::FetchError;
use crate::domain::{DocumentItem, FeedDocument};

/// Converts RSS/Atom/JSON Feed bytes into a [`FeedDocument`].
#[derive(Clone)]
pub struct Normalizer;

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, body: &[u8]) -> Result<FeedDocument, FetchError> {
        // Leave missing ids empty so GUID-less entries stay distinguishable.
        let feed = parser::Builder::new()
            .id_generator(|_links, _title, _uri| String::new())
            .build()
            .parse(body)
            .map_err(|e| FetchError::Parse(e.to_string()))?;

        let image_url = feed
            .logo
            .map(|image| image.uri)
            .or_else(|| feed.icon.map(|image| image.uri));

        Ok(FeedDocument {
            title: feed.title.map(|t| decode(&t.content)),
            description: feed.description.map(|d| decode(&d.content)),
            image_url,
            items: feed.entries.into_iter().map(document_item).collect(),
        })
    }
}

fn document_item(entry: Entry) -> DocumentItem {
    let guid = Some(entry.id).filter(|id| !id.trim().is_empty());

    let image_url = entry.media.iter().find_map(|media| {
        media
            .thumbnails
            .first()
            .map(|thumbnail| thumbnail.image.uri.clone())
            .or_else(|| {
                media
                    .content
                    .iter()
                    .find_map(|content| content.url.as_ref().map(|url| url.to_string()))
            })
    });

    let description = entry
        .summary
        .map(|s| decode(&s.content))
        .or_else(|| entry.content.and_then(|c| c.body).map(|b| decode(&b)));

    DocumentItem {
        guid,
        title: entry.title.map(|t| decode(&t.content)),
        description,
        image_url,
        link: entry.links.first().map(|l| l.href.clone()),
        published_at: entry
            .published
            .or(entry.updated)
            .map(|dt| dt.with_timezone(&Utc)),
    }
}

fn decode(text: &str) -> String {
    decode_html_entities(text).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test Feed &amp; Friends</title>
    <description>A test feed</description>
    <item>
      <title>Test Item 1</title>
      <link>https://example.com/item1</link>
      <guid>item-1</guid>
      <pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate>
      <description>This is item 1</description>
    </item>
    <item>
      <title>Test Item 2</title>
      <link>https://example.com/item2</link>
      <description>This is item 2</description>
    </item>
  </channel>
</rss>"#;

    const ATOM_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Test Feed</title>
  <subtitle>An Atom test feed</subtitle>
  <entry>
    <title>Atom Entry 1</title>
    <link href="https://example.com/atom1"/>
    <id>atom-entry-1</id>
    <updated>2024-01-01T00:00:00Z</updated>
    <summary>This is Atom entry 1</summary>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_rss() {
        let doc = Normalizer::new().normalize(RSS_SAMPLE.as_bytes()).unwrap();

        assert_eq!(doc.title, Some("Test Feed & Friends".into()));
        assert_eq!(doc.description, Some("A test feed".into()));
        assert_eq!(doc.items.len(), 2);
        assert_eq!(doc.items[0].title, Some("Test Item 1".into()));
        assert_eq!(doc.items[0].link, Some("https://example.com/item1".into()));
        assert_eq!(doc.items[0].description, Some("This is item 1".into()));
        assert!(doc.items[0].published_at.is_some());
    }

    #[test]
    fn test_rss_guid_presence() {
        let doc = Normalizer::new().normalize(RSS_SAMPLE.as_bytes()).unwrap();

        assert_eq!(doc.items[0].stable_guid(), Some("item-1"));
        assert_eq!(doc.items[1].stable_guid(), None);
    }

    #[test]
    fn test_parse_atom() {
        let doc = Normalizer::new().normalize(ATOM_SAMPLE.as_bytes()).unwrap();

        assert_eq!(doc.title, Some("Atom Test Feed".into()));
        assert_eq!(doc.items.len(), 1);
        assert_eq!(doc.items[0].guid, Some("atom-entry-1".into()));
        assert_eq!(doc.items[0].link, Some("https://example.com/atom1".into()));
    }

    #[test]
    fn test_garbage_is_parse_error() {
        let result = Normalizer::new().normalize(b"definitely not a feed");
        assert!(matches!(result, Err(FetchError::Parse(_))));
    }
}
