use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio_test::assert_ok;

use feedwatch::app::{AppContext, FetchError, NotifyError};
use feedwatch::config::Config;
use feedwatch::domain::{DocumentItem, FeedDocument};
use feedwatch::fetcher::Fetcher;
use feedwatch::notify::{NotificationRequest, Notifier};
use feedwatch::store::{ChangeKind, FeedStore, SqliteStore};
use feedwatch::sync::{CancelToken, SyncScope};

const URL: &str = "https://example.com/rss.xml";

#[derive(Default)]
struct StubFetcher {
    documents: Mutex<HashMap<String, FeedDocument>>,
}

impl StubFetcher {
    fn serve(&self, url: &str, document: FeedDocument) {
        self.documents
            .lock()
            .unwrap()
            .insert(url.to_string(), document);
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<FeedDocument, FetchError> {
        self.documents
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or(FetchError::Status(404))
    }
}

#[derive(Default)]
struct Inbox {
    requests: Mutex<Vec<NotificationRequest>>,
}

#[async_trait]
impl Notifier for Inbox {
    async fn schedule(&self, request: NotificationRequest) -> Result<(), NotifyError> {
        self.requests.lock().unwrap().push(request);
        Ok(())
    }
}

fn example_document() -> FeedDocument {
    FeedDocument {
        title: Some("Example Feed".into()),
        description: Some("Examples".into()),
        image_url: None,
        items: vec![
            DocumentItem {
                guid: Some("a".into()),
                title: Some("First".into()),
                ..Default::default()
            },
            DocumentItem {
                guid: None,
                title: Some("Second".into()),
                ..Default::default()
            },
        ],
    }
}

fn context(dir: &tempfile::TempDir) -> (Arc<StubFetcher>, Arc<Inbox>, AppContext) {
    let store = Arc::new(SqliteStore::new(dir.path().join("feedwatch.db")).unwrap());
    let fetcher = Arc::new(StubFetcher::default());
    let inbox = Arc::new(Inbox::default());
    let ctx = AppContext::with_collaborators(
        store,
        fetcher.clone(),
        inbox.clone(),
        Config::default(),
    );
    (fetcher, inbox, ctx)
}

#[tokio::test]
async fn first_sync_of_unknown_url_creates_feed() {
    let dir = tempfile::tempdir().unwrap();
    let (fetcher, _, ctx) = context(&dir);
    fetcher.serve(URL, example_document());

    let feed = assert_ok!(ctx.sync.sync_one(URL).await);

    assert_eq!(feed.identity, URL);
    assert_eq!(feed.title.as_deref(), Some("Example Feed"));
    assert_eq!(feed.items.len(), 2);
    assert!(!feed.is_favorited);

    let stored = ctx.store.get_by_identity(URL).unwrap().unwrap();
    assert_eq!(stored.items.len(), 2);
    assert!(stored.items.iter().any(|item| item.identity == "a"));
}

#[tokio::test]
async fn change_stream_fires_once_per_sync() {
    let dir = tempfile::tempdir().unwrap();
    let (fetcher, _, ctx) = context(&dir);
    fetcher.serve(URL, example_document());
    let mut changes = ctx.store.subscribe();

    ctx.sync.sync_one(URL).await.unwrap();

    let change = changes.recv().await.unwrap();
    assert_eq!(change.identity, URL);
    assert_eq!(change.kind, ChangeKind::Upserted);
    assert!(changes.try_recv().is_err());
}

#[tokio::test]
async fn resync_notifies_once_and_keeps_flags() {
    let dir = tempfile::tempdir().unwrap();
    let (fetcher, inbox, ctx) = context(&dir);
    fetcher.serve(URL, example_document());
    ctx.sync.sync_one(URL).await.unwrap();
    ctx.sync.set_favorited(URL, true).await.unwrap();
    ctx.sync.set_notifications_enabled(URL, true).await.unwrap();

    let mut next = example_document();
    next.items.push(DocumentItem {
        guid: Some("c".into()),
        title: Some("Third".into()),
        ..Default::default()
    });
    fetcher.serve(URL, next);

    let report = ctx
        .sync
        .request_sync(SyncScope::All, None, &CancelToken::new())
        .await
        .unwrap();

    // "c" plus the GUID-less item, which gets a fresh identity every sync.
    assert_eq!(report.new_items(), 2);
    assert_eq!(report.notifications(), 1);

    let feed = ctx.store.get_by_identity(URL).unwrap().unwrap();
    assert!(feed.is_favorited);
    assert!(feed.is_notifications_enabled);
    assert_eq!(feed.items.len(), 4);

    let requests = inbox.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].feed_identity(), Some(URL));
}

#[tokio::test]
async fn delete_removes_feed_and_items() {
    let dir = tempfile::tempdir().unwrap();
    let (fetcher, _, ctx) = context(&dir);
    fetcher.serve(URL, example_document());
    ctx.sync.sync_one(URL).await.unwrap();

    assert!(ctx.sync.delete_feed(URL).await.unwrap());
    assert!(ctx.store.get_all().unwrap().is_empty());

    // A later sync starts from scratch with default flags.
    let feed = ctx.sync.sync_one(URL).await.unwrap();
    assert_eq!(feed.items.len(), 2);
    assert!(!feed.is_favorited);
}

#[tokio::test]
async fn prefix_overlapping_urls_keep_separate_items() {
    let dir = tempfile::tempdir().unwrap();
    let (fetcher, _, ctx) = context(&dir);
    let short = "https://e.com/feed";
    let long = "https://e.com/feeds";
    let single = |guid: &str| FeedDocument {
        title: Some("Overlap".into()),
        items: vec![DocumentItem {
            guid: Some(guid.into()),
            title: Some(guid.into()),
            ..Default::default()
        }],
        ..Default::default()
    };
    fetcher.serve(short, single("s/1"));
    fetcher.serve(long, single("/1"));

    let report = ctx
        .sync
        .request_sync(SyncScope::Single(short.into()), None, &CancelToken::new())
        .await
        .unwrap();
    assert_eq!(report.new_items(), 1);
    assert_ok!(ctx.sync.sync_one(long).await);

    let stored = ctx.store.get_by_identity(long).unwrap().unwrap();
    assert_eq!(stored.items.len(), 1);
    assert_eq!(stored.items[0].identity, "/1");
}
