pub mod document;
pub mod feed;
pub mod item;

pub use document::{DocumentItem, FeedDocument};
pub use feed::FeedRecord;
pub use item::{ItemRecord, PLACEHOLDER_TITLE};
