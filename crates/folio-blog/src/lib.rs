//! Folio Blog
//!
//! Page behaviours for a static blog: filtering the post feed, the archive
//! year filter, searching rendered post cards and a local view counter.

mod feed;
mod filter;
mod archive;
mod search;
mod views;

pub use feed::{parse_post_date, FeedError, Post, PostFeed};
pub use filter::{count_label, PostFilter};
pub use archive::filter_archive_by_year;
pub use search::{apply_search, search_posts, show_all_posts, SearchOutcome, MIN_QUERY_LEN};
pub use views::{
    format_views, is_countable_path, FileStore, KeyValueStore, MemoryStore, StoreError,
    ViewCounter, STORAGE_KEY,
};
