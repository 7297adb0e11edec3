//! Post feed
//!
//! The site generator writes `posts.json`, either a bare array of posts or an
//! object with a `posts` array.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

/// Reading time shown when a post doesn't state one
const DEFAULT_READING_TIME: u32 = 5;

/// Feed loading error
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("failed to read feed {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed feed: {0}")]
    Json(#[from] serde_json::Error),
}

/// One entry of the feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(default)]
    pub reading_time: Option<u32>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Post {
    /// Publication time, if the date parses
    pub fn published(&self) -> Option<DateTime<FixedOffset>> {
        parse_post_date(&self.date)
    }

    pub fn year(&self) -> Option<i32> {
        self.published().map(|d| d.year())
    }

    /// Minutes to read; zero or missing falls back to the default
    pub fn reading_time(&self) -> u32 {
        self.reading_time
            .filter(|&t| t > 0)
            .unwrap_or(DEFAULT_READING_TIME)
    }

    /// Case-insensitive tag match
    pub fn has_tag(&self, tag: &str) -> bool {
        let tag = tag.to_lowercase();
        self.tags.iter().any(|t| t.to_lowercase() == tag)
    }

    pub fn in_category(&self, category: &str) -> bool {
        self.category.as_deref() == Some(category)
    }

    /// Category with its first letter upper-cased, as shown on cards
    pub fn display_category(&self) -> Option<String> {
        let category = self.category.as_deref()?;
        let mut chars = category.chars();
        let first = chars.next()?;
        Some(first.to_uppercase().chain(chars).collect())
    }
}

/// Parse a feed date.
///
/// Accepts RFC 3339, the generator's `YYYY-MM-DD HH:MM:SS +ZZZZ`, the same
/// without an offset (taken as UTC) and a bare `YYYY-MM-DD`.
pub fn parse_post_date(date: &str) -> Option<DateTime<FixedOffset>> {
    let date = date.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_str(date, "%Y-%m-%d %H:%M:%S %z") {
        return Some(dt);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(date, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc().fixed_offset());
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FeedDocument {
    List(Vec<Post>),
    Wrapped { posts: Vec<Post> },
}

/// All posts of a site, in feed order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostFeed {
    posts: Vec<Post>,
}

impl PostFeed {
    pub fn new(posts: Vec<Post>) -> Self {
        Self { posts }
    }

    pub fn from_json(json: &str) -> Result<Self, FeedError> {
        let posts = match serde_json::from_str(json)? {
            FeedDocument::List(posts) => posts,
            FeedDocument::Wrapped { posts } => posts,
        };
        let undated = posts.iter().filter(|p| p.published().is_none()).count();
        if undated > 0 {
            tracing::warn!("{} of {} posts have no parsable date", undated, posts.len());
        }
        tracing::debug!("loaded feed with {} posts", posts.len());
        Ok(Self { posts })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FeedError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| FeedError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}
