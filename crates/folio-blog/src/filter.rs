//! Feed filters for category, tag, notes and year listings

use std::cmp::Reverse;

use crate::Post;

/// Category holding notes
const NOTES_CATEGORY: &str = "notes";

/// Which posts a listing page shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostFilter {
    All,
    /// Exact category name
    Category(String),
    /// Tag name, compared case-insensitively
    Tag(String),
    /// Publication year
    Year(i32),
    /// Notes, optionally limited to a `category/subcategory` prefix
    Notes(Option<String>),
}

impl PostFilter {
    pub fn matches(&self, post: &Post) -> bool {
        match self {
            Self::All => true,
            Self::Category(category) => post.in_category(category),
            Self::Tag(tag) => post.has_tag(tag),
            Self::Year(year) => post.year() == Some(*year),
            Self::Notes(None) => post.in_category(NOTES_CATEGORY),
            Self::Notes(Some(path)) => {
                post.in_category(NOTES_CATEGORY)
                    && post
                        .subcategory
                        .as_deref()
                        .is_some_and(|sub| sub.starts_with(path.as_str()))
            }
        }
    }

    /// Matching posts, newest first. Posts sharing a date keep feed order;
    /// undated posts go last.
    pub fn apply<'a>(&self, posts: &'a [Post]) -> Vec<&'a Post> {
        let mut selected: Vec<&Post> = posts.iter().filter(|p| self.matches(p)).collect();
        selected.sort_by_cached_key(|p| Reverse(p.published()));
        tracing::debug!("{:?} selected {} of {} posts", self, selected.len(), posts.len());
        selected
    }

    /// What the listing calls its items
    pub fn noun(&self) -> &'static str {
        match self {
            Self::Notes(_) => "note",
            _ => "post",
        }
    }

    /// `"1 post"`, `"3 notes"`
    pub fn count_label(&self, count: usize) -> String {
        count_label(count, self.noun())
    }
}

/// Count with a naively pluralised noun
pub fn count_label(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}
