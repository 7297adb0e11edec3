//! View counter
//!
//! Counts page views per URL in a key-value store under a single key, as a
//! JSON object of URL to count. The counts are local to the store; nothing is
//! shared between readers.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use folio_dom::{CompoundSelector, Document};

/// Store key holding the JSON counts
pub const STORAGE_KEY: &str = "blog_views";

/// Only post pages below this path are counted
const COUNTED_PATH: &str = "/blogs/categories/";

/// Storage error
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("storage file {path} is not a JSON object of strings: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// String key-value storage
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove_item(&mut self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store, gone with the process
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StoreError> {
        self.items.remove(key);
        Ok(())
    }
}

/// Store persisted as a JSON object in one file, rewritten on every change
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    items: BTreeMap<String, String>,
}

impl FileStore {
    /// Open a store file; a missing file is an empty store
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let items = match std::fs::read_to_string(&path) {
            Ok(json) => serde_json::from_str(&json).map_err(|source| StoreError::Format {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        Ok(Self { path, items })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&self.items).map_err(|source| StoreError::Format {
            path: self.path.clone(),
            source,
        })?;
        std::fs::write(&self.path, json).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.items.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StoreError> {
        if self.items.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

/// `999`, `1.5K`, `2.0M`
pub fn format_views(views: u64) -> String {
    // Rounds half up to one decimal
    if views < 1_000 {
        views.to_string()
    } else if views < 1_000_000 {
        let tenths = views.saturating_add(50) / 100;
        format!("{}.{}K", tenths / 10, tenths % 10)
    } else {
        let tenths = views.saturating_add(50_000) / 100_000;
        format!("{}.{}M", tenths / 10, tenths % 10)
    }
}

/// Whether a page path counts as a post view
pub fn is_countable_path(path: &str) -> bool {
    path.contains(COUNTED_PATH)
}

/// Per-URL view counts backed by a [`KeyValueStore`]
#[derive(Debug)]
pub struct ViewCounter<S> {
    store: S,
    views: BTreeMap<String, u64>,
}

impl<S: KeyValueStore> ViewCounter<S> {
    /// Load counts from the store. Missing or corrupt data starts empty.
    pub fn new(store: S) -> Self {
        let views = match store.get_item(STORAGE_KEY) {
            Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!("discarding unreadable view counts: {}", e);
                BTreeMap::new()
            }),
            Ok(None) => BTreeMap::new(),
            Err(e) => {
                tracing::warn!("error loading views: {}", e);
                BTreeMap::new()
            }
        };
        Self { store, views }
    }

    fn save(&mut self) {
        let result = serde_json::to_string(&self.views)
            .map_err(|source| StoreError::Format {
                path: PathBuf::from(STORAGE_KEY),
                source,
            })
            .and_then(|json| self.store.set_item(STORAGE_KEY, &json));
        if let Err(e) = result {
            tracing::error!("error saving views: {}", e);
        }
    }

    /// Views recorded for `url`
    pub fn get(&self, url: &str) -> u64 {
        self.views.get(url).copied().unwrap_or(0)
    }

    /// Count one view of `url`, persist, and refresh its displays
    pub fn increment(&mut self, document: &mut Document, url: &str) -> u64 {
        let count = self.views.entry(url.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        let count = *count;
        self.save();
        self.update_display(document, url);
        count
    }

    /// Write the formatted count into every `[data-url="url"]` element
    pub fn update_display(&self, document: &mut Document, url: &str) -> usize {
        let elements = document.query_selector_all(&CompoundSelector::any().attr_eq("data-url", url).into());
        let text = format_views(self.get(url));
        let tree = document.tree_mut();
        for &element in &elements {
            tree.set_text_content(element, &text);
        }
        elements.len()
    }

    /// Refresh every `[data-url]` element on the page
    pub fn update_all_displays(&self, document: &mut Document) -> usize {
        let elements = document.query_selector_all(&CompoundSelector::any().attr("data-url").into());
        let tree = document.tree_mut();
        for &element in &elements {
            let Some(url) = tree.get_attribute(element, "data-url") else {
                continue;
            };
            let text = format_views(self.get(url));
            tree.set_text_content(element, &text);
        }
        elements.len()
    }

    /// Page-load hook: fill in every display, then count the visit if the
    /// document is a post page. Returns the new count for counted pages.
    pub fn visit(&mut self, document: &mut Document) -> Option<u64> {
        self.update_all_displays(document);
        let path = document.path().to_string();
        if !is_countable_path(&path) {
            return None;
        }
        let count = self.increment(document, &path);
        tracing::debug!("view {} of {}", count, path);
        Some(count)
    }

    pub fn views(&self) -> &BTreeMap<String, u64> {
        &self.views
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}
