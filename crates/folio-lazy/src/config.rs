//! Loader configuration

use folio_dom::{SelectorError, SelectorList};
use serde::Deserialize;

use crate::RootMargin;

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid root margin: {0:?}")]
    InvalidRootMargin(String),

    #[error("threshold must be within 0.0..=1.0, got {0}")]
    InvalidThreshold(f32),

    #[error("marker class `{0}` must not be empty")]
    EmptyClassName(&'static str),

    #[error("invalid {name}: {source}")]
    Selector {
        name: &'static str,
        #[source]
        source: SelectorError,
    },

    #[error("invalid loader options: {0}")]
    Json(#[from] serde_json::Error),
}

/// Lazy loader options.
///
/// Deserializes from the camelCase option object pages pass in; missing
/// keys keep their defaults and unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LazyConfig {
    /// Distance around the viewport at which loading starts
    pub root_margin: String,
    /// Visible fraction that counts as a threshold crossing
    pub threshold: f32,
    /// Marker while an element waits for the viewport
    pub loading_class: String,
    /// Marker after a successful fetch
    pub loaded_class: String,
    /// Marker after a failed fetch
    pub error_class: String,
    /// Deferred images and `<source>` elements
    pub image_selector: String,
    /// Deferred frames
    pub frame_selector: String,
}

impl Default for LazyConfig {
    fn default() -> Self {
        Self {
            root_margin: "200px 0px".to_string(),
            threshold: 0.1,
            loading_class: "lazy-loading".to_string(),
            loaded_class: "lazy-loaded".to_string(),
            error_class: "lazy-error".to_string(),
            image_selector: "img[data-src], img[data-srcset], source[data-srcset]".to_string(),
            frame_selector: "iframe[data-src]".to_string(),
        }
    }
}

impl LazyConfig {
    /// Merge a JSON option object over the defaults and validate it
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_root_margin(mut self, margin: &str) -> Self {
        self.root_margin = margin.to_string();
        self
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_classes(mut self, loading: &str, loaded: &str, error: &str) -> Self {
        self.loading_class = loading.to_string();
        self.loaded_class = loaded.to_string();
        self.error_class = error.to_string();
        self
    }

    /// Restrict the loader to part of the page, e.g. `.post-body img[data-src]`
    pub fn with_selectors(mut self, images: &str, frames: &str) -> Self {
        self.image_selector = images.to_string();
        self.frame_selector = frames.to_string();
        self
    }

    /// Parse the image and frame selectors
    pub fn selectors(&self) -> Result<(SelectorList, SelectorList), ConfigError> {
        let parse = |name, text: &str| {
            SelectorList::parse(text).map_err(|source| ConfigError::Selector { name, source })
        };
        Ok((
            parse("imageSelector", &self.image_selector)?,
            parse("frameSelector", &self.frame_selector)?,
        ))
    }

    /// Check every option, returning the parsed root margin
    pub fn validate(&self) -> Result<RootMargin, ConfigError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ConfigError::InvalidThreshold(self.threshold));
        }
        for (name, value) in [
            ("loadingClass", &self.loading_class),
            ("loadedClass", &self.loaded_class),
            ("errorClass", &self.error_class),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyClassName(name));
            }
        }
        self.selectors()?;
        self.root_margin.parse()
    }
}
