//! Page
//!
//! One open document plus the loader working on it. The page plays the part
//! of the browser: it owns the viewport, runs layout, delivers mutation
//! batches and finishes fetches by firing `load` or `error`.

use folio_blog::{KeyValueStore, ViewCounter};
use folio_dom::{DOMRect, Document, DomTree, EventKind, NodeId};
use folio_lazy::{Capabilities, ConfigError, LazyConfig, LazyLoader};

use crate::FlowLayout;

/// Milliseconds between viewport checks, for entry timestamps
const FRAME_MS: f64 = 16.0;

/// Page error
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("invalid lazy loading options: {0}")]
    Config(#[from] ConfigError),
}

/// Page options
#[derive(Debug, Clone)]
pub struct PageOptions {
    pub lazy: LazyConfig,
    pub capabilities: Capabilities,
    pub viewport_width: f32,
    pub viewport_height: f32,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            lazy: LazyConfig::default(),
            capabilities: Capabilities::default(),
            viewport_width: 1280.0,
            viewport_height: 720.0,
        }
    }
}

/// An open page
#[derive(Debug)]
pub struct Page {
    document: Document,
    loader: LazyLoader,
    options: PageOptions,
    scroll_y: f32,
    time: f64,
}

impl Page {
    /// Start the loader on a ready document and run the first viewport check
    pub fn open(mut document: Document, options: PageOptions) -> Result<Self, PageError> {
        let loader = LazyLoader::new(&mut document, options.lazy.clone(), options.capabilities)?;
        tracing::info!(
            "opened {} ({} deferred images, {} deferred iframes)",
            document.url(),
            loader.images().len(),
            loader.iframes().len()
        );

        let mut page = Self {
            document,
            loader,
            options,
            scroll_y: 0.0,
            time: 0.0,
        };
        page.check_viewport();
        Ok(page)
    }

    /// Current viewport in document coordinates
    pub fn viewport(&self) -> DOMRect {
        DOMRect::new(0.0, self.scroll_y, self.options.viewport_width, self.options.viewport_height)
    }

    pub fn scroll_y(&self) -> f32 {
        self.scroll_y
    }

    fn layout_root(&self) -> NodeId {
        let body = self.document.body();
        if body.is_valid() { body } else { self.document.tree().root() }
    }

    /// Lay out the page and let the loader react to the current viewport
    fn check_viewport(&mut self) -> usize {
        let layout = FlowLayout::new(self.options.viewport_width).layout(self.document.tree(), self.layout_root());
        let viewport = self.viewport();
        self.time += FRAME_MS;
        self.loader.check_viewport(&mut self.document, viewport, layout.rects(), self.time)
    }

    /// Scroll to `y` (clamped at the top); returns the number of loads
    pub fn scroll_to(&mut self, y: f32) -> usize {
        self.scroll_y = y.max(0.0);
        self.pump_mutations();
        let loaded = self.check_viewport();
        tracing::debug!("scrolled to {}: {} loads", self.scroll_y, loaded);
        loaded
    }

    /// Deliver pending mutation records to the loader
    pub fn pump_mutations(&mut self) -> bool {
        let rescanned = self.loader.process_mutations(&mut self.document);
        if rescanned {
            self.check_viewport();
        }
        rescanned
    }

    /// Re-scan for deferred content the mutation feed may have missed
    pub fn refresh(&mut self) -> usize {
        let observed = self.loader.refresh(&mut self.document);
        self.check_viewport();
        observed
    }

    /// Finish every in-flight fetch with the same outcome
    pub fn complete_fetches(&mut self, outcome: EventKind) -> usize {
        self.complete_fetches_with(|_, _| outcome)
    }

    /// Finish every in-flight fetch, choosing `load` or `error` per element.
    ///
    /// In flight means the loader promoted the element (it has a `load`
    /// listener), a `src` or `srcset` was applied, and it carries no
    /// terminal marker yet.
    pub fn complete_fetches_with<F>(&mut self, mut outcome: F) -> usize
    where
        F: FnMut(&DomTree, NodeId) -> EventKind,
    {
        let config = self.loader.config();
        let tree = self.document.tree();
        let in_flight: Vec<NodeId> = tree
            .descendants(tree.root())
            .into_iter()
            .filter(|&n| tree.listener_count(n, EventKind::Load) > 0)
            .filter(|&n| tree.has_attribute(n, "src") || tree.has_attribute(n, "srcset"))
            .filter(|&n| !tree.has_class(n, &config.loaded_class) && !tree.has_class(n, &config.error_class))
            .collect();

        for &node in &in_flight {
            let kind = outcome(self.document.tree(), node);
            self.document.tree_mut().dispatch_event(node, kind);
        }
        in_flight.len()
    }

    /// Count a visit to this page and fill in the view displays
    pub fn count_view<S: KeyValueStore>(&mut self, counter: &mut ViewCounter<S>) -> Option<u64> {
        counter.visit(&mut self.document)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Mutable document; call [`Page::pump_mutations`] after inserting content
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn loader(&self) -> &LazyLoader {
        &self.loader
    }

    /// Tear the loader down and hand the document back
    pub fn close(mut self) -> Document {
        self.loader.teardown(&mut self.document);
        tracing::info!("closed {} after {} loads", self.document.url(), self.loader.stats().loads);
        self.document
    }
}
