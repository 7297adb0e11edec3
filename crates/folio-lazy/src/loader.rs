//! Lazy Loader
//!
//! Owns the watch set (deferred images and frames found by the last scan),
//! the load strategy, and the mutation subscription that re-scans the
//! document when deferred content is inserted.
//!
//! The loader never holds the document. The host passes it into every call,
//! which keeps a single owner for the tree and makes the loader's lifetime
//! explicit: build it with [`LazyLoader::new`] once the page is ready, end it
//! with [`LazyLoader::teardown`].

use std::collections::HashMap;

use folio_dom::{
    DOMRect, Document, DomTree, EventKind, MutationObserverId,
    MutationObserverInit, MutationType, NodeId, SelectorList,
};

use crate::{Capabilities, ConfigError, IntersectionEntry, LazyConfig, LoadStrategy, StrategyKind};

const DATA_SRC: &str = "data-src";
const DATA_SRCSET: &str = "data-srcset";
const DATA_SIZES: &str = "data-sizes";

/// Counters for what the loader has done so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoaderStats {
    /// Document scans (initial, refresh and mutation-triggered)
    pub scans: usize,
    /// Elements whose pending sources were promoted
    pub loads: usize,
    /// Mutation batches that caused a re-scan
    pub mutation_rescans: usize,
    /// Observed elements dropped after leaving the document
    pub released: usize,
}

/// Standing child-list subscription on the document body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationSubscription {
    observer: MutationObserverId,
    target: NodeId,
}

impl MutationSubscription {
    pub fn observer(&self) -> MutationObserverId {
        self.observer
    }

    pub fn target(&self) -> NodeId {
        self.target
    }
}

/// Lazy content loader
#[derive(Debug)]
pub struct LazyLoader {
    config: LazyConfig,
    strategy: LoadStrategy,
    image_selector: SelectorList,
    frame_selector: SelectorList,
    images: Vec<NodeId>,
    iframes: Vec<NodeId>,
    subscription: Option<MutationSubscription>,
    stats: LoaderStats,
    torn_down: bool,
}

impl LazyLoader {
    /// Build the loader and process the current document.
    ///
    /// With intersection support every deferred element is registered and
    /// marked loading; without it everything found is loaded right away.
    /// Either way the loader subscribes to document mutations afterwards.
    pub fn new(
        document: &mut Document,
        config: LazyConfig,
        capabilities: Capabilities,
    ) -> Result<Self, ConfigError> {
        let root_margin = config.validate()?;
        let (image_selector, frame_selector) = config.selectors()?;
        let strategy = LoadStrategy::select(capabilities, root_margin, config.threshold);
        tracing::debug!(
            "lazy loader: {:?} strategy, rootMargin {}, threshold {}",
            strategy.kind(),
            root_margin,
            config.threshold
        );

        let mut loader = Self {
            config,
            strategy,
            image_selector,
            frame_selector,
            images: Vec::new(),
            iframes: Vec::new(),
            subscription: None,
            stats: LoaderStats::default(),
            torn_down: false,
        };

        loader.scan(document);
        match loader.strategy.kind() {
            StrategyKind::Proximity => {
                loader.observe(document);
            }
            StrategyKind::Eager => loader.load_all_immediately(document),
        }
        loader.watch_for_mutations(document);

        Ok(loader)
    }

    /// Replace the watch set with the deferred elements currently in the document
    pub fn scan(&mut self, document: &Document) {
        self.images = document.query_selector_all(&self.image_selector);
        self.iframes = document.query_selector_all(&self.frame_selector);
        self.stats.scans += 1;
        tracing::debug!(
            "lazy scan: {} images, {} iframes",
            self.images.len(),
            self.iframes.len()
        );
    }

    /// Register unsettled watch-set elements with the strategy.
    ///
    /// Proximity: each element without a terminal marker is handed to the
    /// detector and marked loading. Eager: each such element is loaded.
    /// Returns how many elements were newly registered or loaded.
    pub fn observe(&mut self, document: &mut Document) -> usize {
        if self.torn_down {
            return 0;
        }
        self.release_disconnected(document);
        let watch: Vec<NodeId> = self.watch_set().collect();

        match self.strategy.kind() {
            StrategyKind::Proximity => {
                let LoadStrategy::Proximity(detector) = &mut self.strategy else {
                    return 0;
                };
                let tree = document.tree_mut();
                let mut registered = 0;
                for node in watch {
                    if is_settled(tree, &self.config, node) {
                        continue;
                    }
                    if detector.observe(node) {
                        registered += 1;
                    }
                    tree.add_class(node, &self.config.loading_class);
                }
                registered
            }
            StrategyKind::Eager => {
                let mut loaded = 0;
                for node in watch {
                    if !is_settled(document.tree(), &self.config, node) {
                        self.load(document, node);
                        loaded += 1;
                    }
                }
                loaded
            }
        }
    }

    /// Handle a batch of visibility records from the detector.
    ///
    /// Each intersecting target that is still observed is loaded and
    /// deregistered within this call, so a later record for the same target
    /// finds it unobserved and is ignored. Returns the number of loads.
    pub fn on_proximity_event(&mut self, document: &mut Document, entries: Vec<IntersectionEntry>) -> usize {
        let mut loaded = 0;
        for entry in entries {
            if !entry.is_intersecting {
                continue;
            }
            let observed = self
                .strategy
                .detector()
                .is_some_and(|d| d.is_observing(entry.target));
            if !observed {
                continue;
            }

            self.load(document, entry.target);
            if let Some(detector) = self.strategy.detector_mut() {
                detector.unobserve(entry.target);
            }
            loaded += 1;
        }
        loaded
    }

    /// Run the detector against a viewport and load whatever came into range
    pub fn check_viewport(
        &mut self,
        document: &mut Document,
        viewport: DOMRect,
        element_rects: &HashMap<NodeId, DOMRect>,
        time: f64,
    ) -> usize {
        let Some(detector) = self.strategy.detector_mut() else {
            return 0;
        };
        detector.check_intersections(viewport, element_rects, time);
        let entries = detector.take_entries();
        self.on_proximity_event(document, entries)
    }

    /// Promote an element's pending sources
    pub fn load(&mut self, document: &mut Document, element: NodeId) {
        let tree = document.tree_mut();
        let is_frame = match tree.tag_name(element) {
            Some(tag) => tag == "iframe",
            None => return,
        };

        tree.remove_class(element, &self.config.loading_class);
        if is_frame {
            self.load_frame(tree, element);
        } else {
            self.load_image(tree, element);
        }
        self.stats.loads += 1;
    }

    fn load_image(&self, tree: &mut DomTree, image: NodeId) {
        let src = pending_value(tree, image, DATA_SRC);
        let srcset = pending_value(tree, image, DATA_SRCSET);
        let sizes = pending_value(tree, image, DATA_SIZES);

        self.attach_listeners(tree, image);

        // sizes and srcset first so source selection sees them before src
        if let Some(sizes) = sizes {
            tree.set_attribute(image, "sizes", &sizes);
        }
        if let Some(srcset) = srcset {
            tree.set_attribute(image, "srcset", &srcset);
        }
        if let Some(src) = &src {
            tree.set_attribute(image, "src", src);
        }

        tree.remove_attribute(image, DATA_SRC);
        tree.remove_attribute(image, DATA_SRCSET);
        tree.remove_attribute(image, DATA_SIZES);

        tracing::debug!("lazy load image {:?} src={:?}", image, src);
    }

    fn load_frame(&self, tree: &mut DomTree, frame: NodeId) {
        let src = pending_value(tree, frame, DATA_SRC);

        self.attach_listeners(tree, frame);

        if let Some(src) = &src {
            tree.set_attribute(frame, "src", src);
        }
        tree.remove_attribute(frame, DATA_SRC);

        tracing::debug!("lazy load iframe {:?} src={:?}", frame, src);
    }

    /// `load` sets the loaded marker, `error` the error marker; whichever
    /// lands first wins and clears the loading marker.
    fn attach_listeners(&self, tree: &mut DomTree, element: NodeId) {
        let markers = Markers::from(&self.config);
        let on_error = markers.clone();

        tree.add_event_listener(element, EventKind::Load, move |tree, target| {
            markers.settle(tree, target, &markers.loaded, &markers.error);
        });
        tree.add_event_listener(element, EventKind::Error, move |tree, target| {
            on_error.settle(tree, target, &on_error.error, &on_error.loaded);
        });
    }

    /// Load every element in the watch set now
    pub fn load_all_immediately(&mut self, document: &mut Document) {
        let watch: Vec<NodeId> = self.watch_set().collect();
        tracing::debug!("lazy loader loading {} elements eagerly", watch.len());
        for node in watch {
            self.load(document, node);
        }
    }

    /// Subscribe to child-list changes under the body (or the whole
    /// document when there is no body). No-op if already subscribed.
    pub fn watch_for_mutations(&mut self, document: &mut Document) {
        if self.subscription.is_some() || self.torn_down {
            return;
        }
        let target = if document.body().is_valid() {
            document.body()
        } else {
            document.tree().root()
        };
        let observer = document.tree_mut().observe_mutations(target, MutationObserverInit {
            child_list: true,
            subtree: true,
            ..Default::default()
        });
        self.subscription = Some(MutationSubscription { observer, target });
    }

    /// Deliver queued mutation records to the loader.
    ///
    /// Removed elements are released first. The whole batch then triggers
    /// at most one scan + observe cycle, and only if an inserted node
    /// carries a pending source or contains one.
    /// Returns whether a re-scan happened.
    pub fn process_mutations(&mut self, document: &mut Document) -> bool {
        let Some(subscription) = self.subscription else {
            return false;
        };
        let records = document.tree_mut().take_records(subscription.observer);

        if records.iter().any(|r| !r.removed_nodes.is_empty()) {
            self.release_disconnected(document);
        }

        let tree = document.tree();
        let needs_update = records
            .iter()
            .filter(|r| r.mutation_type == MutationType::ChildList)
            .flat_map(|r| r.added_nodes.iter().copied())
            .any(|node| {
                has_pending_source(tree, node)
                    || tree
                        .descendants(node)
                        .into_iter()
                        .any(|d| has_pending_source(tree, d))
            });

        if needs_update {
            self.stats.mutation_rescans += 1;
            tracing::debug!("lazy loader: deferred content inserted, re-scanning");
            self.refresh(document);
        }
        needs_update
    }

    /// Re-scan and observe; for callers that changed the document in ways
    /// the mutation subscription may not report
    pub fn refresh(&mut self, document: &mut Document) -> usize {
        if self.torn_down {
            return 0;
        }
        self.scan(document);
        self.observe(document)
    }

    /// Drop elements that left the document from the watch set and the
    /// detector, clearing their loading marker. Returns how many observed
    /// targets were released.
    fn release_disconnected(&mut self, document: &mut Document) -> usize {
        let tree = document.tree_mut();
        self.images.retain(|&n| tree.is_connected(n));
        self.iframes.retain(|&n| tree.is_connected(n));

        let Some(detector) = self.strategy.detector_mut() else {
            return 0;
        };
        let stale: Vec<NodeId> = detector.targets().filter(|&n| !tree.is_connected(n)).collect();
        for &node in &stale {
            detector.unobserve(node);
            tree.remove_class(node, &self.config.loading_class);
        }
        if !stale.is_empty() {
            tracing::debug!("lazy loader released {} removed elements", stale.len());
        }
        self.stats.released += stale.len();
        stale.len()
    }

    /// Disconnect the detector and cancel the mutation subscription.
    /// Idempotent; the loader ignores further work afterwards.
    pub fn teardown(&mut self, document: &mut Document) {
        if let Some(detector) = self.strategy.detector_mut() {
            detector.disconnect();
        }
        if let Some(subscription) = self.subscription.take() {
            document.tree_mut().disconnect_observer(subscription.observer);
        }
        if !self.torn_down {
            tracing::debug!("lazy loader torn down after {} loads", self.stats.loads);
        }
        self.torn_down = true;
    }

    // === Accessors ===

    pub fn config(&self) -> &LazyConfig {
        &self.config
    }

    pub fn strategy_kind(&self) -> StrategyKind {
        self.strategy.kind()
    }

    /// Images and `<source>` elements from the last scan
    pub fn images(&self) -> &[NodeId] {
        &self.images
    }

    /// Frames from the last scan
    pub fn iframes(&self) -> &[NodeId] {
        &self.iframes
    }

    /// Images then frames
    pub fn watch_set(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.images.iter().chain(self.iframes.iter()).copied()
    }

    pub fn is_observing(&self, node: NodeId) -> bool {
        self.strategy.detector().is_some_and(|d| d.is_observing(node))
    }

    pub fn observed_count(&self) -> usize {
        self.strategy.detector().map_or(0, |d| d.observed_count())
    }

    pub fn stats(&self) -> LoaderStats {
        self.stats
    }

    pub fn subscription(&self) -> Option<MutationSubscription> {
        self.subscription
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}

/// Marker class names captured by element listeners
#[derive(Debug, Clone)]
struct Markers {
    loading: String,
    loaded: String,
    error: String,
}

impl Markers {
    fn settle(&self, tree: &mut DomTree, target: NodeId, add: &str, unless: &str) {
        if tree.has_class(target, unless) {
            return;
        }
        tree.remove_class(target, &self.loading);
        tree.add_class(target, add);
    }
}

impl From<&LazyConfig> for Markers {
    fn from(config: &LazyConfig) -> Self {
        Self {
            loading: config.loading_class.clone(),
            loaded: config.loaded_class.clone(),
            error: config.error_class.clone(),
        }
    }
}

fn is_settled(tree: &DomTree, config: &LazyConfig, node: NodeId) -> bool {
    tree.has_class(node, &config.loaded_class) || tree.has_class(node, &config.error_class)
}

fn has_pending_source(tree: &DomTree, node: NodeId) -> bool {
    tree.has_attribute(node, DATA_SRC) || tree.has_attribute(node, DATA_SRCSET)
}

/// Non-empty pending attribute value
fn pending_value(tree: &DomTree, node: NodeId, name: &str) -> Option<String> {
    tree.get_attribute(node, name)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}
