//! Intersection detector
//!
//! Tracks observed elements and reports when they cross the configured
//! visibility thresholds relative to the (margin-expanded) viewport.

use std::collections::HashMap;

use folio_dom::{DOMRect, NodeId};

use crate::RootMargin;

/// Detector options
#[derive(Debug, Clone)]
pub struct DetectorOptions {
    /// Margin applied to the viewport before intersecting
    pub root_margin: RootMargin,
    /// Ratios whose crossing triggers an entry
    pub thresholds: Vec<f32>,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            root_margin: RootMargin::ZERO,
            thresholds: vec![0.0],
        }
    }
}

/// Visibility change record
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionEntry {
    pub target: NodeId,
    pub bounding_client_rect: DOMRect,
    pub intersection_rect: DOMRect,
    pub root_bounds: DOMRect,
    pub intersection_ratio: f32,
    pub is_intersecting: bool,
    pub time: f64,
}

/// Last reported state of one target
#[derive(Debug, Clone, Copy, PartialEq)]
struct Reported {
    threshold_index: usize,
    is_intersecting: bool,
}

#[derive(Debug)]
struct Observation {
    target: NodeId,
    last: Option<Reported>,
}

/// Intersection detector
#[derive(Debug)]
pub struct IntersectionDetector {
    options: DetectorOptions,
    /// Targets in registration order
    observed: Vec<Observation>,
    pending_entries: Vec<IntersectionEntry>,
}

impl IntersectionDetector {
    pub fn new(mut options: DetectorOptions) -> Self {
        options.thresholds.retain(|t| (0.0..=1.0).contains(t));
        if options.thresholds.is_empty() {
            options.thresholds.push(0.0);
        }
        options.thresholds.sort_by(f32::total_cmp);
        options.thresholds.dedup();
        Self {
            options,
            observed: Vec::new(),
            pending_entries: Vec::new(),
        }
    }

    pub fn options(&self) -> &DetectorOptions {
        &self.options
    }

    /// Observe an element; returns false if it was already observed
    pub fn observe(&mut self, target: NodeId) -> bool {
        if self.is_observing(target) {
            return false;
        }
        self.observed.push(Observation { target, last: None });
        true
    }

    /// Stop observing; drops queued entries for the target
    pub fn unobserve(&mut self, target: NodeId) -> bool {
        let before = self.observed.len();
        self.observed.retain(|o| o.target != target);
        self.pending_entries.retain(|e| e.target != target);
        self.observed.len() != before
    }

    /// Stop observing everything
    pub fn disconnect(&mut self) {
        self.observed.clear();
        self.pending_entries.clear();
    }

    pub fn is_observing(&self, target: NodeId) -> bool {
        self.observed.iter().any(|o| o.target == target)
    }

    /// Observed targets in registration order
    pub fn targets(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.observed.iter().map(|o| o.target)
    }

    pub fn observed_count(&self) -> usize {
        self.observed.len()
    }

    /// Compute intersections against `viewport` and queue entries for every
    /// target whose state changed since its last report. The first check
    /// after `observe` always reports. Targets without a rect are skipped.
    pub fn check_intersections(
        &mut self,
        viewport: DOMRect,
        element_rects: &HashMap<NodeId, DOMRect>,
        time: f64,
    ) {
        let root = self.options.root_margin.apply(viewport);
        let thresholds = &self.options.thresholds;

        for observation in &mut self.observed {
            let Some(rect) = element_rects.get(&observation.target) else {
                continue;
            };

            let intersection = rect.intersect(&root);
            let ratio = match intersection {
                Some(i) if rect.area() > 0.0 => i.area() / rect.area(),
                // A zero-area target inside the root counts as fully visible
                Some(_) => 1.0,
                None => 0.0,
            };
            let is_intersecting = intersection.is_some();
            let state = Reported {
                threshold_index: thresholds.iter().filter(|&&t| ratio >= t).count(),
                is_intersecting,
            };

            if observation.last == Some(state) {
                continue;
            }
            observation.last = Some(state);

            self.pending_entries.push(IntersectionEntry {
                target: observation.target,
                bounding_client_rect: *rect,
                intersection_rect: intersection.unwrap_or_default(),
                root_bounds: root,
                intersection_ratio: ratio,
                is_intersecting,
                time,
            });
        }
    }

    /// Take pending entries in the order they were queued
    pub fn take_entries(&mut self) -> Vec<IntersectionEntry> {
        std::mem::take(&mut self.pending_entries)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending_entries.is_empty()
    }
}
