//! Load strategies
//!
//! Chosen once when the loader is built, based on what the host supports.

use crate::{DetectorOptions, IntersectionDetector, RootMargin};

/// Host facilities available to the loader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Host can report viewport intersections
    pub intersection_observer: bool,
}

impl Capabilities {
    /// Host without intersection reporting
    pub fn without_intersection_observer() -> Self {
        Self {
            intersection_observer: false,
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            intersection_observer: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    /// Load when elements approach the viewport
    Proximity,
    /// Load everything as soon as it is found
    Eager,
}

/// How deferred elements get triggered
#[derive(Debug)]
pub enum LoadStrategy {
    Proximity(IntersectionDetector),
    Eager,
}

impl LoadStrategy {
    pub fn select(capabilities: Capabilities, root_margin: RootMargin, threshold: f32) -> Self {
        if capabilities.intersection_observer {
            Self::Proximity(IntersectionDetector::new(DetectorOptions {
                root_margin,
                thresholds: vec![threshold],
            }))
        } else {
            Self::Eager
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::Proximity(_) => StrategyKind::Proximity,
            Self::Eager => StrategyKind::Eager,
        }
    }

    pub fn detector(&self) -> Option<&IntersectionDetector> {
        match self {
            Self::Proximity(detector) => Some(detector),
            Self::Eager => None,
        }
    }

    pub fn detector_mut(&mut self) -> Option<&mut IntersectionDetector> {
        match self {
            Self::Proximity(detector) => Some(detector),
            Self::Eager => None,
        }
    }
}
