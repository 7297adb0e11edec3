//! Folio lazy loading
//!
//! Defers fetching of off-screen media. Elements carry their real sources in
//! `data-src`, `data-srcset` and `data-sizes`; the loader promotes them to
//! `src`, `srcset` and `sizes` once the element comes within the proximity
//! margin of the viewport, and tracks progress with marker classes.
//!
//! # Example
//! ```rust,ignore
//! use folio_lazy::{Capabilities, LazyConfig, LazyLoader};
//!
//! let mut loader = LazyLoader::new(&mut document, LazyConfig::default(), Capabilities::default())?;
//! loader.check_viewport(&mut document, viewport, &rects, 0.0);
//! ```

mod config;
mod margin;
mod detector;
mod strategy;
mod loader;

pub use config::{ConfigError, LazyConfig};
pub use margin::{MarginValue, RootMargin};
pub use detector::{DetectorOptions, IntersectionDetector, IntersectionEntry};
pub use strategy::{Capabilities, LoadStrategy, StrategyKind};
pub use loader::{LazyLoader, LoaderStats, MutationSubscription};
