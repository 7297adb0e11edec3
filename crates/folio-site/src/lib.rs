//! Folio Site
//!
//! Wires the pieces together for one page: parse, lay out, run the lazy
//! loader against a scrolling viewport, and tear everything down on close.

mod layout;
mod page;

pub use layout::{FlowLayout, LayoutResult, DEFAULT_MEDIA_HEIGHT, LINE_HEIGHT};
pub use page::{Page, PageError, PageOptions};

/// Folio version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
