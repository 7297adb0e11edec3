//! Folio DOM - Document Object Model
//!
//! Arena-based DOM tree with the pieces the blog scripts lean on:
//! attributes and class lists, simple selectors, `load`/`error` listeners,
//! inline style properties and mutation observers.

mod node;
mod tree;
mod document;
mod classlist;
mod selector;
mod events;
mod observer;
mod geometry;
mod style;

pub use node::{Attribute, ElementData, Node, NodeData};
pub use tree::DomTree;
pub use document::Document;
pub use classlist::DOMTokenList;
pub use selector::{AttrSelector, ComplexSelector, CompoundSelector, SelectorError, SelectorList};
pub use events::EventKind;
pub use observer::{MutationObserverId, MutationObserverInit, MutationRecord, MutationType};
pub use geometry::DOMRect;

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Root (document) node ID
    pub const ROOT: NodeId = NodeId(0);

    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check if this ID refers to a node
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}
