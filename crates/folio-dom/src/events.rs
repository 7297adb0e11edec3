//! DOM Events
//!
//! Resource events delivered to elements by the host environment.

use std::collections::HashMap;
use std::fmt;

use crate::{DomTree, NodeId};

/// Event types an element listener can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Resource finished loading
    Load,
    /// Resource failed to load
    Error,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Error => "error",
        }
    }
}

/// Listener callback. Receives the tree so handlers can update the target.
pub(crate) type Listener = Box<dyn FnMut(&mut DomTree, NodeId)>;

/// Per-node listener table
#[derive(Default)]
pub(crate) struct ListenerTable {
    by_node: HashMap<NodeId, Vec<(EventKind, Listener)>>,
}

impl ListenerTable {
    pub(crate) fn add(&mut self, node: NodeId, kind: EventKind, listener: Listener) {
        self.by_node.entry(node).or_default().push((kind, listener));
    }

    pub(crate) fn count(&self, node: NodeId, kind: EventKind) -> usize {
        self.by_node
            .get(&node)
            .map(|list| list.iter().filter(|(k, _)| *k == kind).count())
            .unwrap_or(0)
    }

    /// Detach a node's listeners for the duration of a dispatch
    pub(crate) fn take(&mut self, node: NodeId) -> Vec<(EventKind, Listener)> {
        self.by_node.remove(&node).unwrap_or_default()
    }

    /// Reattach after dispatch; listeners added during dispatch go last
    pub(crate) fn restore(&mut self, node: NodeId, mut listeners: Vec<(EventKind, Listener)>) {
        if let Some(added) = self.by_node.remove(&node) {
            listeners.extend(added);
        }
        if !listeners.is_empty() {
            self.by_node.insert(node, listeners);
        }
    }
}

impl fmt::Debug for ListenerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total: usize = self.by_node.values().map(Vec::len).sum();
        f.debug_struct("ListenerTable")
            .field("nodes", &self.by_node.len())
            .field("listeners", &total)
            .finish()
    }
}
