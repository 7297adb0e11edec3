//! Mutation Observer API
//!
//! Observe DOM changes. The tree queues records for every registered
//! observer whose target covers the mutated node; the owner of the
//! observer drains them with `DomTree::take_records`.

use crate::{Node, NodeId};

/// Mutation type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationType {
    Attributes,
    CharacterData,
    ChildList,
}

/// Mutation record
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRecord {
    pub mutation_type: MutationType,
    pub target: NodeId,
    pub added_nodes: Vec<NodeId>,
    pub removed_nodes: Vec<NodeId>,
    pub attribute_name: Option<String>,
    pub old_value: Option<String>,
}

impl MutationRecord {
    pub fn child_list(target: NodeId, added: Vec<NodeId>, removed: Vec<NodeId>) -> Self {
        Self {
            mutation_type: MutationType::ChildList,
            target,
            added_nodes: added,
            removed_nodes: removed,
            attribute_name: None,
            old_value: None,
        }
    }

    pub fn attribute(target: NodeId, name: &str, old_value: Option<String>) -> Self {
        Self {
            mutation_type: MutationType::Attributes,
            target,
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            attribute_name: Some(name.to_string()),
            old_value,
        }
    }

    pub fn character_data(target: NodeId, old_value: Option<String>) -> Self {
        Self {
            mutation_type: MutationType::CharacterData,
            target,
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            attribute_name: None,
            old_value,
        }
    }
}

/// Mutation observer options
#[derive(Debug, Clone, Default)]
pub struct MutationObserverInit {
    pub child_list: bool,
    pub attributes: bool,
    pub character_data: bool,
    pub subtree: bool,
    pub attribute_filter: Option<Vec<String>>,
}

/// Handle to a registered mutation observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MutationObserverId(pub u64);

#[derive(Debug)]
struct Registration {
    id: MutationObserverId,
    target: NodeId,
    options: MutationObserverInit,
    records: Vec<MutationRecord>,
}

impl Registration {
    fn wants(&self, record: &MutationRecord, nodes: &[Node]) -> bool {
        let matches_type = match record.mutation_type {
            MutationType::Attributes => self.options.attributes,
            MutationType::CharacterData => self.options.character_data,
            MutationType::ChildList => self.options.child_list,
        };
        if !matches_type {
            return false;
        }

        if let (Some(filter), Some(attr)) = (&self.options.attribute_filter, &record.attribute_name) {
            if !filter.contains(attr) {
                return false;
            }
        }

        record.target == self.target
            || (self.options.subtree && is_inclusive_ancestor(nodes, self.target, record.target))
    }
}

pub(crate) fn is_inclusive_ancestor(nodes: &[Node], ancestor: NodeId, mut node: NodeId) -> bool {
    while node.is_valid() {
        if node == ancestor {
            return true;
        }
        node = match nodes.get(node.index()) {
            Some(n) => n.parent,
            None => return false,
        };
    }
    false
}

/// All observers registered on one tree
#[derive(Debug, Default)]
pub(crate) struct ObserverRegistry {
    next_id: u64,
    observers: Vec<Registration>,
}

impl ObserverRegistry {
    pub(crate) fn register(&mut self, target: NodeId, options: MutationObserverInit) -> MutationObserverId {
        self.next_id += 1;
        let id = MutationObserverId(self.next_id);
        self.observers.push(Registration {
            id,
            target,
            options,
            records: Vec::new(),
        });
        id
    }

    pub(crate) fn disconnect(&mut self, id: MutationObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|o| o.id != id);
        self.observers.len() != before
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub(crate) fn is_registered(&self, id: MutationObserverId) -> bool {
        self.observers.iter().any(|o| o.id == id)
    }

    pub(crate) fn queue(&mut self, record: MutationRecord, nodes: &[Node]) {
        for observer in &mut self.observers {
            if observer.wants(&record, nodes) {
                observer.records.push(record.clone());
            }
        }
    }

    pub(crate) fn take_records(&mut self, id: MutationObserverId) -> Vec<MutationRecord> {
        self.observers
            .iter_mut()
            .find(|o| o.id == id)
            .map(|o| std::mem::take(&mut o.records))
            .unwrap_or_default()
    }

    pub(crate) fn has_pending(&self, id: MutationObserverId) -> bool {
        self.observers
            .iter()
            .any(|o| o.id == id && !o.records.is_empty())
    }
}
