//! DOM Tree (arena-based allocation)
//!
//! All structural and attribute changes go through `DomTree` so they can be
//! reported to mutation observers.

use crate::events::{ListenerTable, Listener};
use crate::observer::{is_inclusive_ancestor, ObserverRegistry};
use crate::style;
use crate::{
    ElementData, EventKind, MutationObserverId, MutationObserverInit, MutationRecord, Node,
    NodeData, NodeId, SelectorList,
};

/// Arena-based DOM tree
#[derive(Debug)]
pub struct DomTree {
    nodes: Vec<Node>,
    listeners: ListenerTable,
    observers: ObserverRegistry,
}

impl DomTree {
    /// Create a tree holding only the document node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::document()],
            listeners: ListenerTable::default(),
            observers: ObserverRegistry::default(),
        }
    }

    /// Document node
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// Element data for an element node
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id)?.as_element()
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.get_mut(id)?.as_element_mut()
    }

    /// Number of nodes in the tree (including detached ones)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Only the document node exists
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(Node::element(tag))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(Node::text(text))
    }

    /// Create a detached comment
    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(Node::comment(text))
    }

    /// Create a detached doctype
    pub fn create_doctype(&mut self, name: &str) -> NodeId {
        self.push(Node::doctype(name))
    }

    // === Structure ===

    pub fn parent(&self, id: NodeId) -> NodeId {
        self.get(id).map(|n| n.parent).unwrap_or(NodeId::NONE)
    }

    /// Check whether `ancestor` is `node` or one of its ancestors
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        is_inclusive_ancestor(&self.nodes, ancestor, node)
    }

    /// Check whether the node is reachable from the document node
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.contains(NodeId::ROOT, id)
    }

    /// Append `child` as the last child of `parent`, detaching it first.
    ///
    /// Returns false (and changes nothing) when either node is missing or
    /// the append would create a cycle.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if self.get(parent).is_none() || self.get(child).is_none() || self.contains(child, parent) {
            return false;
        }

        let old_parent = self.parent(child);
        if old_parent.is_valid() {
            self.remove_child(old_parent, child);
        }

        let last = self.nodes[parent.index()].last_child;
        {
            let node = &mut self.nodes[child.index()];
            node.parent = parent;
            node.prev_sibling = last;
            node.next_sibling = NodeId::NONE;
        }
        if last.is_valid() {
            self.nodes[last.index()].next_sibling = child;
        } else {
            self.nodes[parent.index()].first_child = child;
        }
        self.nodes[parent.index()].last_child = child;

        self.queue_record(MutationRecord::child_list(parent, vec![child], Vec::new()));
        true
    }

    /// Detach `child` from `parent`
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if !parent.is_valid() || self.parent(child) != parent {
            return false;
        }

        let (prev, next) = {
            let node = &self.nodes[child.index()];
            (node.prev_sibling, node.next_sibling)
        };
        if prev.is_valid() {
            self.nodes[prev.index()].next_sibling = next;
        } else {
            self.nodes[parent.index()].first_child = next;
        }
        if next.is_valid() {
            self.nodes[next.index()].prev_sibling = prev;
        } else {
            self.nodes[parent.index()].last_child = prev;
        }
        {
            let node = &mut self.nodes[child.index()];
            node.parent = NodeId::NONE;
            node.prev_sibling = NodeId::NONE;
            node.next_sibling = NodeId::NONE;
        }

        self.queue_record(MutationRecord::child_list(parent, Vec::new(), vec![child]));
        true
    }

    /// Iterate over direct children
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.get(id).map(|n| n.first_child).unwrap_or(NodeId::NONE),
        }
    }

    /// All descendants in document (pre-)order, excluding `id` itself
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).map(|(c, _)| c).collect();
        stack.reverse();
        while let Some(node) = stack.pop() {
            out.push(node);
            let start = stack.len();
            stack.extend(self.children(node).map(|(c, _)| c));
            stack[start..].reverse();
        }
        out
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.get(id).and_then(Node::as_text) {
            return text.to_string();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|d| self.get(d).and_then(Node::as_text))
            .collect()
    }

    /// Replace all children with a single text node
    pub fn set_text_content(&mut self, id: NodeId, text: &str) {
        if self.element(id).is_none() {
            if let Some(NodeData::Text(content)) = self.get_mut(id).map(|n| &mut n.data) {
                let old = std::mem::replace(content, text.to_string());
                self.queue_record(MutationRecord::character_data(id, Some(old)));
            }
            return;
        }
        let children: Vec<NodeId> = self.children(id).map(|(c, _)| c).collect();
        for child in children {
            self.remove_child(id, child);
        }
        if !text.is_empty() {
            let node = self.create_text(text);
            self.append_child(id, node);
        }
    }

    // === Queries ===

    /// Lowercase tag name of an element
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.tag.as_str())
    }

    /// Check if an element matches a selector
    pub fn matches(&self, id: NodeId, selector: &SelectorList) -> bool {
        selector.matches(self, id)
    }

    /// First descendant element matching the selector
    pub fn query_selector(&self, root: NodeId, selector: &SelectorList) -> Option<NodeId> {
        self.descendants(root)
            .into_iter()
            .find(|&n| selector.matches(self, n))
    }

    /// All descendant elements matching the selector, in document order
    pub fn query_selector_all(&self, root: NodeId, selector: &SelectorList) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|&n| selector.matches(self, n))
            .collect()
    }

    // === Attributes ===

    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.get_attr(name)
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.element(id).is_some_and(|e| e.has_attr(name))
    }

    /// Set an attribute; returns false if `id` is not an element
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> bool {
        let Some(elem) = self.element_mut(id) else {
            return false;
        };
        let old = elem.set_attr(name, value);
        self.queue_record(MutationRecord::attribute(id, &name.to_ascii_lowercase(), old));
        true
    }

    /// Remove an attribute, returning its old value
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<String> {
        let old = self.element_mut(id)?.remove_attr(name)?;
        self.queue_record(MutationRecord::attribute(id, &name.to_ascii_lowercase(), Some(old.clone())));
        Some(old)
    }

    // === Class list ===

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element(id).is_some_and(|e| e.class_list.contains(class))
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) -> bool {
        self.update_classes(id, |list| list.add(&[class]))
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) -> bool {
        self.update_classes(id, |list| list.remove(&[class]))
    }

    fn update_classes(
        &mut self,
        id: NodeId,
        f: impl FnOnce(&mut crate::DOMTokenList) -> bool,
    ) -> bool {
        let Some(elem) = self.element_mut(id) else {
            return false;
        };
        if !f(&mut elem.class_list) {
            return false;
        }
        let old = elem.sync_class_attr();
        self.queue_record(MutationRecord::attribute(id, "class", old));
        true
    }

    // === Inline style ===

    /// Value of one inline style property
    pub fn style_property(&self, id: NodeId, prop: &str) -> Option<String> {
        let style_attr = self.get_attribute(id, "style")?;
        style::parse_declarations(style_attr)
            .into_iter()
            .find(|(p, _)| p.eq_ignore_ascii_case(prop))
            .map(|(_, v)| v)
    }

    /// Set one inline style property, keeping the others
    pub fn set_style_property(&mut self, id: NodeId, prop: &str, value: &str) -> bool {
        let current = self.get_attribute(id, "style").unwrap_or_default();
        let updated = style::with_property(current, prop, value);
        self.set_attribute(id, "style", &updated)
    }

    // === Events ===

    /// Register a listener for `kind` on `node`
    pub fn add_event_listener<F>(&mut self, node: NodeId, kind: EventKind, listener: F)
    where
        F: FnMut(&mut DomTree, NodeId) + 'static,
    {
        let listener: Listener = Box::new(listener);
        self.listeners.add(node, kind, listener);
    }

    /// Number of listeners of `kind` on `node`
    pub fn listener_count(&self, node: NodeId, kind: EventKind) -> usize {
        self.listeners.count(node, kind)
    }

    /// Run the listeners for `kind` on `node` in registration order.
    ///
    /// Returns how many listeners ran.
    pub fn dispatch_event(&mut self, node: NodeId, kind: EventKind) -> usize {
        let mut listeners = self.listeners.take(node);
        let mut ran = 0;
        for (k, listener) in listeners.iter_mut() {
            if *k == kind {
                listener(self, node);
                ran += 1;
            }
        }
        self.listeners.restore(node, listeners);
        tracing::trace!("dispatched {} to {:?} ({} listeners)", kind.as_str(), node, ran);
        ran
    }

    // === Mutation observers ===

    /// Register a mutation observer on `target`
    pub fn observe_mutations(&mut self, target: NodeId, options: MutationObserverInit) -> MutationObserverId {
        self.observers.register(target, options)
    }

    /// Stop an observer; returns false if it was not registered
    pub fn disconnect_observer(&mut self, id: MutationObserverId) -> bool {
        self.observers.disconnect(id)
    }

    pub fn is_observer_registered(&self, id: MutationObserverId) -> bool {
        self.observers.is_registered(id)
    }

    /// Drain an observer's queued records in mutation order
    pub fn take_records(&mut self, id: MutationObserverId) -> Vec<MutationRecord> {
        self.observers.take_records(id)
    }

    pub fn has_pending_records(&self, id: MutationObserverId) -> bool {
        self.observers.has_pending(id)
    }

    fn queue_record(&mut self, record: MutationRecord) {
        if !self.observers.is_empty() {
            self.observers.queue(record, &self.nodes);
        }
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over a node's children
pub struct Children<'a> {
    tree: &'a DomTree,
    next: NodeId,
}

impl<'a> Iterator for Children<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next;
        let node = self.tree.get(id)?;
        self.next = node.next_sibling;
        Some((id, node))
    }
}
