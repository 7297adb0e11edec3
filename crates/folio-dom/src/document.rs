//! Document - High-level document API

use url::Url;

use crate::{CompoundSelector, DomTree, NodeId, SelectorList};

/// HTML Document
#[derive(Debug)]
pub struct Document {
    /// The DOM tree
    pub tree: DomTree,
    /// Document URL as given
    url: String,
    /// Parsed URL; `None` for relative or malformed input
    location: Option<Url>,
    /// Cached reference to <html> element
    html_element: NodeId,
    /// Cached reference to <head> element
    head_element: NodeId,
    /// Cached reference to <body> element
    body_element: NodeId,
}

impl Document {
    /// Create a new document with html/head/body
    pub fn new(url: &str) -> Self {
        let mut tree = DomTree::new();

        let html = tree.create_element("html");
        let head = tree.create_element("head");
        let body = tree.create_element("body");

        tree.append_child(tree.root(), html);
        tree.append_child(html, head);
        tree.append_child(html, body);

        Self {
            tree,
            url: url.to_string(),
            location: Url::parse(url).ok(),
            html_element: html,
            head_element: head,
            body_element: body,
        }
    }

    /// Create an empty document (no structure)
    pub fn empty(url: &str) -> Self {
        Self {
            tree: DomTree::new(),
            url: url.to_string(),
            location: Url::parse(url).ok(),
            html_element: NodeId::NONE,
            head_element: NodeId::NONE,
            body_element: NodeId::NONE,
        }
    }

    /// Locate html/head/body after the tree was built externally
    pub fn finalize(&mut self) {
        let root = self.tree.root();
        self.html_element = self.find_child_element(root, "html").unwrap_or(NodeId::NONE);
        if self.html_element.is_valid() {
            self.head_element = self
                .find_child_element(self.html_element, "head")
                .unwrap_or(NodeId::NONE);
            self.body_element = self
                .find_child_element(self.html_element, "body")
                .unwrap_or(NodeId::NONE);
        }
    }

    fn find_child_element(&self, parent: NodeId, tag: &str) -> Option<NodeId> {
        self.tree
            .children(parent)
            .find(|(_, node)| node.as_element().is_some_and(|e| e.tag == tag))
            .map(|(id, _)| id)
    }

    /// Get document URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Path component of the document URL.
    ///
    /// A relative URL is treated as a path with any query or fragment cut off.
    pub fn path(&self) -> &str {
        match &self.location {
            Some(location) => location.path(),
            None => self.url.split(['?', '#']).next().unwrap_or(&self.url),
        }
    }

    /// Get document title
    pub fn title(&self) -> String {
        if !self.head_element.is_valid() {
            return String::new();
        }
        self.find_child_element(self.head_element, "title")
            .map(|title| self.tree.text_content(title))
            .unwrap_or_default()
    }

    /// Get <html> element
    pub fn document_element(&self) -> NodeId {
        self.html_element
    }

    /// Get <head> element
    pub fn head(&self) -> NodeId {
        self.head_element
    }

    /// Get <body> element
    pub fn body(&self) -> NodeId {
        self.body_element
    }

    /// Get element by ID
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.query_selector(&CompoundSelector::any().with_id(id).into())
    }

    /// First element in the document matching the selector
    pub fn query_selector(&self, selector: &SelectorList) -> Option<NodeId> {
        self.tree.query_selector(self.tree.root(), selector)
    }

    /// Every element in the document matching the selector
    pub fn query_selector_all(&self, selector: &SelectorList) -> Vec<NodeId> {
        self.tree.query_selector_all(self.tree.root(), selector)
    }

    /// Access the DOM tree
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Access the DOM tree mutably
    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("about:blank")
    }
}
