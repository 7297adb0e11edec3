//! HTML5 Parser implementation
//!
//! Parses with html5ever's RcDom and converts the result into a Folio
//! `Document`.

use folio_dom::{Document, DomTree, NodeId};
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};

use crate::HtmlError;

/// HTML5 parser
#[derive(Debug, Default)]
pub struct HtmlParser {
    keep_comments: bool,
}

impl HtmlParser {
    /// Create a new HTML parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep comment nodes in the converted tree
    pub fn keep_comments(mut self, keep: bool) -> Self {
        self.keep_comments = keep;
        self
    }

    /// Parse HTML string into a Document
    pub fn parse(&self, html: &str) -> Result<Document, HtmlError> {
        self.parse_with_url(html, "about:blank")
    }

    /// Parse HTML with a base URL
    pub fn parse_with_url(&self, html: &str, url: &str) -> Result<Document, HtmlError> {
        tracing::debug!("Parsing HTML document: {}", url);

        let dom = parse_document(RcDom::default(), Default::default())
            .from_utf8()
            .read_from(&mut html.as_bytes())?;

        let mut document = Document::empty(url);
        let root = document.tree().root();
        self.convert_node(&dom.document, document.tree_mut(), root);
        document.finalize();

        tracing::debug!("Parsed {} nodes", document.tree().len());
        Ok(document)
    }

    /// Convert an RcDom node (and its subtree) into the Folio tree
    fn convert_node(&self, handle: &Handle, tree: &mut DomTree, parent: NodeId) {
        match &handle.data {
            RcNodeData::Document => {
                for child in handle.children.borrow().iter() {
                    self.convert_node(child, tree, parent);
                }
            }
            RcNodeData::Doctype { name, .. } => {
                let id = tree.create_doctype(&**name);
                tree.append_child(parent, id);
            }
            RcNodeData::Text { contents } => {
                let text = contents.borrow();
                if !text.trim().is_empty() {
                    let id = tree.create_text(&**text);
                    tree.append_child(parent, id);
                }
            }
            RcNodeData::Comment { contents } => {
                if self.keep_comments {
                    let id = tree.create_comment(&**contents);
                    tree.append_child(parent, id);
                }
            }
            RcNodeData::Element { name, attrs, .. } => {
                let id = tree.create_element(name.local.as_ref());
                for attr in attrs.borrow().iter() {
                    tree.set_attribute(id, attr.name.local.as_ref(), &*attr.value);
                }
                tree.append_child(parent, id);

                for child in handle.children.borrow().iter() {
                    self.convert_node(child, tree, id);
                }
            }
            RcNodeData::ProcessingInstruction { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let html = "<html><head><title>Notes</title></head><body><p>Hello</p></body></html>";
        let doc = HtmlParser::new().parse(html).unwrap();

        assert!(doc.body().is_valid());
        assert_eq!(doc.title(), "Notes");
    }

    #[test]
    fn test_parse_fragment_gets_wrapped() {
        let doc = HtmlParser::new().parse("<div><span>Text</span></div>").unwrap();
        assert!(doc.body().is_valid());
        assert_eq!(doc.tree().text_content(doc.body()), "Text");
    }

    #[test]
    fn test_comments_dropped_by_default() {
        let html = "<body><!-- hidden --><p>a</p></body>";
        let plain = HtmlParser::new().parse(html).unwrap();
        let with_comments = HtmlParser::new().keep_comments(true).parse(html).unwrap();
        assert_eq!(with_comments.tree().len(), plain.tree().len() + 1);
    }
}
