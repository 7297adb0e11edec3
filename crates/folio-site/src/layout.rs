//! Flow Layout
//!
//! Block-only layout: every box spans the viewport width and stacks below the
//! previous one. Enough to give the intersection detector believable
//! positions without a style engine.

use std::collections::HashMap;

use folio_dom::{DOMRect, DomTree, NodeData, NodeId};

/// Height of an image or frame without a `height` attribute
pub const DEFAULT_MEDIA_HEIGHT: f32 = 150.0;

/// Height of one text run
pub const LINE_HEIGHT: f32 = 24.0;

/// Element boxes in document coordinates
#[derive(Debug, Clone, Default)]
pub struct LayoutResult {
    rects: HashMap<NodeId, DOMRect>,
    content_height: f32,
}

impl LayoutResult {
    pub fn rects(&self) -> &HashMap<NodeId, DOMRect> {
        &self.rects
    }

    pub fn get(&self, node: NodeId) -> Option<DOMRect> {
        self.rects.get(&node).copied()
    }

    /// Total height of the laid out content
    pub fn content_height(&self) -> f32 {
        self.content_height
    }
}

/// Block flow layout
#[derive(Debug, Clone, Copy)]
pub struct FlowLayout {
    width: f32,
}

impl FlowLayout {
    pub fn new(width: f32) -> Self {
        Self { width }
    }

    /// Lay out `root`'s subtree starting at y = 0
    pub fn layout(&self, tree: &DomTree, root: NodeId) -> LayoutResult {
        let mut result = LayoutResult::default();
        let mut y = 0.0;
        self.layout_node(tree, root, &mut y, &mut result.rects);
        result.content_height = y;
        result
    }

    fn layout_node(&self, tree: &DomTree, node: NodeId, y: &mut f32, rects: &mut HashMap<NodeId, DOMRect>) {
        let Some(data) = tree.get(node).map(|n| &n.data) else {
            return;
        };

        match data {
            NodeData::Text(_) => *y += LINE_HEIGHT,
            NodeData::Element(elem) => {
                if tree.style_property(node, "display").as_deref() == Some("none") {
                    return;
                }
                let top = *y;
                match elem.tag.as_str() {
                    "img" | "iframe" => {
                        let height = elem
                            .get_attr("height")
                            .and_then(|h| h.trim().trim_end_matches("px").parse::<f32>().ok())
                            .filter(|h| *h >= 0.0)
                            .unwrap_or(DEFAULT_MEDIA_HEIGHT);
                        *y += height;
                    }
                    // Selected sources render through their <img>
                    "source" => {}
                    "head" | "script" | "style" | "title" | "meta" | "link" => return,
                    _ => {
                        for (child, _) in tree.children(node) {
                            self.layout_node(tree, child, y, rects);
                        }
                    }
                }
                rects.insert(node, DOMRect::new(0.0, top, self.width, *y - top));
            }
            NodeData::Document => {
                for (child, _) in tree.children(node) {
                    self.layout_node(tree, child, y, rects);
                }
            }
            NodeData::Doctype { .. } | NodeData::Comment(_) => {}
        }
    }
}
