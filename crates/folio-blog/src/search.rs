//! Post search
//!
//! Filters the post cards already on the page by a free-text query. There is
//! no index: every card's title, first paragraph and badges are compared
//! with the query on each call.

use folio_dom::{CompoundSelector, Document, DomTree, NodeId, SelectorList};

/// Shorter queries show every card
pub const MIN_QUERY_LEN: usize = 2;

const SEARCH_INPUT_ID: &str = "blog-search";
const MESSAGE_ID: &str = "search-results-message";

/// Result of running a query over the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    pub query: String,
    /// Cards matching the query
    pub matched: Vec<NodeId>,
    /// Cards looked at
    pub total: usize,
}

impl SearchOutcome {
    pub fn count(&self) -> usize {
        self.matched.len()
    }

    /// `Found 2 results for "rust"`
    pub fn message(&self) -> String {
        let count = self.count();
        let plural = if count == 1 { "" } else { "s" };
        format!("Found {count} result{plural} for \"{}\"", self.query)
    }
}

fn card_selector() -> SelectorList {
    SelectorList::of([
        CompoundSelector::class("blog-item"),
        CompoundSelector::class("blog-card"),
    ])
}

fn set_visible(tree: &mut DomTree, card: NodeId, visible: bool) {
    let (display, opacity) = if visible { ("block", "1") } else { ("none", "0.5") };
    tree.set_style_property(card, "display", display);
    tree.set_style_property(card, "opacity", opacity);
}

fn card_matches(tree: &DomTree, card: NodeId, needle: &str) -> bool {
    let heading = SelectorList::of([CompoundSelector::tag("h5"), CompoundSelector::tag("h6")]);
    let paragraph: SelectorList = CompoundSelector::tag("p").into();
    let badge: SelectorList = CompoundSelector::class("badge").into();

    let contains = |node: Option<NodeId>| {
        node.is_some_and(|n| tree.text_content(n).to_lowercase().contains(needle))
    };

    contains(tree.query_selector(card, &heading))
        || contains(tree.query_selector(card, &paragraph))
        || tree
            .query_selector_all(card, &badge)
            .into_iter()
            .any(|b| contains(Some(b)))
}

/// Make every card visible again
pub fn show_all_posts(document: &mut Document) -> usize {
    let cards = document.query_selector_all(&card_selector());
    let tree = document.tree_mut();
    for &card in &cards {
        set_visible(tree, card, true);
    }
    cards.len()
}

/// Show the cards matching `query`, hide the others.
///
/// `None` means the query was too short and every card is shown instead.
pub fn search_posts(document: &mut Document, query: &str) -> Option<SearchOutcome> {
    let query = query.trim();
    if query.chars().count() < MIN_QUERY_LEN {
        show_all_posts(document);
        return None;
    }

    let needle = query.to_lowercase();
    let cards = document.query_selector_all(&card_selector());
    let matched: Vec<NodeId> = cards
        .iter()
        .copied()
        .filter(|&card| card_matches(document.tree(), card, &needle))
        .collect();

    let tree = document.tree_mut();
    for &card in &cards {
        set_visible(tree, card, matched.contains(&card));
    }

    tracing::debug!("search {:?}: {} of {} cards", query, matched.len(), cards.len());
    Some(SearchOutcome {
        query: query.to_string(),
        matched,
        total: cards.len(),
    })
}

/// Run a search and keep the page's results message in step with it.
///
/// The message element is created next to the search box on first use
/// (inside the input's grandparent) and hidden again for short queries.
/// Pages without a `#blog-search` input get no message.
pub fn apply_search(document: &mut Document, query: &str) -> Option<SearchOutcome> {
    let outcome = search_posts(document, query);
    match &outcome {
        Some(outcome) => {
            if let Some(message) = message_element(document) {
                let tree = document.tree_mut();
                tree.set_text_content(message, &outcome.message());
                tree.set_style_property(message, "display", "block");
            }
        }
        None => {
            if let Some(message) = document.get_element_by_id(MESSAGE_ID) {
                document.tree_mut().set_style_property(message, "display", "none");
            }
        }
    }
    outcome
}

fn message_element(document: &mut Document) -> Option<NodeId> {
    if let Some(existing) = document.get_element_by_id(MESSAGE_ID) {
        return Some(existing);
    }
    let input = document.get_element_by_id(SEARCH_INPUT_ID)?;
    let tree = document.tree_mut();
    let container = tree.parent(tree.parent(input));
    if tree.element(container).is_none() {
        return None;
    }

    let message = tree.create_element("div");
    tree.set_attribute(message, "id", MESSAGE_ID);
    tree.set_attribute(message, "class", "alert alert-info mt-3");
    tree.append_child(container, message);
    Some(message)
}
