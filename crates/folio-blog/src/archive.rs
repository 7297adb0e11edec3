//! Archive year filter

use folio_dom::{CompoundSelector, Document, SelectorList};

/// Show the `.timeline-year` block whose `h3` reads `year` and hide the
/// rest. Blocks without a heading are left alone. Returns how many blocks
/// are shown.
pub fn filter_archive_by_year(document: &mut Document, year: &str) -> usize {
    let blocks = document.query_selector_all(&CompoundSelector::class("timeline-year").into());
    let heading: SelectorList = CompoundSelector::tag("h3").into();

    let mut shown = 0;
    for block in blocks {
        let tree = document.tree_mut();
        let Some(h3) = tree.query_selector(block, &heading) else {
            continue;
        };
        if tree.text_content(h3).trim() == year {
            tree.set_style_property(block, "display", "block");
            shown += 1;
        } else {
            tree.set_style_property(block, "display", "none");
        }
    }

    tracing::debug!("archive filtered to {}: {} year blocks shown", year, shown);
    shown
}
