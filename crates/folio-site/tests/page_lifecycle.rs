//! Page lifecycle: open, scroll, insert content, finish fetches, close

use folio_blog::{MemoryStore, ViewCounter};
use folio_dom::{Document, EventKind, NodeId};
use folio_lazy::{Capabilities, LazyConfig, StrategyKind};
use folio_site::{Page, PageOptions};

/// Text line, then five 400px images, one per screen
fn gallery() -> String {
    let mut html = String::from("<!DOCTYPE html><html><body><h1>Gallery</h1>");
    for i in 0..5 {
        html.push_str(&format!(
            r#"<img id="img{i}" data-src="photo-{i}.jpg" height="400" alt="">"#
        ));
    }
    html.push_str(r#"<iframe id="map" data-src="map.html" height="300"></iframe></body></html>"#);
    html
}

fn options(height: f32) -> PageOptions {
    PageOptions {
        viewport_width: 800.0,
        viewport_height: height,
        ..Default::default()
    }
}

fn open(url: &str, options: PageOptions) -> Page {
    let document = folio_html::parse_with_url(&gallery(), url).unwrap();
    Page::open(document, options).unwrap()
}

fn by_id(page: &Page, id: &str) -> NodeId {
    page.document().get_element_by_id(id).unwrap()
}

fn has_class(page: &Page, id: &str, class: &str) -> bool {
    page.document().tree().has_class(by_id(page, id), class)
}

#[test]
fn test_first_screen_loads_on_open() {
    let page = open("https://blog.example/gallery/", options(400.0));

    // Viewport 0..400 grown to -200..600: img0 (24..424) and img1 (424..824)
    assert!(page.document().tree().has_attribute(by_id(&page, "img0"), "src"));
    assert!(page.document().tree().has_attribute(by_id(&page, "img1"), "src"));
    assert!(has_class(&page, "img2", "lazy-loading"));
    assert_eq!(page.loader().stats().loads, 2);
}

#[test]
fn test_scrolling_loads_progressively() {
    let mut page = open("https://blog.example/gallery/", options(400.0));
    page.complete_fetches(EventKind::Load);

    assert_eq!(page.scroll_to(1000.0), 2);
    assert!(!has_class(&page, "img2", "lazy-loading"));

    // Back up: nothing loads twice
    assert_eq!(page.scroll_to(0.0), 0);

    // Root 1600..2400 reaches the last image and the map
    assert_eq!(page.scroll_to(1800.0), 2);
    page.complete_fetches(EventKind::Load);

    let document = page.close();
    let tree = document.tree();
    for id in ["img0", "img1", "img2", "img3", "img4", "map"] {
        let node = document.get_element_by_id(id).unwrap();
        assert!(tree.has_class(node, "lazy-loaded"), "{id} not loaded");
        assert!(!tree.has_class(node, "lazy-loading"));
        assert!(!tree.has_attribute(node, "data-src"));
    }
}

#[test]
fn test_failed_fetches_get_error_marker() {
    let mut page = open("https://blog.example/gallery/", options(400.0));
    let settled = page.complete_fetches_with(|tree, node| {
        if tree.get_attribute(node, "id") == Some("img1") {
            EventKind::Error
        } else {
            EventKind::Load
        }
    });
    assert_eq!(settled, 2);
    assert!(has_class(&page, "img0", "lazy-loaded"));
    assert!(has_class(&page, "img1", "lazy-error"));

    // Already settled elements are not in flight any more
    assert_eq!(page.complete_fetches(EventKind::Error), 0);
    assert!(!has_class(&page, "img0", "lazy-error"));
}

#[test]
fn test_inserted_content_is_loaded_when_visible() {
    let mut page = open("https://blog.example/gallery/", options(400.0));

    let body = page.document().body();
    let tree = page.document_mut().tree_mut();
    let late = tree.create_element("img");
    tree.set_attribute(late, "data-src", "late.jpg");
    tree.set_attribute(late, "height", "10");
    tree.append_child(body, late);

    assert!(page.pump_mutations());
    assert!(page.loader().images().contains(&late));

    // Far below the fold until the page scrolls
    assert!(page.document().tree().has_class(late, "lazy-loading"));
    page.scroll_to(2400.0);
    assert_eq!(page.document().tree().get_attribute(late, "src"), Some("late.jpg"));

    page.complete_fetches(EventKind::Load);
    assert!(page.document().tree().has_class(late, "lazy-loaded"));
}

#[test]
fn test_empty_source_is_never_fetched() {
    let html = r#"<html><body><img id="e" data-src=""></body></html>"#;
    let document = folio_html::parse_with_url(html, "https://blog.example/empty/").unwrap();
    let mut page = Page::open(document, PageOptions::default()).unwrap();

    let node = by_id(&page, "e");
    assert!(!page.document().tree().has_attribute(node, "data-src"));
    assert!(!page.document().tree().has_attribute(node, "src"));

    assert_eq!(page.complete_fetches(EventKind::Load), 0);
    assert!(!has_class(&page, "e", "lazy-loaded"));
    assert!(!has_class(&page, "e", "lazy-error"));
}

#[test]
fn test_eager_page() {
    let options = PageOptions {
        capabilities: Capabilities::without_intersection_observer(),
        ..options(400.0)
    };
    let mut page = open("https://blog.example/gallery/", options);
    assert_eq!(page.loader().strategy_kind(), StrategyKind::Eager);
    assert_eq!(page.loader().stats().loads, 6);
    assert_eq!(page.complete_fetches(EventKind::Load), 6);
    assert_eq!(page.scroll_to(3000.0), 0);
}

#[test]
fn test_refresh_is_idempotent() {
    let mut page = open("https://blog.example/gallery/", options(400.0));
    let observed = page.loader().observed_count();
    assert_eq!(page.refresh(), 0);
    assert_eq!(page.refresh(), 0);
    assert_eq!(page.loader().observed_count(), observed);
}

#[test]
fn test_invalid_options_fail_to_open() {
    let options = PageOptions {
        lazy: LazyConfig::default().with_root_margin("a lot"),
        ..Default::default()
    };
    assert!(Page::open(Document::default(), options).is_err());
}

#[test]
fn test_count_view_on_post_page() {
    let html = r#"<html><body><span class="blog-views" data-url="/blogs/categories/art/gallery/">-</span></body></html>"#;
    let document = folio_html::parse_with_url(html, "https://blog.example/blogs/categories/art/gallery/").unwrap();
    let mut page = Page::open(document, PageOptions::default()).unwrap();
    let mut counter = ViewCounter::new(MemoryStore::new());

    assert_eq!(page.count_view(&mut counter), Some(1));
    let span = page
        .document()
        .query_selector(&folio_dom::CompoundSelector::class("blog-views").into())
        .unwrap();
    assert_eq!(page.document().tree().text_content(span), "1");
}
