//! Lazy loader behaviour against real documents
//!
//! Each test drives the loader the way a page host would: build it, feed it
//! viewport checks or mutation batches, and play the role of the network by
//! dispatching `load`/`error` events.

use std::collections::HashMap;

use folio_dom::{DOMRect, Document, EventKind, MutationObserverInit, NodeId};
use folio_lazy::{Capabilities, IntersectionEntry, LazyConfig, LazyLoader, StrategyKind};

const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Gallery</title></head>
<body>
  <article>
    <img id="hero" data-src="hero.jpg" data-srcset="hero-2x.jpg 2x" data-sizes="100vw" alt="">
    <picture>
      <source id="webp" data-srcset="photo.webp" type="image/webp">
      <img id="photo" data-src="photo.jpg" alt="">
    </picture>
    <iframe id="video" data-src="https://player.example/embed/1"></iframe>
    <img id="plain" src="logo.png" alt="">
  </article>
</body>
</html>"#;

fn parse_page() -> Document {
    folio_html::parse(PAGE).unwrap()
}

fn by_id(doc: &Document, id: &str) -> NodeId {
    doc.get_element_by_id(id).unwrap()
}

fn intersecting(target: NodeId) -> IntersectionEntry {
    IntersectionEntry {
        target,
        bounding_client_rect: DOMRect::new(0.0, 0.0, 100.0, 100.0),
        intersection_rect: DOMRect::new(0.0, 0.0, 100.0, 100.0),
        root_bounds: DOMRect::new(0.0, -200.0, 800.0, 1000.0),
        intersection_ratio: 1.0,
        is_intersecting: true,
        time: 0.0,
    }
}

const PENDING: [&str; 3] = ["data-src", "data-srcset", "data-sizes"];

// ============================================================================
// DISCOVERY
// ============================================================================

#[test]
fn test_initial_scan_finds_deferred_elements() {
    let mut doc = parse_page();
    let loader = LazyLoader::new(&mut doc, LazyConfig::default(), Capabilities::default()).unwrap();

    let hero = by_id(&doc, "hero");
    let webp = by_id(&doc, "webp");
    let photo = by_id(&doc, "photo");
    let video = by_id(&doc, "video");
    let plain = by_id(&doc, "plain");

    assert_eq!(loader.images(), &[hero, webp, photo]);
    assert_eq!(loader.iframes(), &[video]);
    assert_eq!(loader.observed_count(), 4);
    for node in [hero, webp, photo, video] {
        assert!(doc.tree().has_class(node, "lazy-loading"));
    }
    assert!(!loader.is_observing(plain));
    assert!(!doc.tree().has_class(plain, "lazy-loading"));
}

#[test]
fn test_refresh_twice_changes_nothing() {
    let mut doc = parse_page();
    let mut loader = LazyLoader::new(&mut doc, LazyConfig::default(), Capabilities::default()).unwrap();
    let hero = by_id(&doc, "hero");

    let images = loader.images().to_vec();
    let classes = doc.tree().get_attribute(hero, "class").map(str::to_owned);

    assert_eq!(loader.refresh(&mut doc), 0);
    assert_eq!(loader.refresh(&mut doc), 0);

    assert_eq!(loader.images(), images.as_slice());
    assert_eq!(loader.observed_count(), 4);
    assert_eq!(doc.tree().get_attribute(hero, "class").map(str::to_owned), classes);
}

// ============================================================================
// PROXIMITY LOADING
// ============================================================================

#[test]
fn test_load_promotes_sources_and_strips_pending() {
    let mut doc = parse_page();
    let mut loader = LazyLoader::new(&mut doc, LazyConfig::default(), Capabilities::default()).unwrap();
    let hero = by_id(&doc, "hero");

    assert_eq!(loader.on_proximity_event(&mut doc, vec![intersecting(hero)]), 1);

    let tree = doc.tree();
    assert_eq!(tree.get_attribute(hero, "src"), Some("hero.jpg"));
    assert_eq!(tree.get_attribute(hero, "srcset"), Some("hero-2x.jpg 2x"));
    assert_eq!(tree.get_attribute(hero, "sizes"), Some("100vw"));
    for attr in PENDING {
        assert!(!tree.has_attribute(hero, attr), "{attr} left behind");
    }
    assert!(!tree.has_class(hero, "lazy-loading"));
    assert!(!loader.is_observing(hero));
}

#[test]
fn test_source_and_frame_paths() {
    let mut doc = parse_page();
    let mut loader = LazyLoader::new(&mut doc, LazyConfig::default(), Capabilities::default()).unwrap();
    let webp = by_id(&doc, "webp");
    let video = by_id(&doc, "video");

    loader.on_proximity_event(&mut doc, vec![intersecting(webp), intersecting(video)]);

    let tree = doc.tree();
    assert_eq!(tree.get_attribute(webp, "srcset"), Some("photo.webp"));
    assert!(!tree.has_attribute(webp, "src"));
    assert_eq!(tree.get_attribute(video, "src"), Some("https://player.example/embed/1"));
    assert!(!tree.has_attribute(video, "data-src"));
}

#[test]
fn test_duplicate_proximity_events_load_once() {
    let mut doc = parse_page();
    let mut loader = LazyLoader::new(&mut doc, LazyConfig::default(), Capabilities::default()).unwrap();
    let hero = by_id(&doc, "hero");

    // Same element twice in one batch, then again in a later batch
    assert_eq!(loader.on_proximity_event(&mut doc, vec![intersecting(hero), intersecting(hero)]), 1);
    assert_eq!(loader.on_proximity_event(&mut doc, vec![intersecting(hero)]), 0);
    assert_eq!(loader.stats().loads, 1);
    assert_eq!(doc.tree().listener_count(hero, EventKind::Load), 1);
}

#[test]
fn test_non_intersecting_entries_are_ignored() {
    let mut doc = parse_page();
    let mut loader = LazyLoader::new(&mut doc, LazyConfig::default(), Capabilities::default()).unwrap();
    let hero = by_id(&doc, "hero");

    let mut entry = intersecting(hero);
    entry.is_intersecting = false;
    entry.intersection_ratio = 0.0;
    assert_eq!(loader.on_proximity_event(&mut doc, vec![entry]), 0);
    assert!(loader.is_observing(hero));
    assert!(doc.tree().has_attribute(hero, "data-src"));
}

#[test]
fn test_check_viewport_uses_margin() {
    let mut doc = parse_page();
    let mut loader = LazyLoader::new(&mut doc, LazyConfig::default(), Capabilities::default()).unwrap();
    let hero = by_id(&doc, "hero");
    let photo = by_id(&doc, "photo");

    let mut rects = HashMap::new();
    // 100px below a 600px viewport: inside the default 200px margin
    rects.insert(hero, DOMRect::new(0.0, 700.0, 400.0, 300.0));
    // Far below
    rects.insert(photo, DOMRect::new(0.0, 3000.0, 400.0, 300.0));

    let viewport = DOMRect::new(0.0, 0.0, 800.0, 600.0);
    assert_eq!(loader.check_viewport(&mut doc, viewport, &rects, 0.0), 1);
    assert!(doc.tree().has_attribute(hero, "src"));
    assert!(!doc.tree().has_attribute(photo, "src"));

    // Scroll down to the photo
    let viewport = DOMRect::new(0.0, 2600.0, 800.0, 600.0);
    assert_eq!(loader.check_viewport(&mut doc, viewport, &rects, 1.0), 1);
    assert_eq!(doc.tree().get_attribute(photo, "src"), Some("photo.jpg"));
}

#[test]
fn test_sizes_and_srcset_applied_before_src() {
    let mut doc = parse_page();
    let mut loader = LazyLoader::new(&mut doc, LazyConfig::default(), Capabilities::default()).unwrap();
    let hero = by_id(&doc, "hero");

    let observer = doc.tree_mut().observe_mutations(hero, MutationObserverInit {
        attributes: true,
        attribute_filter: Some(vec!["src".into(), "srcset".into(), "sizes".into()]),
        ..Default::default()
    });

    loader.on_proximity_event(&mut doc, vec![intersecting(hero)]);

    let order: Vec<String> = doc
        .tree_mut()
        .take_records(observer)
        .into_iter()
        .filter_map(|r| r.attribute_name)
        .collect();
    assert_eq!(order, ["sizes", "srcset", "src"]);
}

// ============================================================================
// TERMINAL MARKERS
// ============================================================================

#[test]
fn test_every_element_settles_on_one_marker() {
    let mut doc = parse_page();
    let mut loader = LazyLoader::new(&mut doc, LazyConfig::default(), Capabilities::default()).unwrap();
    let watched: Vec<NodeId> = loader.watch_set().collect();

    let entries = watched.iter().copied().map(intersecting).collect();
    loader.on_proximity_event(&mut doc, entries);

    let video = by_id(&doc, "video");
    for &node in &watched {
        let kind = if node == video { EventKind::Error } else { EventKind::Load };
        doc.tree_mut().dispatch_event(node, kind);
    }
    // A late event of the other kind must not add a second marker
    for &node in &watched {
        doc.tree_mut().dispatch_event(node, EventKind::Error);
    }

    let tree = doc.tree();
    for &node in &watched {
        let loaded = tree.has_class(node, "lazy-loaded");
        let failed = tree.has_class(node, "lazy-error");
        assert!(loaded ^ failed, "{node:?} must carry exactly one terminal marker");
        assert!(!tree.has_class(node, "lazy-loading"));
    }
    assert!(tree.has_class(video, "lazy-error"));
}

#[test]
fn test_settled_elements_are_not_observed_again() {
    let mut doc = parse_page();
    let mut loader = LazyLoader::new(&mut doc, LazyConfig::default(), Capabilities::default()).unwrap();
    let hero = by_id(&doc, "hero");

    loader.on_proximity_event(&mut doc, vec![intersecting(hero)]);
    doc.tree_mut().dispatch_event(hero, EventKind::Load);

    // Page script puts a pending source back on a finished image
    doc.tree_mut().set_attribute(hero, "data-src", "hero-v2.jpg");
    loader.refresh(&mut doc);

    assert!(loader.images().contains(&hero));
    assert!(!loader.is_observing(hero));
    assert!(!doc.tree().has_class(hero, "lazy-loading"));
}

// ============================================================================
// EAGER FALLBACK
// ============================================================================

#[test]
fn test_without_detector_everything_loads_immediately() {
    let mut doc = parse_page();
    let loader = LazyLoader::new(
        &mut doc,
        LazyConfig::default(),
        Capabilities::without_intersection_observer(),
    )
    .unwrap();

    assert_eq!(loader.strategy_kind(), StrategyKind::Eager);
    assert_eq!(loader.observed_count(), 0);
    assert_eq!(loader.stats().loads, 4);

    let tree = doc.tree();
    for node in loader.watch_set() {
        assert!(!tree.has_class(node, "lazy-loading"));
        assert!(!loader.is_observing(node));
        for attr in PENDING {
            assert!(!tree.has_attribute(node, attr));
        }
    }
}

#[test]
fn test_eager_loads_inserted_content() {
    let mut doc = parse_page();
    let mut loader = LazyLoader::new(
        &mut doc,
        LazyConfig::default(),
        Capabilities::without_intersection_observer(),
    )
    .unwrap();

    let body = doc.body();
    let img = doc.tree_mut().create_element("img");
    doc.tree_mut().set_attribute(img, "data-src", "late.jpg");
    doc.tree_mut().append_child(body, img);

    assert!(loader.process_mutations(&mut doc));
    assert_eq!(doc.tree().get_attribute(img, "src"), Some("late.jpg"));
}

// ============================================================================
// MUTATION WATCHING
// ============================================================================

#[test]
fn test_inserted_image_is_picked_up_and_loaded() {
    let mut doc = parse_page();
    let mut loader = LazyLoader::new(&mut doc, LazyConfig::default(), Capabilities::default()).unwrap();

    let body = doc.body();
    let img = doc.tree_mut().create_element("img");
    doc.tree_mut().set_attribute(img, "data-src", "late.jpg");
    doc.tree_mut().append_child(body, img);

    assert!(loader.process_mutations(&mut doc));
    assert!(loader.is_observing(img));
    assert!(doc.tree().has_class(img, "lazy-loading"));

    loader.on_proximity_event(&mut doc, vec![intersecting(img)]);
    doc.tree_mut().dispatch_event(img, EventKind::Load);
    assert!(doc.tree().has_class(img, "lazy-loaded"));
    assert!(!doc.tree().has_class(img, "lazy-loading"));
}

#[test]
fn test_nested_insertion_and_batch_coalescing() {
    let mut doc = parse_page();
    let mut loader = LazyLoader::new(&mut doc, LazyConfig::default(), Capabilities::default()).unwrap();
    let scans = loader.stats().scans;

    let body = doc.body();
    let tree = doc.tree_mut();
    let card = tree.create_element("div");
    let a = tree.create_element("img");
    let b = tree.create_element("img");
    tree.set_attribute(a, "data-src", "a.jpg");
    tree.set_attribute(b, "data-srcset", "b.jpg 1x");
    tree.append_child(card, a);
    tree.append_child(card, b);
    tree.append_child(body, card);
    let frame = tree.create_element("iframe");
    tree.set_attribute(frame, "data-src", "embed.html");
    tree.append_child(body, frame);

    assert!(loader.process_mutations(&mut doc));
    assert_eq!(loader.stats().scans, scans + 1);
    assert_eq!(loader.stats().mutation_rescans, 1);
    for node in [a, b, frame] {
        assert!(loader.is_observing(node));
    }

    // Nothing new queued
    assert!(!loader.process_mutations(&mut doc));
}

#[test]
fn test_removed_elements_are_released() {
    let mut doc = parse_page();
    let mut loader = LazyLoader::new(&mut doc, LazyConfig::default(), Capabilities::default()).unwrap();
    let hero = by_id(&doc, "hero");
    assert!(loader.is_observing(hero));

    let article = doc.tree().parent(hero);
    doc.tree_mut().remove_child(article, hero);

    assert!(!loader.process_mutations(&mut doc));
    assert!(!loader.is_observing(hero));
    assert!(!loader.images().contains(&hero));
    assert!(!doc.tree().has_class(hero, "lazy-loading"));
    assert_eq!(loader.observed_count(), 3);
    assert_eq!(loader.stats().released, 1);
}

#[test]
fn test_refresh_releases_removed_subtree() {
    let mut doc = parse_page();
    let mut loader = LazyLoader::new(&mut doc, LazyConfig::default(), Capabilities::default()).unwrap();
    let webp = by_id(&doc, "webp");
    let photo = by_id(&doc, "photo");

    // Drop the whole <picture> and refresh without delivering the batch
    let picture = doc.tree().parent(photo);
    let article = doc.tree().parent(picture);
    doc.tree_mut().remove_child(article, picture);

    assert_eq!(loader.refresh(&mut doc), 0);
    assert!(!loader.is_observing(webp));
    assert!(!loader.is_observing(photo));
    assert_eq!(loader.observed_count(), 2);
    assert_eq!(loader.stats().released, 2);

    // Already released: the late batch changes nothing
    assert!(!loader.process_mutations(&mut doc));
    assert_eq!(loader.stats().released, 2);
}

#[test]
fn test_plain_insertions_do_not_rescan() {
    let mut doc = parse_page();
    let mut loader = LazyLoader::new(&mut doc, LazyConfig::default(), Capabilities::default()).unwrap();
    let scans = loader.stats().scans;

    let body = doc.body();
    let p = doc.tree_mut().create_element("p");
    let text = doc.tree_mut().create_text("hello");
    doc.tree_mut().append_child(p, text);
    doc.tree_mut().append_child(body, p);

    assert!(!loader.process_mutations(&mut doc));
    assert_eq!(loader.stats().scans, scans);
}

#[test]
fn test_teardown_stops_everything() {
    let mut doc = parse_page();
    let mut loader = LazyLoader::new(&mut doc, LazyConfig::default(), Capabilities::default()).unwrap();
    let subscription = loader.subscription().unwrap();

    loader.teardown(&mut doc);
    loader.teardown(&mut doc);

    assert!(loader.is_torn_down());
    assert_eq!(loader.observed_count(), 0);
    assert!(!doc.tree().is_observer_registered(subscription.observer()));

    let body = doc.body();
    let img = doc.tree_mut().create_element("img");
    doc.tree_mut().set_attribute(img, "data-src", "late.jpg");
    doc.tree_mut().append_child(body, img);

    assert!(!loader.process_mutations(&mut doc));
    assert_eq!(loader.refresh(&mut doc), 0);
    assert!(!loader.is_observing(img));
}

#[test]
fn test_document_without_body_watches_root() {
    let mut doc = Document::empty("about:blank");
    let mut loader = LazyLoader::new(&mut doc, LazyConfig::default(), Capabilities::default()).unwrap();
    assert_eq!(loader.subscription().unwrap().target(), doc.tree().root());

    let root = doc.tree().root();
    let img = doc.tree_mut().create_element("img");
    doc.tree_mut().set_attribute(img, "data-src", "a.png");
    doc.tree_mut().append_child(root, img);

    assert!(loader.process_mutations(&mut doc));
    assert!(loader.is_observing(img));
}

// ============================================================================
// CONFIGURATION
// ============================================================================

#[test]
fn test_json_config_drives_loader() {
    let mut doc = parse_page();
    let config = LazyConfig::from_json(r#"{"rootMargin": "0px", "loadingClass": "pending"}"#).unwrap();
    let mut loader = LazyLoader::new(&mut doc, config, Capabilities::default()).unwrap();
    let hero = by_id(&doc, "hero");
    assert!(doc.tree().has_class(hero, "pending"));

    // Without a margin, 100px below the fold stays unloaded
    let mut rects = HashMap::new();
    rects.insert(hero, DOMRect::new(0.0, 700.0, 400.0, 300.0));
    let viewport = DOMRect::new(0.0, 0.0, 800.0, 600.0);
    assert_eq!(loader.check_viewport(&mut doc, viewport, &rects, 0.0), 0);
    assert!(loader.is_observing(hero));
}

#[test]
fn test_scoped_selectors_limit_the_watch_set() {
    let mut doc = parse_page();
    let config = LazyConfig::default().with_selectors("picture img[data-src], picture source[data-srcset]", "article iframe");
    let loader = LazyLoader::new(&mut doc, config, Capabilities::default()).unwrap();

    let hero = by_id(&doc, "hero");
    assert_eq!(loader.images(), &[by_id(&doc, "webp"), by_id(&doc, "photo")]);
    assert_eq!(loader.iframes(), &[by_id(&doc, "video")]);
    assert!(!loader.is_observing(hero));
    assert!(!doc.tree().has_class(hero, "lazy-loading"));
}

#[test]
fn test_bad_selector_is_rejected() {
    let mut doc = parse_page();
    let config = LazyConfig::default().with_selectors("img[data-src", "iframe[data-src]");
    assert!(LazyLoader::new(&mut doc, config, Capabilities::default()).is_err());
}
