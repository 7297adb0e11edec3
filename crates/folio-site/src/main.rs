//! Folio command line
//!
//! ## Usage
//!
//! ```bash
//! # Open a page, scroll through it and report what got loaded
//! folio lazy post.html --scroll 800 --scroll 1600
//!
//! # Same page on a host without intersection reporting
//! folio lazy post.html --eager
//!
//! # Feed listings
//! folio posts posts.json --tag rust
//! folio posts posts.json --notes computer-science/algorithms
//!
//! # Search rendered cards, filter the archive
//! folio search index.html "ownership"
//! folio archive archive.html 2024
//!
//! # View counter backed by a JSON file
//! folio views storage.json /blogs/categories/rust/ownership/ --visit
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use folio_blog::{FileStore, PostFeed, PostFilter, ViewCounter};
use folio_dom::{CompoundSelector, Document, EventKind, SelectorList};
use folio_lazy::{Capabilities, LazyConfig};
use folio_site::{Page, PageOptions};

#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(version)]
#[command(about = "Blog enhancement layer: lazy media loading, feed filters, search and view counts", long_about = None)]
struct Args {
    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the lazy loader over an HTML page
    Lazy {
        /// HTML file
        file: PathBuf,

        /// Loader options as a JSON object, e.g. '{"rootMargin": "0px"}'
        #[arg(long)]
        config: Option<String>,

        #[arg(long, default_value = "1280")]
        viewport_width: f32,

        #[arg(long, default_value = "720")]
        viewport_height: f32,

        /// Scroll positions to visit, in order
        #[arg(long)]
        scroll: Vec<f32>,

        /// Pretend the host has no intersection reporting
        #[arg(long)]
        eager: bool,

        /// Fail every fetch instead of completing it
        #[arg(long)]
        fail: bool,
    },

    /// List posts from a feed
    Posts {
        /// posts.json
        file: PathBuf,

        #[arg(long, conflicts_with_all = ["tag", "year", "notes"])]
        category: Option<String>,

        #[arg(long, conflicts_with_all = ["year", "notes"])]
        tag: Option<String>,

        #[arg(long, conflicts_with = "notes")]
        year: Option<i32>,

        /// Notes, optionally under a category/subcategory prefix
        #[arg(long, num_args = 0..=1, default_missing_value = "")]
        notes: Option<String>,
    },

    /// Search the post cards of an HTML page
    Search {
        file: PathBuf,
        query: String,
    },

    /// Show one year of an archive page
    Archive {
        file: PathBuf,
        year: String,
    },

    /// Read or bump a view count
    Views {
        /// JSON store file (created if missing)
        store: PathBuf,
        /// Page path, e.g. /blogs/categories/rust/ownership/
        url: String,
        /// Count a visit to the page first
        #[arg(long)]
        visit: bool,
    },
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_page(path: &Path) -> Result<Document> {
    let html = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let url = std::fs::canonicalize(path)
        .map(|abs| format!("file://{}", abs.display()))
        .unwrap_or_else(|_| path.display().to_string());
    folio_html::parse_with_url(&html, &url).with_context(|| format!("failed to parse {}", path.display()))
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    match args.command {
        Command::Lazy {
            file,
            config,
            viewport_width,
            viewport_height,
            scroll,
            eager,
            fail,
        } => {
            let lazy = match config {
                Some(json) => LazyConfig::from_json(&json).context("invalid --config")?,
                None => LazyConfig::default(),
            };
            let capabilities = if eager {
                Capabilities::without_intersection_observer()
            } else {
                Capabilities::default()
            };
            let outcome = if fail { EventKind::Error } else { EventKind::Load };
            let options = PageOptions {
                lazy,
                capabilities,
                viewport_width,
                viewport_height,
            };
            run_lazy(load_page(&file)?, options, &scroll, outcome)
        }

        Command::Posts {
            file,
            category,
            tag,
            year,
            notes,
        } => {
            let feed = PostFeed::from_path(&file)?;
            let filter = match (category, tag, year, notes) {
                (Some(category), ..) => PostFilter::Category(category),
                (_, Some(tag), ..) => PostFilter::Tag(tag),
                (_, _, Some(year), _) => PostFilter::Year(year),
                (_, _, _, Some(path)) => PostFilter::Notes(Some(path).filter(|p| !p.is_empty())),
                _ => PostFilter::All,
            };

            let posts = filter.apply(feed.posts());
            println!("{}", filter.count_label(posts.len()));
            for post in posts {
                let date = post
                    .published()
                    .map(|d| d.format("%b %-d, %Y").to_string())
                    .unwrap_or_else(|| "undated".to_string());
                println!(
                    "{:<14} {:>3} min  {}  {}",
                    date,
                    post.reading_time(),
                    post.title,
                    post.url
                );
            }
            Ok(())
        }

        Command::Search { file, query } => {
            let mut document = load_page(&file)?;
            match folio_blog::apply_search(&mut document, &query) {
                Some(outcome) => {
                    println!("{}", outcome.message());
                    let heading = SelectorList::of([CompoundSelector::tag("h5"), CompoundSelector::tag("h6")]);
                    for card in outcome.matched {
                        let title = document
                            .tree()
                            .query_selector(card, &heading)
                            .map(|h| document.tree().text_content(h))
                            .unwrap_or_default();
                        println!("  {}", title.trim());
                    }
                }
                None => println!(
                    "query shorter than {} characters: showing all posts",
                    folio_blog::MIN_QUERY_LEN
                ),
            }
            Ok(())
        }

        Command::Archive { file, year } => {
            let mut document = load_page(&file)?;
            let shown = folio_blog::filter_archive_by_year(&mut document, &year);
            println!("{} year block(s) shown for {}", shown, year);
            Ok(())
        }

        Command::Views { store, url, visit } => {
            let store = FileStore::open(&store)?;
            let mut counter = ViewCounter::new(store);
            if visit {
                let mut document = Document::new(&url);
                if counter.visit(&mut document).is_none() {
                    println!("{} is not a post page, visit not counted", url);
                }
            }
            println!("{}  {}", folio_blog::format_views(counter.get(&url)), url);
            Ok(())
        }
    }
}

fn run_lazy(document: Document, options: PageOptions, scroll: &[f32], outcome: EventKind) -> Result<()> {
    let mut page = Page::open(document, options)?;
    page.complete_fetches(outcome);

    for &y in scroll {
        let loaded = page.scroll_to(y);
        let settled = page.complete_fetches(outcome);
        println!("scroll {:>6}: {} loaded, {} settled", y, loaded, settled);
    }

    let strategy = page.loader().strategy_kind();
    let stats = page.loader().stats();
    let document = page.close();

    println!("strategy: {:?}, loads: {}, scans: {}", strategy, stats.loads, stats.scans);
    let media = SelectorList::of([
        CompoundSelector::tag("img"),
        CompoundSelector::tag("source"),
        CompoundSelector::tag("iframe"),
    ]);
    let tree = document.tree();
    for node in document.query_selector_all(&media) {
        let tag = tree.tag_name(node).unwrap_or_default();
        let source = tree
            .get_attribute(node, "src")
            .or_else(|| tree.get_attribute(node, "srcset"))
            .or_else(|| tree.get_attribute(node, "data-src"))
            .or_else(|| tree.get_attribute(node, "data-srcset"))
            .unwrap_or("-");
        let classes = tree.get_attribute(node, "class").unwrap_or("");
        println!("  <{}> {}  [{}]", tag, source, classes);
    }
    Ok(())
}
