//! Folio HTML Parser
//!
//! HTML5 parsing built on html5ever.

mod parser;

pub use parser::HtmlParser;

use folio_dom::Document;

/// Parse an HTML string into a Document
pub fn parse(html: &str) -> Result<Document, HtmlError> {
    HtmlParser::new().parse(html)
}

/// Parse an HTML string into a Document with a base URL
pub fn parse_with_url(html: &str, url: &str) -> Result<Document, HtmlError> {
    HtmlParser::new().parse_with_url(html, url)
}

/// Parse error
#[derive(Debug, thiserror::Error)]
pub enum HtmlError {
    #[error("failed to read HTML input: {0}")]
    Io(#[from] std::io::Error),
}
