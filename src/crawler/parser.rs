//! HTML parser for extracting page text and links
//!
//! This module handles parsing fetched HTML to extract:
//! - Body text with presentation and navigation noise removed
//! - Links to follow (from `<a href>` tags), resolved to absolute URLs

use crate::url::resolve_link;
use ego_tree::NodeRef;
use scraper::{Html, Node, Selector};
use url::Url;

/// Elements whose text is never part of the document content
const NOISE_ELEMENTS: &[&str] = &["script", "style", "nav", "footer", "header"];

/// Extracted information from an HTML page
#[derive(Debug, Clone)]
pub struct ParsedPage {
    /// Whitespace-collapsed text of the page
    pub content: String,

    /// All followable links found on the page, in document order
    pub links: Vec<Url>,
}

/// Parses HTML content and extracts text and links
///
/// # Text Extraction Rules
///
/// - Text inside `script`, `style`, `nav`, `footer` and `header` is dropped
/// - Remaining text nodes are concatenated in document order
/// - Every whitespace run (newlines included) collapses to one space
///
/// # Link Extraction Rules
///
/// - Anchors inside `script`, `style`, `nav`, `footer` and `header` are
///   not followed
/// - Every other `<a href="...">` is resolved against `page_url`
/// - `<a download>`, `javascript:`, `mailto:`, `tel:`, `data:` and
///   fragment-only hrefs are skipped
/// - Links are returned regardless of host; site filtering is the
///   fetcher's job
///
/// # Example
///
/// ```
/// use harvest_index::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><body><nav>Menu</nav><p>Hello   world</p><a href="/next">Next</a></body></html>"#;
/// let page_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &page_url);
/// assert_eq!(parsed.content, "Hello worldNext");
/// assert_eq!(parsed.links[0].as_str(), "https://example.com/next");
/// ```
pub fn parse_html(html: &str, page_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        content: extract_text(&document),
        links: extract_links(&document, page_url),
    }
}

/// Collects the text of every node outside the noise elements
fn extract_text(document: &Html) -> String {
    let mut text = String::new();

    for node in document.tree.root().descendants() {
        let Node::Text(fragment) = node.value() else {
            continue;
        };

        if !in_noise(node) {
            text.push_str(fragment);
        }
    }

    collapse_whitespace(&text)
}

/// True when `node` sits anywhere inside a noise element
fn in_noise(node: NodeRef<'_, Node>) -> bool {
    node.ancestors().any(|ancestor| {
        ancestor
            .value()
            .as_element()
            .is_some_and(|element| NOISE_ELEMENTS.contains(&element.name()))
    })
}

/// Extracts all followable links outside the noise elements
fn extract_links(document: &Html, page_url: &Url) -> Vec<Url> {
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() || in_noise(*element) {
                continue;
            }

            if let Some(absolute) = element
                .value()
                .attr("href")
                .and_then(|href| resolve_link(href, page_url))
            {
                links.push(absolute);
            }
        }
    }

    links
}

/// Collapses every whitespace run to a single space and trims the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
