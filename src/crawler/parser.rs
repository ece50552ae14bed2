//! HTML parser for extracting links and metadata
//!
//! This module handles parsing HTML content to extract:
//! - In-scope link targets, as identifiers
//! - Page title
//!
//! Parsing never fails: malformed markup degrades to a missing title or an
//! empty link set.

use crate::url::{Identifier, Scope};
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use tracing::trace;
use url::Url;

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// Distinct in-scope link targets
    pub links: BTreeSet<Identifier>,

    /// Number of anchors rejected by the scope filter
    pub rejected: usize,
}

/// Parses HTML content and extracts the title and in-scope links
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document, including links back
///   to the page itself
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - Any reference the scope rejects (other domains, other path prefixes,
///   namespaced identifiers, fragment-only anchors, non-HTTP schemes)
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `base_url` - URL of the page, used to resolve relative links
/// * `scope` - The crawl scope used to normalize and filter links
///
/// # Example
///
/// ```
/// use link_mapper::crawler::extract_page;
/// use link_mapper::url::{Identifier, Scope};
/// use url::Url;
///
/// let scope = Scope::new(Url::parse("https://en.wikipedia.org").unwrap(), "en.wikipedia.org");
/// let base = Url::parse("https://en.wikipedia.org/wiki/Graph").unwrap();
/// let html = r#"<html><head><title>Graph</title></head>
///     <body><a href="/wiki/Tree">Tree</a><a href="/wiki/File:G.png">img</a></body></html>"#;
///
/// let page = extract_page(html, &base, &scope);
/// assert_eq!(page.title.as_deref(), Some("Graph"));
/// assert!(page.links.contains(&Identifier::new("Tree")));
/// assert_eq!(page.rejected, 1);
/// ```
pub fn extract_page(html: &str, base_url: &Url, scope: &Scope) -> ExtractedPage {
    let document = Html::parse_document(html);

    let title = extract_title(&document);
    let (links, rejected) = extract_links(&document, base_url, scope);

    ExtractedPage {
        title,
        links,
        rejected,
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Extracts all in-scope links from the HTML document
fn extract_links(
    document: &Html,
    base_url: &Url,
    scope: &Scope,
) -> (BTreeSet<Identifier>, usize) {
    let mut links = BTreeSet::new();
    let mut rejected = 0;

    let Ok(a_selector) = Selector::parse("a[href]") else {
        return (links, rejected);
    };

    for element in document.select(&a_selector) {
        // Skip if it has the download attribute
        if element.value().attr("download").is_some() {
            continue;
        }

        let Some(href) = element.value().attr("href") else {
            continue;
        };

        match scope.normalize(href, base_url) {
            Ok(id) => {
                links.insert(id);
            }
            Err(reason) => {
                trace!("Rejected link '{}' on {}: {}", href, base_url, reason);
                rejected += 1;
            }
        }
    }

    (links, rejected)
}
