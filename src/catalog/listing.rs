//! Link discovery on catalog listing pages
//!
//! A listing page contributes:
//! - Detail page links from each product card's title anchor
//! - At most one "next page" link from the pager
//!
//! Links are resolved against the page URL, or against `<base href>` when the
//! document declares one.

use crate::catalog::select_first_attr;
use crate::catalog::selectors::listing;
use scraper::Html;
use url::Url;

/// Links found on a listing page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingLinks {
    /// Detail page URLs in document order
    pub detail_links: Vec<Url>,

    /// The following listing page, `None` on the last page
    pub next_page: Option<Url>,
}

impl ListingLinks {
    /// Returns true if the page yielded neither detail links nor a next page
    pub fn is_empty(&self) -> bool {
        self.detail_links.is_empty() && self.next_page.is_none()
    }
}

/// Parses raw HTML and discovers links on it
///
/// # Example
///
/// ```
/// use books_crawler::catalog::parse_listing;
/// use url::Url;
///
/// let html = r#"<article class="product_pod"><h3><a href="book_1/index.html">B</a></h3></article>
///               <ul class="pager"><li class="next"><a href="page-2.html">next</a></li></ul>"#;
/// let base_url = Url::parse("https://books.toscrape.com/catalogue/page-1.html").unwrap();
/// let links = parse_listing(html, &base_url);
///
/// assert_eq!(links.detail_links[0].as_str(), "https://books.toscrape.com/catalogue/book_1/index.html");
/// assert_eq!(links.next_page.unwrap().as_str(), "https://books.toscrape.com/catalogue/page-2.html");
/// ```
pub fn parse_listing(html: &str, base_url: &Url) -> ListingLinks {
    let document = Html::parse_document(html);
    discover_links(&document, base_url)
}

/// Discovers detail links and the next page link on a parsed listing page
pub fn discover_links(document: &Html, page_url: &Url) -> ListingLinks {
    let base_url = document_base(document, page_url);

    let detail_links = document
        .select(&listing::DETAIL_LINK)
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter_map(|href| resolve_link(href, &base_url))
        .collect();

    let next_page = select_first_attr(document, &listing::NEXT_PAGE, "href")
        .and_then(|href| resolve_link(href, &base_url));

    ListingLinks {
        detail_links,
        next_page,
    }
}

/// Returns the `<base href>` target if present and valid, else the page URL
fn document_base(document: &Html, page_url: &Url) -> Url {
    select_first_attr(document, &listing::BASE, "href")
        .and_then(|href| page_url.join(href.trim()).ok())
        .unwrap_or_else(|| page_url.clone())
}

/// Resolves a link href to an absolute URL
///
/// Returns None if the link should be skipped:
/// - empty or fragment-only hrefs
/// - javascript:, mailto:, tel:, data: schemes
/// - URLs that fail to resolve or are not HTTP(S)
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) if matches!(absolute_url.scheme(), "http" | "https") => {
            Some(absolute_url)
        }
        Ok(_) => None,
        Err(e) => {
            tracing::debug!("Skipping unresolvable link {:?}: {}", href, e);
            None
        }
    }
}
