//! Catalog page handling for the books.toscrape.com layout
//!
//! This module knows the fixed page structure of the catalog:
//! - Listing pages: product cards with detail links plus a "next" control
//! - Detail pages: one book with title, price, stock, rating and so on
//!
//! Everything here is a pure transform over an already-fetched document.

mod book;
mod detail;
mod listing;
pub mod selectors;

pub use book::{BookRecord, Rating};
pub use detail::{extract_book, parse_book};
pub use listing::{discover_links, parse_listing, ListingLinks};

use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

/// Errors produced while extracting a record from a detail page
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("required field '{field}' not found")]
    MissingField { field: &'static str },

    #[error("field '{field}' has unparseable value {value:?}")]
    MalformedField { field: &'static str, value: String },
}

impl ExtractError {
    pub(crate) fn missing(field: &'static str) -> Self {
        Self::MissingField { field }
    }

    pub(crate) fn malformed(field: &'static str, value: impl Into<String>) -> Self {
        Self::MalformedField {
            field,
            value: value.into(),
        }
    }
}

/// Direct child text nodes of an element, in document order
///
/// Nested elements are not descended into, so `<p>a<b>b</b>c</p>` yields
/// `"a"` and `"c"`.
fn own_text(element: ElementRef<'_>) -> impl Iterator<Item = &str> {
    element
        .children()
        .filter_map(|node| node.value().as_text().map(|text| &**text))
}

/// All own text nodes of every element matching `selector`
fn select_texts<'a>(document: &'a Html, selector: &'a Selector) -> Vec<&'a str> {
    document.select(selector).flat_map(own_text).collect()
}

/// The first own text node of any element matching `selector`
fn select_first_text<'a>(document: &'a Html, selector: &'a Selector) -> Option<&'a str> {
    document.select(selector).flat_map(own_text).next()
}

/// The first value of `attr` on any element matching `selector`
fn select_first_attr<'a>(document: &'a Html, selector: &'a Selector, attr: &str) -> Option<&'a str> {
    document
        .select(selector)
        .find_map(|element| element.value().attr(attr))
}
