//! Field extraction for book detail pages
//!
//! Every field is located by a fixed selector. Positional lookups (breadcrumb
//! index 2, table cell indices 0 and 5) follow the catalog's page layout:
//! Home / Books / <category> / <title>, and a product information table whose
//! first cell is the UPC and sixth cell is the availability text.

use crate::catalog::book::{BookRecord, Rating};
use crate::catalog::selectors::detail;
use crate::catalog::{select_first_attr, select_first_text, select_texts, ExtractError};
use scraper::Html;

const CATEGORY_INDEX: usize = 2;
const STOCK_CELL_INDEX: usize = 5;
const UPC_CELL_INDEX: usize = 0;

/// Parses raw HTML and extracts a book record from it
///
/// # Example
///
/// ```
/// use books_crawler::catalog::parse_book;
///
/// let html = r#"<html><body>
///   <ul class="breadcrumb">
///     <li><a href="/">Home</a></li><li><a href="/books">Books</a></li>
///     <li><a href="/poetry">Poetry</a></li>
///   </ul>
///   <article class="product_page">
///     <div class="product_main">
///       <h1>Sample</h1>
///       <p class="price_color">£51.77</p>
///       <p class="star-rating Three"></p>
///     </div>
///     <p>About the book</p>
///     <table class="table">
///       <tr><td>abc123</td></tr><tr><td>Books</td></tr><tr><td>£1</td></tr>
///       <tr><td>£1</td></tr><tr><td>£0</td></tr><tr><td>In stock (22 available)</td></tr>
///     </table>
///   </article>
/// </body></html>"#;
///
/// let book = parse_book(html).unwrap();
/// assert_eq!(book.price, 51.77);
/// assert_eq!(book.amount_in_stock, 22);
/// assert_eq!(book.rating.map(|r| r.value()), Some(3));
/// ```
pub fn parse_book(html: &str) -> Result<BookRecord, ExtractError> {
    let document = Html::parse_document(html);
    extract_book(&document)
}

/// Extracts a book record from a parsed detail page
///
/// # Errors
///
/// * `MissingField` - a required selector matched nothing (or too few items)
/// * `MalformedField` - a value was found but could not be parsed
pub fn extract_book(document: &Html) -> Result<BookRecord, ExtractError> {
    Ok(BookRecord {
        title: extract_title(document)?,
        price: extract_price(document)?,
        amount_in_stock: extract_amount_in_stock(document)?,
        rating: extract_rating(document)?,
        category: extract_category(document)?,
        description: extract_description(document),
        upc: extract_upc(document)?,
    })
}

fn extract_title(document: &Html) -> Result<String, ExtractError> {
    select_first_text(document, &detail::TITLE)
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ExtractError::missing("title"))
}

fn extract_price(document: &Html) -> Result<f64, ExtractError> {
    let raw = select_first_text(document, &detail::PRICE)
        .ok_or_else(|| ExtractError::missing("price"))?;
    parse_price(raw)
}

/// Drops the leading currency symbol and parses the remainder
fn parse_price(raw: &str) -> Result<f64, ExtractError> {
    let amount: String = raw.trim().chars().skip(1).collect();
    let price = amount
        .trim()
        .parse::<f64>()
        .map_err(|_| ExtractError::malformed("price", raw))?;

    if !price.is_finite() || price < 0.0 {
        return Err(ExtractError::malformed("price", raw));
    }

    Ok(price)
}

fn extract_amount_in_stock(document: &Html) -> Result<u32, ExtractError> {
    let cells = select_texts(document, &detail::STOCK_CELLS);
    let raw = cells
        .get(STOCK_CELL_INDEX)
        .ok_or_else(|| ExtractError::missing("amount_in_stock"))?;
    parse_stock(raw)
}

/// Keeps only the digits of an availability text, e.g. "In stock (22 available)"
fn parse_stock(raw: &str) -> Result<u32, ExtractError> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    digits
        .parse::<u32>()
        .map_err(|_| ExtractError::malformed("amount_in_stock", raw))
}

/// Reads the rating word from `class="star-rating <Word>"`
///
/// An unrecognized word yields `Ok(None)`; a missing node or word is an error.
fn extract_rating(document: &Html) -> Result<Option<Rating>, ExtractError> {
    let class = select_first_attr(document, &detail::RATING, "class")
        .ok_or_else(|| ExtractError::missing("rating"))?;
    let word = class
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| ExtractError::missing("rating"))?;

    let rating = Rating::from_word(word);
    if rating.is_none() {
        tracing::debug!("Unrecognized rating word {:?}, leaving rating empty", word);
    }
    Ok(rating)
}

fn extract_category(document: &Html) -> Result<String, ExtractError> {
    select_texts(document, &detail::BREADCRUMB)
        .get(CATEGORY_INDEX)
        .map(|category| category.trim())
        .filter(|category| !category.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ExtractError::missing("category"))
}

fn extract_description(document: &Html) -> Option<String> {
    select_first_text(document, &detail::DESCRIPTION)
        .map(str::trim)
        .filter(|description| !description.is_empty())
        .map(str::to_string)
}

fn extract_upc(document: &Html) -> Result<String, ExtractError> {
    select_texts(document, &detail::UPC_CELLS)
        .get(UPC_CELL_INDEX)
        .map(|upc| upc.trim())
        .filter(|upc| !upc.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ExtractError::missing("upc"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DETAIL_PAGE: &str = include_str!("../../tests/fixtures/detail_page.html");

    #[test]
    fn test_extract_full_detail_page() {
        let book = parse_book(DETAIL_PAGE).unwrap();

        assert_eq!(book.title, "A Light in the Attic");
        assert_eq!(book.price, 51.77);
        assert_eq!(book.amount_in_stock, 22);
        assert_eq!(book.rating, Some(Rating::Three));
        assert_eq!(book.category, "Poetry");
        assert!(book
            .description
            .as_deref()
            .unwrap()
            .starts_with("It's hard to imagine a world without A Light in the Attic."));
        assert_eq!(book.upc, "a897fe39b1053632");
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let document = Html::parse_document(DETAIL_PAGE);
        let first = extract_book(&document).unwrap();
        let second = extract_book(&document).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("£51.77").unwrap(), 51.77);
        assert_eq!(parse_price("$0.00").unwrap(), 0.0);
        assert_eq!(parse_price("  £13  ").unwrap(), 13.0);
    }

    #[test]
    fn test_parse_price_malformed() {
        assert!(matches!(
            parse_price("£free"),
            Err(ExtractError::MalformedField { field: "price", .. })
        ));
        assert!(matches!(
            parse_price("£"),
            Err(ExtractError::MalformedField { .. })
        ));
        assert!(matches!(
            parse_price("£-4.00"),
            Err(ExtractError::MalformedField { .. })
        ));
        assert!(matches!(
            parse_price("£inf"),
            Err(ExtractError::MalformedField { .. })
        ));
    }

    #[test]
    fn test_parse_stock() {
        assert_eq!(parse_stock("In stock (22 available)").unwrap(), 22);
        assert_eq!(parse_stock("In stock (1 available)").unwrap(), 1);
        assert_eq!(parse_stock("0").unwrap(), 0);
    }

    #[test]
    fn test_parse_stock_without_digits() {
        assert!(matches!(
            parse_stock("Out of stock"),
            Err(ExtractError::MalformedField {
                field: "amount_in_stock",
                ..
            })
        ));
    }

    #[test]
    fn test_unrecognized_rating_is_none() {
        let html = DETAIL_PAGE.replace("star-rating Three", "star-rating Zero");
        let book = parse_book(&html).unwrap();
        assert_eq!(book.rating, None);
    }

    #[test]
    fn test_rating_without_word_is_missing() {
        let html = DETAIL_PAGE.replace("star-rating Three", "star-rating");
        assert_eq!(
            parse_book(&html).unwrap_err(),
            ExtractError::MissingField { field: "rating" }
        );
    }

    #[test]
    fn test_missing_title() {
        let html = DETAIL_PAGE.replace("<h1>A Light in the Attic</h1>", "");
        assert_eq!(
            parse_book(&html).unwrap_err(),
            ExtractError::MissingField { field: "title" }
        );
    }

    #[test]
    fn test_missing_price() {
        let html = DETAIL_PAGE.replace(r#"<p class="price_color">£51.77</p>"#, "");
        assert_eq!(
            parse_book(&html).unwrap_err(),
            ExtractError::MissingField { field: "price" }
        );
    }

    #[test]
    fn test_short_breadcrumb_is_missing_category() {
        let html = DETAIL_PAGE.replace(
            r#"<li><a href="../category/books/poetry_23/index.html">Poetry</a></li>"#,
            "",
        );
        assert_eq!(
            parse_book(&html).unwrap_err(),
            ExtractError::MissingField { field: "category" }
        );
    }

    #[test]
    fn test_blank_category_is_missing() {
        let html = DETAIL_PAGE.replace(
            r#"<a href="../category/books/poetry_23/index.html">Poetry</a>"#,
            r#"<a href="../category/books/poetry_23/index.html">   </a>"#,
        );
        assert_eq!(
            parse_book(&html).unwrap_err(),
            ExtractError::MissingField { field: "category" }
        );
    }

    #[test]
    fn test_short_table_is_missing_stock() {
        let html = DETAIL_PAGE.replace(
            "<tr><th>Availability</th><td>In stock (22 available)</td></tr>",
            "",
        );
        // Six cells remain, so index 5 is now the review count
        let book = parse_book(&html).unwrap();
        assert_eq!(book.amount_in_stock, 0);

        let html = html.replace("<tr><th>Number of reviews</th><td>0</td></tr>", "");
        assert_eq!(
            parse_book(&html).unwrap_err(),
            ExtractError::MissingField {
                field: "amount_in_stock"
            }
        );
    }

    #[test]
    fn test_missing_description_is_tolerated() {
        let html = DETAIL_PAGE
            .replace("<p>It's hard to imagine", "<div>It's hard to imagine")
            .replace("special edition.</p>", "special edition.</div>");
        let book = parse_book(&html).unwrap();
        assert_eq!(book.description, None);
    }

    #[test]
    fn test_missing_table_is_missing_stock() {
        let start = DETAIL_PAGE.find("<table").unwrap();
        let end = DETAIL_PAGE.find("</table>").unwrap() + "</table>".len();
        let html = format!("{}{}", &DETAIL_PAGE[..start], &DETAIL_PAGE[end..]);
        assert_eq!(
            parse_book(&html).unwrap_err(),
            ExtractError::MissingField {
                field: "amount_in_stock"
            }
        );
    }

    #[test]
    fn test_extracted_values_are_in_range() {
        for rating in ["One", "Two", "Three", "Four", "Five", "Bogus"] {
            let html = DETAIL_PAGE.replace("star-rating Three", &format!("star-rating {}", rating));
            let book = parse_book(&html).unwrap();
            assert!(book.price >= 0.0);
            assert!(!book.upc.is_empty());
            assert!(book.rating.map_or(true, |r| (1..=5).contains(&r.value())));
        }
    }
}
