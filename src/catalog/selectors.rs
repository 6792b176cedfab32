//! CSS selectors for the catalog page layout
//!
//! All selectors are tied to one site's fixed markup. Update this file when
//! the markup changes.

use scraper::Selector;
use std::sync::LazyLock;

fn compile(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid built-in selector {css:?}: {e:?}"))
}

/// Selectors used on listing pages
pub mod listing {
    use super::*;

    /// Title anchor of each product card
    pub static DETAIL_LINK: LazyLock<Selector> = LazyLock::new(|| compile(".product_pod > h3 > a"));

    /// Pagination "next" anchor
    pub static NEXT_PAGE: LazyLock<Selector> = LazyLock::new(|| compile(".next > a"));

    /// Document base override
    pub static BASE: LazyLock<Selector> = LazyLock::new(|| compile("base[href]"));
}

/// Selectors used on detail pages
pub mod detail {
    use super::*;

    pub static TITLE: LazyLock<Selector> = LazyLock::new(|| compile(".product_main > h1"));

    pub static PRICE: LazyLock<Selector> = LazyLock::new(|| compile("p.price_color"));

    /// Product information cells; the availability text is the sixth cell
    pub static STOCK_CELLS: LazyLock<Selector> = LazyLock::new(|| compile("table.table td"));

    pub static RATING: LazyLock<Selector> = LazyLock::new(|| compile("p.star-rating"));

    pub static BREADCRUMB: LazyLock<Selector> =
        LazyLock::new(|| compile(".breadcrumb > li > a"));

    pub static DESCRIPTION: LazyLock<Selector> = LazyLock::new(|| compile(".product_page > p"));

    /// Product information cells; the UPC is the first cell
    pub static UPC_CELLS: LazyLock<Selector> = LazyLock::new(|| compile(".table td"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_selectors_compile() {
        let _ = &*listing::DETAIL_LINK;
        let _ = &*listing::NEXT_PAGE;
        let _ = &*listing::BASE;
        let _ = &*detail::TITLE;
        let _ = &*detail::PRICE;
        let _ = &*detail::STOCK_CELLS;
        let _ = &*detail::RATING;
        let _ = &*detail::BREADCRUMB;
        let _ = &*detail::DESCRIPTION;
        let _ = &*detail::UPC_CELLS;
    }
}
